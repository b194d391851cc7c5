//! Channel adapter seam: raw payload in, internal message out, and back.

use crate::channels::message::{ChannelType, InternalMessage, InternalResponse};
use crate::channels::{TelegramAdapter, WebAdapter, WhatsAppAdapter};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("invalid request payload: {0}")]
    Validation(String),
}

/// Per-channel payload mapping. Adapters are stateless and shared across
/// concurrent requests.
///
/// `from_request` fails only for malformed payloads (mapped to a client
/// error upstream); `to_response` is total; missing fields default to
/// empty or are omitted in the channel-specific shape.
pub trait ChannelAdapter: Send + Sync {
    fn channel(&self) -> ChannelType;
    fn from_request(&self, raw: &Value) -> Result<InternalMessage, ChannelError>;
    fn to_response(&self, response: &InternalResponse) -> Value;
}

/// Static adapter lookup for a supported channel.
pub fn adapter_for(channel: ChannelType) -> &'static dyn ChannelAdapter {
    match channel {
        ChannelType::Web => &WebAdapter,
        ChannelType::WhatsApp => &WhatsAppAdapter,
        ChannelType::Telegram => &TelegramAdapter,
    }
}

/// Shared validation: every channel payload must be a JSON object.
pub(crate) fn require_object<'a>(
    channel: ChannelType,
    raw: &'a Value,
) -> Result<&'a serde_json::Map<String, Value>, ChannelError> {
    raw.as_object().ok_or_else(|| {
        ChannelError::Validation(format!("{} payload must be a JSON object", channel))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_for_returns_matching_channel() {
        for channel in [
            ChannelType::Web,
            ChannelType::WhatsApp,
            ChannelType::Telegram,
        ] {
            assert_eq!(adapter_for(channel).channel(), channel);
        }
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let raw = serde_json::json!(["not", "an", "object"]);
        for channel in [
            ChannelType::Web,
            ChannelType::WhatsApp,
            ChannelType::Telegram,
        ] {
            assert!(adapter_for(channel).from_request(&raw).is_err());
        }
    }
}
