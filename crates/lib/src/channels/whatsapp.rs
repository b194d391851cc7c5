//! WhatsApp channel: Twilio-style webhook payload (From/Body); the whole
//! raw payload is kept as metadata for audit.

use crate::channels::adapter::{require_object, ChannelAdapter, ChannelError};
use crate::channels::message::{ChannelType, InternalMessage, InternalResponse};
use serde_json::{json, Value};

pub struct WhatsAppAdapter;

impl ChannelAdapter for WhatsAppAdapter {
    fn channel(&self) -> ChannelType {
        ChannelType::WhatsApp
    }

    fn from_request(&self, raw: &Value) -> Result<InternalMessage, ChannelError> {
        let obj = require_object(ChannelType::WhatsApp, raw)?;
        let user_id = obj
            .get("From")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown_wa_user")
            .to_string();
        let text = obj
            .get("Body")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        Ok(InternalMessage {
            user_id,
            channel: ChannelType::WhatsApp,
            text,
            metadata: obj.clone(),
        })
    }

    fn to_response(&self, response: &InternalResponse) -> Value {
        json!({
            "Body": response.text,
            "Attributes": response.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_request_maps_twilio_fields() {
        let raw = json!({ "From": "+1555", "Body": "hi" });
        let msg = WhatsAppAdapter.from_request(&raw).unwrap();
        assert_eq!(msg.channel, ChannelType::WhatsApp);
        assert_eq!(msg.user_id, "+1555");
        assert_eq!(msg.text, "hi");
        // whole raw payload is kept for audit
        assert_eq!(msg.metadata.get("From").unwrap(), "+1555");
    }

    #[test]
    fn from_request_defaults_unknown_sender() {
        let msg = WhatsAppAdapter.from_request(&json!({ "Body": "hi" })).unwrap();
        assert_eq!(msg.user_id, "unknown_wa_user");
    }

    #[test]
    fn to_response_wraps_body() {
        let out = WhatsAppAdapter.to_response(&InternalResponse::new("hello back"));
        assert_eq!(out["Body"], "hello back");
        assert!(out["Attributes"].is_object());
    }
}
