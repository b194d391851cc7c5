//! Channel-agnostic message types: every adapter normalizes into and
//! serializes out of these.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The messaging surface a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Web,
    WhatsApp,
    Telegram,
}

impl ChannelType {
    /// Parse a channel name from a URL path segment. Returns None for
    /// unsupported channels (the server maps that to a 400).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "web" => Some(Self::Web),
            "whatsapp" => Some(Self::WhatsApp),
            "telegram" => Some(Self::Telegram),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::WhatsApp => "whatsapp",
            Self::Telegram => "telegram",
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized inbound message. Built once per request by a channel adapter
/// and handed to the agent; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalMessage {
    pub user_id: String,
    pub channel: ChannelType,
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Normalized agent reply. Consumed exactly once by the originating
/// adapter to build the channel-shaped outbound payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalResponse {
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_content: Option<Value>,
}

impl InternalResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Map::new(),
            rich_content: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_parse_known_and_unknown() {
        assert_eq!(ChannelType::parse("web"), Some(ChannelType::Web));
        assert_eq!(ChannelType::parse("WhatsApp"), Some(ChannelType::WhatsApp));
        assert_eq!(ChannelType::parse("telegram"), Some(ChannelType::Telegram));
        assert_eq!(ChannelType::parse("sms"), None);
    }

    #[test]
    fn channel_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChannelType::WhatsApp).unwrap(),
            "\"whatsapp\""
        );
    }
}
