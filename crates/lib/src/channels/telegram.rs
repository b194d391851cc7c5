//! Telegram channel: Bot API update payload; the sender id is numeric and
//! coerced to a string.

use crate::channels::adapter::{require_object, ChannelAdapter, ChannelError};
use crate::channels::message::{ChannelType, InternalMessage, InternalResponse};
use serde_json::{json, Value};

pub struct TelegramAdapter;

impl ChannelAdapter for TelegramAdapter {
    fn channel(&self) -> ChannelType {
        ChannelType::Telegram
    }

    fn from_request(&self, raw: &Value) -> Result<InternalMessage, ChannelError> {
        let obj = require_object(ChannelType::Telegram, raw)?;
        let user_id = match raw.pointer("/message/from/id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "unknown_tg".to_string(),
        };
        let text = raw
            .pointer("/message/text")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        Ok(InternalMessage {
            user_id,
            channel: ChannelType::Telegram,
            text,
            metadata: obj.clone(),
        })
    }

    fn to_response(&self, response: &InternalResponse) -> Value {
        json!({
            "method": "sendMessage",
            "text": response.text,
            "parse_mode": "Markdown",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_request_coerces_numeric_sender_id() {
        let raw = json!({ "message": { "from": { "id": 12345 }, "text": "hola" } });
        let msg = TelegramAdapter.from_request(&raw).unwrap();
        assert_eq!(msg.channel, ChannelType::Telegram);
        assert_eq!(msg.user_id, "12345");
        assert_eq!(msg.text, "hola");
        assert!(msg.metadata.contains_key("message"));
    }

    #[test]
    fn from_request_defaults_unknown_sender() {
        let msg = TelegramAdapter.from_request(&json!({})).unwrap();
        assert_eq!(msg.user_id, "unknown_tg");
        assert_eq!(msg.text, "");
    }

    #[test]
    fn to_response_is_send_message_directive() {
        let out = TelegramAdapter.to_response(&InternalResponse::new("hello back"));
        assert_eq!(out["method"], "sendMessage");
        assert_eq!(out["text"], "hello back");
        assert_eq!(out["parse_mode"], "Markdown");
    }
}
