//! Web widget channel: explicit user_id/text fields, metadata passthrough.

use crate::channels::adapter::{require_object, ChannelAdapter, ChannelError};
use crate::channels::message::{ChannelType, InternalMessage, InternalResponse};
use serde_json::{json, Value};

pub struct WebAdapter;

impl ChannelAdapter for WebAdapter {
    fn channel(&self) -> ChannelType {
        ChannelType::Web
    }

    fn from_request(&self, raw: &Value) -> Result<InternalMessage, ChannelError> {
        let obj = require_object(ChannelType::Web, raw)?;
        let user_id = obj
            .get("user_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("anonymous")
            .to_string();
        let text = obj
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let metadata = obj
            .get("metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Ok(InternalMessage {
            user_id,
            channel: ChannelType::Web,
            text,
            metadata,
        })
    }

    fn to_response(&self, response: &InternalResponse) -> Value {
        json!({
            "text": response.text,
            "metadata": response.metadata,
            "rich_content": response.rich_content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_request_extracts_fields() {
        let raw = json!({ "user_id": "u1", "text": "hello", "metadata": { "foo": "bar" } });
        let msg = WebAdapter.from_request(&raw).unwrap();
        assert_eq!(msg.channel, ChannelType::Web);
        assert_eq!(msg.user_id, "u1");
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.metadata.get("foo").unwrap(), "bar");
    }

    #[test]
    fn from_request_defaults_anonymous() {
        let msg = WebAdapter.from_request(&json!({ "text": "hi" })).unwrap();
        assert_eq!(msg.user_id, "anonymous");
        assert!(msg.metadata.is_empty());
    }

    #[test]
    fn to_response_round_trips_text() {
        let mut response = InternalResponse::new("hi");
        response
            .metadata
            .insert("latency".to_string(), json!("1ms"));
        let out = WebAdapter.to_response(&response);
        assert_eq!(out["text"], "hi");
        assert_eq!(out["metadata"]["latency"], "1ms");
    }
}
