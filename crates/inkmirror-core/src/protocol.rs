//! Wire protocol between clients and the relay server.
//!
//! Messages are JSON objects tagged by `type`:
//! ```json
//! { "type": "hello", "project_id": "demo", "credentials": "secret" }
//! { "type": "subscribe", "key": "drawing" }
//! { "type": "write", "request_id": 7, "key": "drawing", "value": { "paths": ["M1 1"] } }
//! ```

use crate::stroke::Drawing;
use serde::{Deserialize, Serialize};

/// Messages sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Select the project namespace and present credentials.
    Hello {
        project_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        credentials: Option<String>,
    },
    /// Start receiving a record: current value now, then every change.
    Subscribe { key: String },
    /// Stop receiving a record.
    Unsubscribe { key: String },
    /// Overwrite a record.
    Write {
        request_id: u64,
        key: String,
        value: Drawing,
    },
}

/// Messages received from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Current value of a subscribed record. `None` if never written.
    Value {
        key: String,
        #[serde(default)]
        value: Option<Drawing>,
    },
    /// A write was applied.
    Ack { request_id: u64 },
    /// A write was refused.
    Rejected { request_id: u64, reason: String },
    /// Malformed input or other protocol error.
    Error { message: String },
}

/// Rejection reason the server uses for bad credentials.
pub const PERMISSION_DENIED: &str = "permission denied";

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_serialize() {
        let msg = ClientMessage::Write {
            request_id: 3,
            key: "drawing".to_string(),
            value: Drawing::from_descriptions(["M1 1"]),
        };
        let json = msg.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"type":"write","request_id":3,"key":"drawing","value":{"paths":["M1 1"]}}"#
        );
    }

    #[test]
    fn test_hello_without_credentials() {
        let msg = ClientMessage::Hello { project_id: "demo".to_string(), credentials: None };
        let json = msg.to_json().unwrap();
        assert_eq!(json, r#"{"type":"hello","project_id":"demo"}"#);

        let parsed: ClientMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_server_value_null() {
        let json = r#"{"type":"value","key":"drawing","value":null}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ServerMessage::Value { key: "drawing".to_string(), value: None });
    }

    #[test]
    fn test_server_rejected_deserialize() {
        let json = r#"{"type":"rejected","request_id":9,"reason":"permission denied"}"#;
        match serde_json::from_str::<ServerMessage>(json).unwrap() {
            ServerMessage::Rejected { request_id, reason } => {
                assert_eq!(request_id, 9);
                assert_eq!(reason, PERMISSION_DENIED);
            }
            other => panic!("Wrong message type: {:?}", other),
        }
    }
}
