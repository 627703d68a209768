use crate::game::GameSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Start {
        width: Option<i32>,
        height: Option<i32>,
        name: Option<String>,
    },
    Direction {
        direction: String,
    },
    Pause,
    Resume,
    Key {
        key: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage<'a> {
    State(&'a GameSnapshot),
    Error { message: String },
}

pub fn decode_client_message(text: &str) -> Option<ClientMessage> {
    serde_json::from_str(text).ok()
}

pub fn encode_server_message(message: &ServerMessage<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::clock::ManualClock;
    use crate::game::Engine;
    use std::sync::Arc;

    #[test]
    fn decodes_each_client_message() {
        assert_eq!(
            decode_client_message(r#"{"type":"start","width":24,"height":18,"name":"Ada"}"#),
            Some(ClientMessage::Start {
                width: Some(24),
                height: Some(18),
                name: Some("Ada".to_string()),
            })
        );
        assert_eq!(
            decode_client_message(r#"{"type":"start"}"#),
            Some(ClientMessage::Start {
                width: None,
                height: None,
                name: None,
            })
        );
        assert_eq!(
            decode_client_message(r#"{"type":"direction","direction":"up"}"#),
            Some(ClientMessage::Direction {
                direction: "up".to_string()
            })
        );
        assert_eq!(
            decode_client_message(r#"{"type":"pause"}"#),
            Some(ClientMessage::Pause)
        );
        assert_eq!(
            decode_client_message(r#"{"type":"resume"}"#),
            Some(ClientMessage::Resume)
        );
        assert_eq!(
            decode_client_message(r#"{"type":"key","key":"ArrowLeft"}"#),
            Some(ClientMessage::Key {
                key: "ArrowLeft".to_string()
            })
        );
    }

    #[test]
    fn malformed_messages_are_dropped() {
        assert_eq!(decode_client_message("not json"), None);
        assert_eq!(decode_client_message(r#"{"type":"teleport"}"#), None);
        assert_eq!(decode_client_message(r#"{"type":"direction"}"#), None);
    }

    #[test]
    fn state_message_carries_type_tag_and_snapshot_fields() {
        let mut engine = Engine::seeded(5, Arc::new(ManualClock::starting_at(0)));
        engine.initialize(16, 12).expect("valid board");
        let snapshot = engine.snapshot();

        let encoded =
            encode_server_message(&ServerMessage::State(&snapshot)).expect("state should encode");
        let value: serde_json::Value = serde_json::from_str(&encoded).expect("valid json");
        assert_eq!(value["type"], "state");
        assert_eq!(value["gameState"], "Playing");
        assert_eq!(value["boardSize"]["height"], 12);
        assert_eq!(value["direction"], "Right");

        let encoded = encode_server_message(&ServerMessage::Error {
            message: "nope".to_string(),
        })
        .expect("error should encode");
        assert_eq!(encoded, r#"{"type":"error","message":"nope"}"#);
    }
}
