use crate::game::GameSnapshot;
use crate::protocol::{encode_server_message, ServerMessage};
use dashmap::DashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("session {0} has no open connection")]
    Disconnected(String),
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outbound side of the transport, addressed by session id.
pub trait Broadcaster: Send + Sync {
    fn send(&self, session_id: &str, snapshot: &GameSnapshot) -> Result<(), BroadcastError>;

    /// Called when a session is evicted after a failed send.
    fn forget(&self, _session_id: &str) {}
}

/// Per-session outbound queues feeding the WebSocket writer tasks.
#[derive(Debug, Default)]
pub struct ChannelHub {
    senders: DashMap<String, UnboundedSender<String>>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, session_id: &str) -> UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(session_id.to_string(), tx);
        rx
    }

    pub fn unregister(&self, session_id: &str) {
        self.senders.remove(session_id);
    }

    pub fn send_message(
        &self,
        session_id: &str,
        message: &ServerMessage<'_>,
    ) -> Result<(), BroadcastError> {
        let payload = encode_server_message(message)?;
        let Some(sender) = self.senders.get(session_id) else {
            return Err(BroadcastError::Disconnected(session_id.to_string()));
        };
        sender
            .send(payload)
            .map_err(|_| BroadcastError::Disconnected(session_id.to_string()))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.senders.len()
    }
}

impl Broadcaster for ChannelHub {
    fn send(&self, session_id: &str, snapshot: &GameSnapshot) -> Result<(), BroadcastError> {
        self.send_message(session_id, &ServerMessage::State(snapshot))
    }

    fn forget(&self, session_id: &str) {
        self.unregister(session_id);
    }
}
