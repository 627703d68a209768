use crate::broadcast::{BroadcastError, ChannelHub};
use crate::game::input::handle_key;
use crate::game::{Direction, GameState};
use crate::protocol::{decode_client_message, ClientMessage, ServerMessage};
use crate::session::SessionManager;
use crate::shared::names::sanitize_player_name;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

/// Connection-facing half of the server: routes inbound messages to the
/// owning session and answers each command with a fresh snapshot.
pub struct GameServer {
    sessions: Arc<SessionManager>,
    hub: Arc<ChannelHub>,
    default_width: i32,
    default_height: i32,
}

impl GameServer {
    pub fn new(
        sessions: Arc<SessionManager>,
        hub: Arc<ChannelHub>,
        default_width: i32,
        default_height: i32,
    ) -> Self {
        Self {
            sessions,
            hub,
            default_width,
            default_height,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Allocates a session id for a new connection and opens its outbound queue.
    pub fn connect(&self) -> (String, UnboundedReceiver<String>) {
        let session_id = Uuid::new_v4().to_string();
        let outbound = self.hub.register(&session_id);
        self.sessions.get_or_create(&session_id);
        tracing::info!(%session_id, "client connected");
        (session_id, outbound)
    }

    pub fn disconnect(&self, session_id: &str) {
        self.hub.unregister(session_id);
        if self.sessions.remove(session_id) {
            tracing::info!(%session_id, "client disconnected");
        }
    }

    pub async fn handle_text_message(&self, session_id: &str, text: &str) {
        let Some(message) = decode_client_message(text) else {
            tracing::debug!(%session_id, "ignoring malformed message");
            return;
        };
        let Some(session) = self.sessions.get(session_id) else {
            return;
        };

        let reply = {
            let mut engine = session.engine().await;
            let applied: Result<(), String> = match message {
                ClientMessage::Start {
                    width,
                    height,
                    name,
                } => {
                    let width = width.unwrap_or(self.default_width);
                    let height = height.unwrap_or(self.default_height);
                    match engine.initialize(width, height) {
                        Ok(()) => {
                            let name = sanitize_player_name(name.as_deref());
                            tracing::info!(%session_id, width, height, player = %name, "game started");
                            session.set_player_name(name).await;
                            Ok(())
                        }
                        Err(error) => Err(error.to_string()),
                    }
                }
                ClientMessage::Direction { direction } => {
                    match direction.parse::<Direction>() {
                        Ok(direction) => {
                            engine.change_direction(direction);
                            Ok(())
                        }
                        Err(error) => Err(error.to_string()),
                    }
                }
                ClientMessage::Pause => {
                    if engine.state() == GameState::Playing {
                        engine.toggle_pause();
                    }
                    Ok(())
                }
                ClientMessage::Resume => {
                    if engine.state() == GameState::Paused {
                        engine.toggle_pause();
                    }
                    Ok(())
                }
                ClientMessage::Key { key } => {
                    handle_key(&mut engine, &key);
                    Ok(())
                }
            };
            applied.map(|()| engine.snapshot())
        };

        let sent = match &reply {
            Ok(snapshot) => self.hub.send_message(session_id, &ServerMessage::State(snapshot)),
            Err(message) => self.hub.send_message(
                session_id,
                &ServerMessage::Error {
                    message: message.clone(),
                },
            ),
        };
        match sent {
            Ok(()) => {}
            Err(error @ BroadcastError::Disconnected(_)) => {
                tracing::debug!(%session_id, %error, "reply dropped")
            }
            Err(error) => tracing::warn!(%session_id, %error, "failed to send reply"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::clock::ManualClock;
    use crate::game::Engine;

    fn make_server() -> GameServer {
        let clock = ManualClock::starting_at(0);
        let sessions = Arc::new(SessionManager::with_factory(Box::new(move || {
            Engine::seeded(17, Arc::new(clock.clone()))
        })));
        GameServer::new(sessions, Arc::new(ChannelHub::new()), 30, 30)
    }

    fn next_message(outbound: &mut UnboundedReceiver<String>) -> serde_json::Value {
        let payload = outbound.try_recv().expect("a reply should be queued");
        serde_json::from_str(&payload).expect("reply should be json")
    }

    #[tokio::test]
    async fn start_uses_defaults_and_sanitizes_the_name() {
        let server = make_server();
        let (session_id, mut outbound) = server.connect();

        server
            .handle_text_message(&session_id, r#"{"type":"start","name":"  Neon   Viper "}"#)
            .await;

        let reply = next_message(&mut outbound);
        assert_eq!(reply["type"], "state");
        assert_eq!(reply["gameState"], "Playing");
        assert_eq!(reply["boardSize"]["width"], 30);
        assert_eq!(reply["boardSize"]["height"], 30);
        let session = server.sessions().get(&session_id).expect("session exists");
        assert_eq!(session.player_name().await, "Neon Viper");
    }

    #[tokio::test]
    async fn invalid_board_size_is_reported_and_leaves_the_engine_ready() {
        let server = make_server();
        let (session_id, mut outbound) = server.connect();

        server
            .handle_text_message(&session_id, r#"{"type":"start","width":4,"height":30}"#)
            .await;

        let reply = next_message(&mut outbound);
        assert_eq!(reply["type"], "error");
        assert!(reply["message"].as_str().unwrap_or_default().contains("4x30"));
        let session = server.sessions().get(&session_id).expect("session exists");
        assert_eq!(session.engine().await.state(), GameState::Ready);
    }

    #[tokio::test]
    async fn pause_and_resume_only_apply_in_matching_states() {
        let server = make_server();
        let (session_id, mut outbound) = server.connect();

        server
            .handle_text_message(&session_id, r#"{"type":"resume"}"#)
            .await;
        assert_eq!(next_message(&mut outbound)["gameState"], "Ready");

        server
            .handle_text_message(&session_id, r#"{"type":"start","width":20,"height":20}"#)
            .await;
        next_message(&mut outbound);

        server
            .handle_text_message(&session_id, r#"{"type":"pause"}"#)
            .await;
        assert_eq!(next_message(&mut outbound)["gameState"], "Paused");
        server
            .handle_text_message(&session_id, r#"{"type":"pause"}"#)
            .await;
        assert_eq!(next_message(&mut outbound)["gameState"], "Paused");
        server
            .handle_text_message(&session_id, r#"{"type":"resume"}"#)
            .await;
        assert_eq!(next_message(&mut outbound)["gameState"], "Playing");
    }

    #[tokio::test]
    async fn direction_and_key_messages_steer_the_snake() {
        let server = make_server();
        let (session_id, mut outbound) = server.connect();
        server
            .handle_text_message(&session_id, r#"{"type":"start","width":20,"height":20}"#)
            .await;
        next_message(&mut outbound);

        server
            .handle_text_message(&session_id, r#"{"type":"direction","direction":"UP"}"#)
            .await;
        next_message(&mut outbound);
        server
            .handle_text_message(&session_id, r#"{"type":"key","key":"ArrowLeft"}"#)
            .await;
        next_message(&mut outbound);

        let session = server.sessions().get(&session_id).expect("session exists");
        let engine = session.engine().await;
        assert_eq!(
            engine.queued_directions().iter().copied().collect::<Vec<_>>(),
            vec![Direction::Up, Direction::Left]
        );
    }

    #[tokio::test]
    async fn unknown_direction_gets_an_error_reply() {
        let server = make_server();
        let (session_id, mut outbound) = server.connect();

        server
            .handle_text_message(&session_id, r#"{"type":"direction","direction":"north"}"#)
            .await;

        assert_eq!(next_message(&mut outbound)["type"], "error");
    }

    #[tokio::test]
    async fn malformed_messages_and_disconnected_sessions_are_ignored() {
        let server = make_server();
        let (session_id, mut outbound) = server.connect();

        server.handle_text_message(&session_id, "{not json").await;
        assert!(outbound.try_recv().is_err());

        server.disconnect(&session_id);
        assert!(!server.sessions().contains(&session_id));
        server
            .handle_text_message(&session_id, r#"{"type":"start"}"#)
            .await;
        assert!(!server.sessions().contains(&session_id));
    }
}
