use crate::game::Engine;
use crate::shared::names::DEFAULT_PLAYER_NAME;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

pub type EngineFactory = Box<dyn Fn() -> Engine + Send + Sync>;

/// One connected player's game. The engine is only ever reached through this session.
#[derive(Debug)]
pub struct GameSession {
    id: String,
    engine: Mutex<Engine>,
    player_name: Mutex<String>,
}

impl GameSession {
    fn new(id: String, engine: Engine) -> Self {
        Self {
            id,
            engine: Mutex::new(engine),
            player_name: Mutex::new(DEFAULT_PLAYER_NAME.to_string()),
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn engine(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().await
    }

    pub async fn player_name(&self) -> String {
        self.player_name.lock().await.clone()
    }

    pub async fn set_player_name(&self, name: String) {
        *self.player_name.lock().await = name;
    }
}

pub struct SessionManager {
    sessions: DashMap<String, Arc<GameSession>>,
    factory: EngineFactory,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_factory(Box::new(Engine::new))
    }

    pub fn with_factory(factory: EngineFactory) -> Self {
        Self {
            sessions: DashMap::new(),
            factory,
        }
    }

    /// Returns the session for `session_id`, building it on first use. The entry lock
    /// guarantees a single engine per id even when callers race.
    pub fn get_or_create(&self, session_id: &str) -> Arc<GameSession> {
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let session = Arc::new(GameSession::new(session_id.to_string(), (self.factory)()));
                entry.insert(session.clone());
                tracing::info!(session_id, "game session created");
                session
            }
        }
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<GameSession>> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
    }

    /// Drops the session. Removing an unknown id is a no-op.
    pub fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id, "game session removed");
        }
        removed
    }

    pub fn list_active(&self) -> Vec<(String, Arc<GameSession>)> {
        self.sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    #[cfg(test)]
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}
