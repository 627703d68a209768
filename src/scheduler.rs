use crate::app::time::now_millis;
use crate::broadcast::Broadcaster;
use crate::game::GameState;
use crate::leaderboard::FinishedGame;
use crate::session::SessionManager;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Default)]
struct BroadcastCursor {
    last_step: Option<u64>,
    last_state: Option<GameState>,
    last_broadcast_at: Option<i64>,
    /// `games_started` value of the last game whose end was handled.
    reported_game: Option<u64>,
}

/// Drives every live session from one loop and decides which snapshots go out.
pub struct TickScheduler {
    sessions: Arc<SessionManager>,
    broadcaster: Arc<dyn Broadcaster>,
    finished_games: Option<UnboundedSender<FinishedGame>>,
    tick_interval: Duration,
    idle_broadcast_ms: i64,
    cursors: HashMap<String, BroadcastCursor>,
}

impl TickScheduler {
    pub fn new(
        sessions: Arc<SessionManager>,
        broadcaster: Arc<dyn Broadcaster>,
        tick_interval: Duration,
        idle_broadcast_interval: Duration,
    ) -> Self {
        Self {
            sessions,
            broadcaster,
            finished_games: None,
            tick_interval,
            idle_broadcast_ms: idle_broadcast_interval.as_millis() as i64,
            cursors: HashMap::new(),
        }
    }

    pub fn with_finished_games(mut self, finished_games: UnboundedSender<FinishedGame>) -> Self {
        self.finished_games = Some(finished_games);
        self
    }

    pub async fn run(mut self) {
        tracing::info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            "tick scheduler started"
        );
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut previous = Instant::now();
        loop {
            interval.tick().await;
            let now = Instant::now();
            let delta_ms = now.duration_since(previous).as_secs_f64() * 1000.0;
            previous = now;
            self.tick(delta_ms, now_millis()).await;
        }
    }

    /// Advances every session by `delta_ms` and pushes the snapshots that are due.
    pub async fn tick(&mut self, delta_ms: f64, now: i64) {
        let active = self.sessions.list_active();
        let live: HashSet<&str> = active.iter().map(|(id, _)| id.as_str()).collect();
        self.cursors.retain(|id, _| live.contains(id.as_str()));

        for (session_id, session) in &active {
            let cursor = self.cursors.entry(session_id.clone()).or_default();
            let (snapshot, finished) = {
                let mut engine = session.engine().await;
                let advanced = engine.update(delta_ms);
                let state = engine.state();
                let steps = engine.logic_steps();

                let due = match state {
                    GameState::Playing => advanced && cursor.last_step != Some(steps),
                    _ => {
                        cursor.last_state != Some(state)
                            || cursor
                                .last_broadcast_at
                                .map_or(true, |at| now - at >= self.idle_broadcast_ms)
                    }
                };

                let game = engine.games_started();
                let finished = if state == GameState::GameOver && cursor.reported_game != Some(game)
                {
                    cursor.reported_game = Some(game);
                    (engine.score() > 0).then(|| (engine.score(), engine.elapsed_millis()))
                } else {
                    None
                };

                let snapshot = due.then(|| {
                    cursor.last_step = Some(steps);
                    cursor.last_state = Some(state);
                    cursor.last_broadcast_at = Some(now);
                    engine.snapshot()
                });
                (snapshot, finished)
            };

            if let Some((score, elapsed_ms)) = finished {
                let player_name = session.player_name().await;
                tracing::info!(%session_id, score, elapsed_ms, "game over");
                if let Some(finished_games) = &self.finished_games {
                    let game = FinishedGame {
                        session_id: session_id.clone(),
                        player_name,
                        score,
                        elapsed_ms,
                    };
                    if finished_games.send(game).is_err() {
                        tracing::warn!(%session_id, "leaderboard submitter is gone");
                    }
                }
            }

            let Some(snapshot) = snapshot else { continue };
            if let Err(error) = self.broadcaster.send(session_id, &snapshot) {
                tracing::warn!(%session_id, %error, "broadcast failed, evicting session");
                self.evict(session_id);
            }
        }
    }

    fn evict(&mut self, session_id: &str) {
        self.sessions.remove(session_id);
        self.broadcaster.forget(session_id);
        self.cursors.remove(session_id);
    }
}
