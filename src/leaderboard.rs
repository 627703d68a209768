use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;

/// A game that ended with points on the board, as observed by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedGame {
    pub session_id: String,
    pub player_name: String,
    pub score: u32,
    pub elapsed_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub player_name: String,
    pub score: u32,
    /// Whole seconds.
    pub game_time: i64,
    pub region: String,
}

impl ScoreSubmission {
    pub fn from_game(game: &FinishedGame, region: &str) -> Self {
        Self {
            player_name: game.player_name.clone(),
            score: game.score,
            game_time: game.elapsed_ms.max(0) / 1000,
            region: region.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("leaderboard request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("leaderboard rejected score with status {0}")]
    Rejected(reqwest::StatusCode),
}

#[derive(Debug, Clone)]
pub struct LeaderboardClient {
    client: reqwest::Client,
    endpoint: String,
}

impl LeaderboardClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/leaderboard/scores", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn submit(&self, submission: &ScoreSubmission) -> Result<(), LeaderboardError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(submission)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LeaderboardError::Rejected(status));
        }
        Ok(())
    }
}

/// Drains finished games and forwards them to the scoring service, one at a time.
pub async fn run_submitter(
    mut finished: UnboundedReceiver<FinishedGame>,
    client: Option<LeaderboardClient>,
    region: String,
) {
    while let Some(game) = finished.recv().await {
        let submission = ScoreSubmission::from_game(&game, &region);
        let Some(client) = &client else {
            tracing::info!(
                session_id = %game.session_id,
                score = submission.score,
                "leaderboard disabled, score not submitted"
            );
            continue;
        };
        match client.submit(&submission).await {
            Ok(()) => tracing::info!(
                session_id = %game.session_id,
                player = %submission.player_name,
                score = submission.score,
                "score submitted"
            ),
            Err(error) => tracing::warn!(
                ?error,
                session_id = %game.session_id,
                score = submission.score,
                "score submission failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn finished(elapsed_ms: i64) -> FinishedGame {
        FinishedGame {
            session_id: "session-1".to_string(),
            player_name: "Ada".to_string(),
            score: 450,
            elapsed_ms,
        }
    }

    #[test]
    fn submission_reports_whole_seconds() {
        let submission = ScoreSubmission::from_game(&finished(61_999), "global");
        assert_eq!(submission.game_time, 61);
        assert_eq!(submission.score, 450);
        assert_eq!(submission.region, "global");
    }

    #[test]
    fn submission_serializes_camel_case() {
        let submission = ScoreSubmission::from_game(&finished(5_000), "eu");
        let value = serde_json::to_value(&submission).expect("submission should serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "playerName": "Ada",
                "score": 450,
                "gameTime": 5,
                "region": "eu",
            })
        );
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let client = LeaderboardClient::new("http://scores.local/");
        assert_eq!(client.endpoint(), "http://scores.local/api/leaderboard/scores");
    }

    #[tokio::test]
    async fn submitter_without_client_drains_until_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(finished(1_000)).expect("receiver alive");
        drop(tx);
        run_submitter(rx, None, "global".to_string()).await;
    }
}
