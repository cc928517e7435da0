use std::sync::Arc;

use async_trait::async_trait;
use pikabot_core::{ScoreEntry, ScoreFile};
use pikabot_slack::commands::{CommandRouteError, Scoreboard};

/// Adapts the locked score file to the async router. File work runs on the
/// blocking pool.
#[derive(Clone, Debug)]
pub struct FileScoreboard {
    file: Arc<ScoreFile>,
}

impl FileScoreboard {
    pub fn new(file: Arc<ScoreFile>) -> Self {
        Self { file }
    }

    async fn run<R, F>(&self, work: F) -> Result<R, CommandRouteError>
    where
        R: Send + 'static,
        F: FnOnce(&ScoreFile) -> R + Send + 'static,
    {
        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || work(&file))
            .await
            .map_err(|error| CommandRouteError::Scoreboard(format!("score task failed: {error}")))
    }
}

#[async_trait]
impl Scoreboard for FileScoreboard {
    async fn top(&self, limit: usize) -> Result<Vec<ScoreEntry>, CommandRouteError> {
        self.run(move |file| file.top(limit)).await
    }

    async fn increment(&self, name: &str) -> Result<ScoreEntry, CommandRouteError> {
        let name = name.to_owned();
        self.run(move |file| file.increment(&name)).await
    }

    async fn decrement(&self, name: &str) -> Result<ScoreEntry, CommandRouteError> {
        let name = name.to_owned();
        self.run(move |file| file.decrement(&name)).await
    }
}
