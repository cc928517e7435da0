use std::sync::Arc;

use pikabot_core::config::AppConfig;
use pikabot_core::ScoreFile;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub score_file: Arc<ScoreFile>,
    pub listener: TcpListener,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("could not bind slash command listener on `{address}`: {source}")]
    Bind { address: String, source: std::io::Error },
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let score_file = Arc::new(ScoreFile::new(config.scores.path.clone()));
    info!(
        event_name = "system.bootstrap.score_file",
        path = %score_file.path().display(),
        top_count = config.scores.top_count,
        "score file configured"
    );

    let address = config.listen_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| BootstrapError::Bind { address: address.clone(), source })?;

    Ok(Application { config, score_file, listener })
}
