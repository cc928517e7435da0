use std::sync::Mutex;

use async_trait::async_trait;
use pikabot_core::{Leaderboard, ScoreEntry};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::message::{self, SlashResponse};
use crate::shout::shout;

pub const SCORE_COMMAND: &str = "/score";
pub const SHOUT_COMMANDS: [&str; 2] = ["/mark", "/shout"];
pub const DEFAULT_TOP_COUNT: usize = 3;

/// Form fields Slack posts for a slash command. Only `command` is required.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SlashCommandPayload {
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub response_url: String,
    #[serde(default)]
    pub trigger_id: String,
}

impl SlashCommandPayload {
    pub fn from_form(body: &[u8]) -> Result<Self, PayloadError> {
        let payload: Self = serde_urlencoded::from_bytes(body)?;
        if payload.command.trim().is_empty() {
            return Err(PayloadError::MissingCommand);
        }
        Ok(payload)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlashCommand {
    Shout { text: String },
    Score(ScoreCommand),
    Unsupported { command: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScoreCommand {
    Top,
    Increment { name: String },
    Decrement { name: String },
    Invalid,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed slash command payload: {0}")]
    Malformed(#[from] serde_urlencoded::de::Error),
    #[error("slash command payload has an empty `command` field")]
    MissingCommand,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error("unsupported slash command: {0}")]
    UnsupportedCommand(String),
    #[error("scoreboard failed: {0}")]
    Scoreboard(String),
}

pub fn classify_slash_command(payload: &SlashCommandPayload) -> SlashCommand {
    let command = payload.command.trim();
    if command == SCORE_COMMAND {
        return SlashCommand::Score(parse_score_command(&payload.text));
    }
    if SHOUT_COMMANDS.contains(&command) {
        return SlashCommand::Shout { text: payload.text.clone() };
    }
    SlashCommand::Unsupported { command: command.to_owned() }
}

/// `top`, `<name>++` or `<name>--`; everything else is invalid.
pub fn parse_score_command(text: &str) -> ScoreCommand {
    let trimmed = text.trim();
    if trimmed == "top" {
        return ScoreCommand::Top;
    }

    if let Some(name) = trimmed.strip_suffix("++").and_then(score_name) {
        return ScoreCommand::Increment { name };
    }
    if let Some(name) = trimmed.strip_suffix("--").and_then(score_name) {
        return ScoreCommand::Decrement { name };
    }

    ScoreCommand::Invalid
}

fn score_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    (!name.is_empty()).then(|| name.to_owned())
}

#[async_trait]
pub trait Scoreboard: Send + Sync {
    async fn top(&self, limit: usize) -> Result<Vec<ScoreEntry>, CommandRouteError>;

    async fn increment(&self, name: &str) -> Result<ScoreEntry, CommandRouteError>;

    async fn decrement(&self, name: &str) -> Result<ScoreEntry, CommandRouteError>;
}

/// Scoreboard kept entirely in memory; nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryScoreboard {
    board: Mutex<Leaderboard>,
}

impl MemoryScoreboard {
    pub fn new(board: Leaderboard) -> Self {
        Self { board: Mutex::new(board) }
    }

    pub fn snapshot(&self) -> Leaderboard {
        self.board.lock().map(|board| board.clone()).unwrap_or_default()
    }

    fn with_board<R>(
        &self,
        apply: impl FnOnce(&mut Leaderboard) -> R,
    ) -> Result<R, CommandRouteError> {
        let mut board = self
            .board
            .lock()
            .map_err(|_| CommandRouteError::Scoreboard("scoreboard lock poisoned".to_owned()))?;
        Ok(apply(&mut board))
    }
}

#[async_trait]
impl Scoreboard for MemoryScoreboard {
    async fn top(&self, limit: usize) -> Result<Vec<ScoreEntry>, CommandRouteError> {
        self.with_board(|board| board.top(limit))
    }

    async fn increment(&self, name: &str) -> Result<ScoreEntry, CommandRouteError> {
        self.with_board(|board| board.increment(name))
    }

    async fn decrement(&self, name: &str) -> Result<ScoreEntry, CommandRouteError> {
        self.with_board(|board| board.decrement(name))
    }
}

pub struct CommandRouter<S> {
    scoreboard: S,
    top_count: usize,
}

impl<S> CommandRouter<S>
where
    S: Scoreboard,
{
    pub fn new(scoreboard: S) -> Self {
        Self { scoreboard, top_count: DEFAULT_TOP_COUNT }
    }

    pub fn with_top_count(mut self, top_count: usize) -> Self {
        self.top_count = top_count;
        self
    }

    pub fn scoreboard(&self) -> &S {
        &self.scoreboard
    }

    pub async fn route(
        &self,
        payload: &SlashCommandPayload,
    ) -> Result<SlashResponse, CommandRouteError> {
        info!(
            event_name = "slack.command.received",
            command = %payload.command,
            user_id = %payload.user_id,
            channel_id = %payload.channel_id,
            "slash command received"
        );
        debug!(event_name = "slack.command.text", text = %payload.text, "slash command text");

        match classify_slash_command(payload) {
            SlashCommand::Shout { text } => Ok(SlashResponse::in_channel(shout(&text))),
            SlashCommand::Score(command) => self.route_score(command).await,
            SlashCommand::Unsupported { command } => {
                Err(CommandRouteError::UnsupportedCommand(command))
            }
        }
    }

    async fn route_score(&self, command: ScoreCommand) -> Result<SlashResponse, CommandRouteError> {
        match command {
            ScoreCommand::Top => {
                let entries = self.scoreboard.top(self.top_count).await?;
                Ok(message::leaderboard_message(&entries))
            }
            ScoreCommand::Increment { name } => {
                let entry = self.scoreboard.increment(&name).await?;
                info!(
                    event_name = "slack.score.incremented",
                    name = %entry.name,
                    count = entry.count,
                    "score incremented"
                );
                Ok(message::score_message(&entry))
            }
            ScoreCommand::Decrement { name } => {
                let entry = self.scoreboard.decrement(&name).await?;
                info!(
                    event_name = "slack.score.decremented",
                    name = %entry.name,
                    count = entry.count,
                    "score decremented"
                );
                Ok(message::score_message(&entry))
            }
            ScoreCommand::Invalid => Ok(message::invalid_command_message()),
        }
    }
}
