use pikabot_core::ScoreEntry;
use serde::Serialize;

pub const INVALID_COMMAND_TEXT: &str = "invalid command";
pub const EMPTY_LEADERBOARD_TEXT: &str = "no scores yet";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    InChannel,
}

/// Body returned synchronously to a slash-command request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlashResponse {
    pub text: String,
    pub response_type: ResponseType,
}

impl SlashResponse {
    pub fn in_channel(text: impl Into<String>) -> Self {
        Self { text: text.into(), response_type: ResponseType::InChannel }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

pub fn score_message(entry: &ScoreEntry) -> SlashResponse {
    SlashResponse::in_channel(entry.to_string())
}

pub fn leaderboard_message(entries: &[ScoreEntry]) -> SlashResponse {
    if entries.is_empty() {
        return SlashResponse::in_channel(EMPTY_LEADERBOARD_TEXT);
    }

    let lines: Vec<String> = entries.iter().map(ToString::to_string).collect();
    SlashResponse::in_channel(lines.join("\n"))
}

pub fn invalid_command_message() -> SlashResponse {
    SlashResponse::in_channel(INVALID_COMMAND_TEXT)
}
