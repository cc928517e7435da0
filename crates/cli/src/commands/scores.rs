use std::path::Path;

use pikabot_core::config::{AppConfig, LoadOptions};
use pikabot_core::{Leaderboard, ScoreEntry, ScoreFile};

use super::CommandResult;

struct Target {
    file: ScoreFile,
    top_count: usize,
}

/// An explicit `--file` skips config loading, so the score file can be
/// repaired on a host without the signing secret.
fn resolve(command: &str, file: Option<&Path>) -> Result<Target, CommandResult> {
    if let Some(path) = file {
        return Ok(Target {
            file: ScoreFile::new(path),
            top_count: AppConfig::default().scores.top_count,
        });
    }

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => Ok(Target {
            file: ScoreFile::new(config.scores.path.clone()),
            top_count: config.scores.top_count,
        }),
        Err(error) => Err(CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )),
    }
}

pub fn top(file: Option<&Path>, limit: Option<usize>) -> CommandResult {
    const COMMAND: &str = "scores-top";
    let target = match resolve(COMMAND, file) {
        Ok(target) => target,
        Err(failure) => return failure,
    };

    match target.file.try_read() {
        Ok(board) => {
            let entries = board.top(limit.unwrap_or(target.top_count));
            CommandResult::success(COMMAND, render_top(&entries))
        }
        Err(error) => CommandResult::failure(COMMAND, "score_file_read", error.to_string(), 3),
    }
}

pub fn set(file: Option<&Path>, name: &str, count: i64) -> CommandResult {
    mutate("scores-set", file, name, |board, name| board.set(name, count))
}

pub fn increment(file: Option<&Path>, name: &str) -> CommandResult {
    mutate("scores-bump", file, name, Leaderboard::increment)
}

pub fn decrement(file: Option<&Path>, name: &str) -> CommandResult {
    mutate("scores-drop", file, name, Leaderboard::decrement)
}

fn mutate(
    command: &str,
    file: Option<&Path>,
    name: &str,
    apply: impl FnOnce(&mut Leaderboard, &str) -> ScoreEntry,
) -> CommandResult {
    let name = name.trim();
    if name.is_empty() {
        return CommandResult::failure(command, "input_parse", "name must not be empty", 2);
    }

    let target = match resolve(command, file) {
        Ok(target) => target,
        Err(failure) => return failure,
    };

    match target.file.try_update(|board| apply(board, name)) {
        Ok(entry) => CommandResult::success(command, entry.to_string()),
        Err(error) => CommandResult::failure(command, "score_file_write", error.to_string(), 3),
    }
}

fn render_top(entries: &[ScoreEntry]) -> String {
    if entries.is_empty() {
        return "no scores yet".to_string();
    }
    entries.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
