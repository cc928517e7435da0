use std::env;
use std::fs;
use std::path::Path;

use pikabot_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct ConfigField<'a> {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
    source_file: Option<(&'a Value, &'a Path)>,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source_file = config_file_doc.as_ref().zip(config_file_path.as_deref());

    let fields: [(&'static str, &'static [&'static str], String); 9] = [
        (
            "slack.signing_secret",
            &["PIKABOT_SLACK_SIGNING_SECRET", "SLACK_SIGNING_SECRET"],
            redact_secret(config.slack.signing_secret.expose_secret()),
        ),
        (
            "slack.timestamp_tolerance_secs",
            &["PIKABOT_SLACK_TIMESTAMP_TOLERANCE_SECS"],
            config.slack.timestamp_tolerance_secs.to_string(),
        ),
        (
            "scores.path",
            &["PIKABOT_SCORES_PATH", "SLACK_PIKA_SCOREFILE"],
            config.scores.path.display().to_string(),
        ),
        ("scores.top_count", &["PIKABOT_SCORES_TOP_COUNT"], config.scores.top_count.to_string()),
        (
            "server.bind_address",
            &["PIKABOT_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        ("server.port", &["PIKABOT_SERVER_PORT"], config.server.port.to_string()),
        (
            "server.graceful_shutdown_secs",
            &["PIKABOT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        (
            "logging.level",
            &["PIKABOT_LOGGING_LEVEL", "PIKABOT_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        (
            "logging.format",
            &["PIKABOT_LOGGING_FORMAT", "PIKABOT_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.into_iter().map(|(key, env_keys, value)| {
        render_line(&ConfigField { key, env_keys, value, source_file })
    }));
    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(field: &ConfigField<'_>) -> String {
    // Blank values are ignored by the loader, so they do not count as a source.
    let env_key = field
        .env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = env_key {
        return format!("env ({env_key})");
    }

    match field.source_file {
        Some((doc, path)) if contains_path(doc, field.key) => {
            format!("file ({})", path.display())
        }
        _ => "default".to_string(),
    }
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(field: &ConfigField<'_>) -> String {
    format!("- {} = {} (source: {})", field.key, field.value, field_source(field))
}

/// Signing secrets have no public prefix worth showing, so only emptiness is reported.
fn redact_secret(secret: &str) -> String {
    if secret.trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
