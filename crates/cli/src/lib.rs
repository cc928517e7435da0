pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "pikabot",
    about = "Pikabot operator CLI",
    long_about = "Inspect Pikabot configuration, check readiness, and maintain the score file.",
    after_help = "Examples:\n  pikabot doctor --json\n  pikabot config\n  pikabot scores top -n 5"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, signing secret readiness, and score file access")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Read or correct the leaderboard score file")]
    Scores {
        #[arg(long, global = true, help = "Score file to use instead of the configured one")]
        file: Option<PathBuf>,
        #[command(subcommand)]
        action: ScoresAction,
    },
}

#[derive(Debug, Subcommand)]
enum ScoresAction {
    #[command(about = "Print the highest scores")]
    Top {
        #[arg(short = 'n', long, help = "Number of entries (defaults to scores.top_count)")]
        limit: Option<usize>,
    },
    #[command(about = "Overwrite the score for a name")]
    Set {
        name: String,
        #[arg(allow_hyphen_values = true)]
        count: i64,
    },
    #[command(about = "Add one point to a name")]
    Bump { name: String },
    #[command(about = "Take one point from a name")]
    Drop { name: String },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Scores { file, action } => {
            let file = file.as_deref();
            match action {
                ScoresAction::Top { limit } => commands::scores::top(file, limit),
                ScoresAction::Set { name, count } => commands::scores::set(file, &name, count),
                ScoresAction::Bump { name } => commands::scores::increment(file, &name),
                ScoresAction::Drop { name } => commands::scores::decrement(file, &name),
            }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
