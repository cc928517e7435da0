pub mod config;
pub mod errors;
pub mod scores;

pub use errors::ScoreStoreError;
pub use scores::{Leaderboard, Readiness, ScoreEntry, ScoreFile};
