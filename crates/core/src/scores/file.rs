use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error};

use super::{Leaderboard, ScoreEntry};
use crate::errors::ScoreStoreError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    Loaded { entries: usize, skipped: usize },
    /// No file yet; the first vote creates it in `directory`.
    Creatable { directory: PathBuf },
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded { entries, skipped } => {
                write!(f, "{entries} entries loaded ({skipped} malformed records skipped)")
            }
            Self::Creatable { directory } => {
                write!(f, "score file will be created in `{}`", directory.display())
            }
        }
    }
}

/// A score file guarded by an in-process lock so that each
/// load → mutate → save cycle runs without interleaving.
#[derive(Debug)]
pub struct ScoreFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ScoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Leaderboard {
        let _guard = self.guard();
        Leaderboard::load(&self.path)
    }

    /// Runs `apply` against a freshly loaded board and writes the board back.
    /// A failed write is logged; the caller still receives `apply`'s result.
    pub fn update<R>(&self, apply: impl FnOnce(&mut Leaderboard) -> R) -> R {
        let _guard = self.guard();
        let mut board = Leaderboard::load(&self.path);
        let outcome = apply(&mut board);

        match board.save(&self.path) {
            Ok(()) => debug!(
                event_name = "scores.save.completed",
                path = %self.path.display(),
                entries = board.len(),
                "score file written"
            ),
            Err(save_error) => error!(
                event_name = "scores.save.failed",
                path = %self.path.display(),
                error = %save_error,
                "score file could not be written"
            ),
        }

        outcome
    }

    /// Reads the board in one pass. A missing file is an empty board; a file
    /// that cannot be opened or read to the end is an error.
    pub fn try_read(&self) -> Result<Leaderboard, ScoreStoreError> {
        let _guard = self.guard();
        self.load_strict()
    }

    /// Like [`ScoreFile::update`], but a board that cannot be read completely
    /// or written back is reported instead of being replaced.
    pub fn try_update<R>(
        &self,
        apply: impl FnOnce(&mut Leaderboard) -> R,
    ) -> Result<R, ScoreStoreError> {
        let _guard = self.guard();
        let mut board = self.load_strict()?;

        let outcome = apply(&mut board);
        board.save(&self.path)?;
        Ok(outcome)
    }

    pub fn readiness(&self) -> Result<Readiness, ScoreStoreError> {
        let _guard = self.guard();
        if self.path.exists() {
            let report = Leaderboard::try_load(&self.path)?;
            if let Some(read_error) = report.error {
                return Err(read_error);
            }
            return Ok(Readiness::Loaded {
                entries: report.leaderboard.len(),
                skipped: report.skipped,
            });
        }

        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if directory.is_dir() {
            Ok(Readiness::Creatable { directory })
        } else {
            Err(ScoreStoreError::MissingDirectory { path: directory })
        }
    }

    pub fn top(&self, n: usize) -> Vec<ScoreEntry> {
        self.read().top(n)
    }

    pub fn increment(&self, name: &str) -> ScoreEntry {
        self.update(|board| board.increment(name))
    }

    pub fn decrement(&self, name: &str) -> ScoreEntry {
        self.update(|board| board.decrement(name))
    }

    fn load_strict(&self) -> Result<Leaderboard, ScoreStoreError> {
        match Leaderboard::try_load(&self.path) {
            Ok(report) => match report.error {
                Some(read_error) => Err(read_error),
                None => Ok(report.leaderboard),
            },
            Err(open_error) if open_error.is_not_found() => Ok(Leaderboard::new()),
            Err(open_error) => Err(open_error),
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded state lives on disk, so a poisoned lock carries nothing stale.
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
