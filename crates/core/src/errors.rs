use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreStoreError {
    #[error("could not open score file `{path}`: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("could not read score records: {0}")]
    Read(#[source] csv::Error),
    #[error("could not write score file `{path}`: {source}")]
    Write { path: PathBuf, source: csv::Error },
    #[error("could not flush score file `{path}`: {source}")]
    Flush { path: PathBuf, source: io::Error },
    #[error("score file directory `{path}` does not exist")]
    MissingDirectory { path: PathBuf },
}

impl ScoreStoreError {
    /// A missing score file is the normal state before the first vote.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Open { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::PathBuf;

    use super::ScoreStoreError;

    #[test]
    fn not_found_open_error_is_classified() {
        let error = ScoreStoreError::Open {
            path: PathBuf::from("scores.csv"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(error.is_not_found());

        let denied = ScoreStoreError::Open {
            path: PathBuf::from("scores.csv"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        };
        assert!(!denied.is_not_found());
        assert!(denied.to_string().contains("scores.csv"));
    }
}
