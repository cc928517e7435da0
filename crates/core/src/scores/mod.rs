//! Leaderboard store: unique-by-name integer counters with ranked retrieval.
//!
//! The backing format is a headerless CSV file with one `name,count` record
//! per line. Loading is forgiving (bad records are skipped and logged) because
//! the file is hand-editable; see [`ScoreFile`] for the locked
//! read-modify-write cycle used by request handlers.

mod file;

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::errors::ScoreStoreError;

pub use file::{Readiness, ScoreFile};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreEntry {
    pub name: String,
    pub count: i64,
}

impl ScoreEntry {
    pub fn new(name: impl Into<String>, count: i64) -> Self {
        Self { name: name.into(), count }
    }
}

impl fmt::Display for ScoreEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.count)
    }
}

/// Result of parsing a score source. `error` is set when an I/O failure cut
/// the read short; `leaderboard` then holds whatever was read before it.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub leaderboard: Leaderboard,
    pub skipped: usize,
    pub error: Option<ScoreStoreError>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ScoreEntry> {
        self.find(name).map(|index| &self.entries[index])
    }

    pub fn set(&mut self, name: &str, count: i64) -> ScoreEntry {
        self.apply(name, count, |_| count)
    }

    pub fn increment(&mut self, name: &str) -> ScoreEntry {
        self.apply(name, 1, |current| current.saturating_add(1))
    }

    pub fn decrement(&mut self, name: &str) -> ScoreEntry {
        self.apply(name, -1, |current| current.saturating_sub(1))
    }

    /// Highest `n` entries by count, descending. Returns fewer than `n` when
    /// the board is smaller; the board itself keeps its insertion order.
    pub fn top(&self, n: usize) -> Vec<ScoreEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|left, right| right.count.cmp(&left.count));
        ranked.truncate(n);
        ranked
    }

    fn apply(&mut self, name: &str, initial: i64, update: impl FnOnce(i64) -> i64) -> ScoreEntry {
        match self.find(name) {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.count = update(entry.count);
                entry.clone()
            }
            None => {
                let entry = ScoreEntry::new(name, initial);
                self.entries.push(entry.clone());
                entry
            }
        }
    }

    /// Parses `name,count` records. Malformed records are skipped; an I/O
    /// error stops the read and is reported alongside the partial board.
    pub fn read_from<R: Read>(reader: R) -> LoadReport {
        let mut report = LoadReport::default();
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        for result in csv_reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(error) if error.is_io_error() => {
                    warn!(
                        event_name = "scores.load.aborted",
                        error = %error,
                        loaded = report.leaderboard.len(),
                        "score source read failed; keeping records read so far"
                    );
                    report.error = Some(ScoreStoreError::Read(error));
                    break;
                }
                Err(error) => {
                    warn!(
                        event_name = "scores.load.skipped_record",
                        error = %error,
                        "skipping unreadable score record"
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            let line = record.position().map(|position| position.line()).unwrap_or_default();
            match parse_record(&record) {
                Some((name, count)) => {
                    report.leaderboard.set(name, count);
                }
                None => {
                    warn!(
                        event_name = "scores.load.skipped_record",
                        line,
                        fields = record.len(),
                        "skipping malformed score record"
                    );
                    report.skipped += 1;
                }
            }
        }

        report
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        for entry in &self.entries {
            csv_writer.write_record([entry.name.as_str(), entry.count.to_string().as_str()])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn try_load(path: &Path) -> Result<LoadReport, ScoreStoreError> {
        let file = File::open(path)
            .map_err(|source| ScoreStoreError::Open { path: path.to_path_buf(), source })?;
        Ok(Self::read_from(io::BufReader::new(file)))
    }

    /// Loads the board at `path`, falling back to an empty board when the
    /// file cannot be opened. Failures are logged only.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(report) => {
                if report.skipped > 0 {
                    warn!(
                        event_name = "scores.load.partial",
                        path = %path.display(),
                        skipped = report.skipped,
                        loaded = report.leaderboard.len(),
                        "score file contained malformed records"
                    );
                }
                report.leaderboard
            }
            Err(error) if error.is_not_found() => {
                info!(
                    event_name = "scores.load.missing",
                    path = %path.display(),
                    "score file does not exist yet; starting empty"
                );
                Self::new()
            }
            Err(error) => {
                warn!(
                    event_name = "scores.load.failed",
                    path = %path.display(),
                    error = %error,
                    "score file could not be opened; starting empty"
                );
                Self::new()
            }
        }
    }

    /// Overwrites `path` with the board in its current order.
    pub fn save(&self, path: &Path) -> Result<(), ScoreStoreError> {
        let file = File::create(path)
            .map_err(|source| ScoreStoreError::Open { path: path.to_path_buf(), source })?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
            .map_err(|source| ScoreStoreError::Write { path: path.to_path_buf(), source })?;
        writer
            .flush()
            .map_err(|source| ScoreStoreError::Flush { path: path.to_path_buf(), source })
    }
}

fn parse_record(record: &csv::StringRecord) -> Option<(&str, i64)> {
    if record.len() != 2 {
        return None;
    }
    let name = record.get(0)?;
    if name.is_empty() {
        return None;
    }
    let count = record.get(1)?.parse::<i64>().ok()?;
    Some((name, count))
}
