use crate::app_dirs::AppDirs;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of one finished session. Field names follow the on-disk
/// `best_result.json` format (`typingSpeed` etc).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub typing_speed: u32,
    pub accuracy: f64,
    pub timestamp: String,
}

impl Record {
    pub fn new(typing_speed: u32, accuracy: f64) -> Self {
        Self {
            typing_speed,
            accuracy,
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Comparison score: typing speed weighted by accuracy.
    pub fn score(&self) -> f64 {
        self.typing_speed as f64 * (self.accuracy / 100.0)
    }

    /// The all-zero record doubles as the "no record yet" sentinel.
    pub fn is_absent(&self) -> bool {
        self.typing_speed == 0 && self.accuracy == 0.0
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read best result: {0}")]
    Read(#[source] std::io::Error),

    #[error("stored best result is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot write best result: {0}")]
    Write(#[source] std::io::Error),

    #[error("cannot append session history: {0}")]
    History(#[from] csv::Error),
}

/// File-backed store holding the single best session record, plus an
/// append-only CSV history of every finished session.
#[derive(Clone, Debug)]
pub struct ResultStore {
    path: PathBuf,
    history_path: Option<PathBuf>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::best_result_path()
                .unwrap_or_else(|| PathBuf::from("best_result.json")),
            history_path: AppDirs::history_log_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            history_path: None,
        }
    }

    pub fn history<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.history_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Best record so far; the zero record when no file exists yet.
    pub fn load_best(&self) -> Result<Record, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Record::default()),
            Err(err) => return Err(StoreError::Read(err)),
        };

        Ok(serde_json::from_slice(&raw)?)
    }

    /// Persists `candidate` iff it strictly beats the stored score, or no
    /// record exists yet. Returns whether it was written. An unreadable
    /// stored record is treated as absent rather than blocking the save.
    pub fn save_if_better(&self, candidate: &Record) -> Result<bool, StoreError> {
        let best = match self.load_best() {
            Ok(best) => best,
            Err(err) => {
                log::warn!("treating unreadable best result as absent: {err}");
                Record::default()
            }
        };

        if candidate.score() > best.score() || best.is_absent() {
            self.write_record(candidate)?;
            return Ok(true);
        }

        Ok(false)
    }

    // Write to a temp file and rename it into place, so a crash mid-write
    // cannot leave a half-written record readable as the best result.
    fn write_record(&self, record: &Record) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(StoreError::Write)?;
            }
        }

        let data = serde_json::to_vec_pretty(record)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data).map_err(StoreError::Write)?;
        fs::rename(&tmp, &self.path).map_err(StoreError::Write)?;

        Ok(())
    }

    /// Appends one row to the session history log, emitting the header
    /// when the file is first created. A store without a history path
    /// skips this silently.
    pub fn append_history(&self, record: &Record) -> Result<(), StoreError> {
        let Some(path) = &self.history_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(StoreError::Write)?;
            }
        }

        let needs_header = !path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(StoreError::Write)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(["date", "typing_speed", "accuracy", "score"])?;
        }
        let speed = record.typing_speed.to_string();
        let accuracy = format!("{:.2}", record.accuracy);
        let score = format!("{:.2}", record.score());
        writer.write_record([
            record.timestamp.as_str(),
            speed.as_str(),
            accuracy.as_str(),
            score.as_str(),
        ])?;
        writer.flush().map_err(StoreError::Write)?;

        Ok(())
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn record(speed: u32, accuracy: f64) -> Record {
        Record {
            typing_speed: speed,
            accuracy,
            timestamp: "2026-08-05 12:00:00".to_string(),
        }
    }

    #[test]
    fn score_weighs_speed_by_accuracy() {
        assert_eq!(record(50, 90.0).score(), 45.0);
        assert_eq!(record(40, 95.0).score(), 38.0);
        assert_eq!(record(0, 0.0).score(), 0.0);
    }

    #[test]
    fn absent_file_loads_as_zero_record() {
        let dir = tempdir().unwrap();
        let store = ResultStore::with_path(dir.path().join("best_result.json"));

        let best = store.load_best().unwrap();

        assert!(best.is_absent());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best_result.json");
        fs::write(&path, "{broken").unwrap();
        let store = ResultStore::with_path(&path);

        assert_matches!(store.load_best(), Err(StoreError::Parse(_)));
    }

    #[test]
    fn first_result_always_persists() {
        let dir = tempdir().unwrap();
        let store = ResultStore::with_path(dir.path().join("best_result.json"));

        let written = store.save_if_better(&record(50, 90.0)).unwrap();

        assert!(written);
        assert_eq!(store.load_best().unwrap(), record(50, 90.0));
    }

    #[test]
    fn worse_result_leaves_best_intact() {
        let dir = tempdir().unwrap();
        let store = ResultStore::with_path(dir.path().join("best_result.json"));
        store.save_if_better(&record(50, 90.0)).unwrap();

        // score 38 < 45
        let written = store.save_if_better(&record(40, 95.0)).unwrap();

        assert!(!written);
        assert_eq!(store.load_best().unwrap(), record(50, 90.0));
    }

    #[test]
    fn better_result_overwrites() {
        let dir = tempdir().unwrap();
        let store = ResultStore::with_path(dir.path().join("best_result.json"));
        store.save_if_better(&record(40, 95.0)).unwrap();

        let written = store.save_if_better(&record(60, 90.0)).unwrap();

        assert!(written);
        assert_eq!(store.load_best().unwrap().typing_speed, 60);
    }

    #[test]
    fn equal_score_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let store = ResultStore::with_path(dir.path().join("best_result.json"));
        store.save_if_better(&record(50, 90.0)).unwrap();

        let written = store.save_if_better(&record(45, 100.0)).unwrap();

        assert!(!written);
        assert_eq!(store.load_best().unwrap(), record(50, 90.0));
    }

    #[test]
    fn unreadable_best_is_treated_as_absent_on_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best_result.json");
        fs::write(&path, "garbage").unwrap();
        let store = ResultStore::with_path(&path);

        let written = store.save_if_better(&record(10, 50.0)).unwrap();

        assert!(written);
        assert_eq!(store.load_best().unwrap(), record(10, 50.0));
    }

    #[test]
    fn stored_json_uses_original_field_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best_result.json");
        let store = ResultStore::with_path(&path);
        store.save_if_better(&record(50, 90.0)).unwrap();

        let raw = fs::read_to_string(&path).unwrap();

        assert!(raw.contains("\"typingSpeed\""));
        assert!(raw.contains("\"accuracy\""));
        assert!(raw.contains("\"timestamp\""));
        // pretty-printed for human readability
        assert!(raw.contains('\n'));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best_result.json");
        let store = ResultStore::with_path(&path);
        store.save_if_better(&record(50, 90.0)).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn history_rows_accumulate_under_one_header() {
        let dir = tempdir().unwrap();
        let store = ResultStore::with_path(dir.path().join("best_result.json"))
            .history(dir.path().join("history.csv"));

        store.append_history(&record(50, 90.0)).unwrap();
        store.append_history(&record(40, 95.0)).unwrap();

        let raw = fs::read_to_string(dir.path().join("history.csv")).unwrap();
        let lines: Vec<&str> = raw.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "date,typing_speed,accuracy,score");
        assert!(lines[1].contains("50"));
        assert!(lines[2].contains("38.00"));
    }

    #[test]
    fn history_without_path_is_a_noop() {
        let dir = tempdir().unwrap();
        let store = ResultStore::with_path(dir.path().join("best_result.json"));

        assert!(store.append_history(&record(50, 90.0)).is_ok());
    }
}
