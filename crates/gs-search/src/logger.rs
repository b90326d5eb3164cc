//! Trial loggers: where every result and the final best are reported.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use gs_types::GsResult;

use crate::trial::{TrialHistory, TrialOutput, TrialRecord};

/// Which logger a session used, recorded in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoggerKind {
    Console { name: String },
    File { name: String, path: PathBuf },
    Custom { name: String },
}

impl LoggerKind {
    /// Rebuild a built-in logger with empty history. `None` for custom kinds.
    pub fn builtin<O: TrialOutput>(&self) -> Option<Box<dyn TrialLogger<O>>> {
        match self {
            Self::Console { name } => Some(Box::new(ConsoleLogger::named(name.clone()))),
            Self::File { name, path } => {
                Some(Box::new(FileLogger::named(path.clone(), name.clone())))
            }
            Self::Custom { .. } => None,
        }
    }
}

/// Sink for trial results.
pub trait TrialLogger<O> {
    /// Called once when a fresh session starts.
    fn initialize(&mut self) -> GsResult<()>;

    /// Called after every completed trial.
    fn update(&mut self, record: &TrialRecord<O>) -> GsResult<()>;

    /// Called once when the enumeration is exhausted. `None` when no
    /// comparer was configured or no trial completed.
    fn log_best(&mut self, best: Option<&TrialRecord<O>>) -> GsResult<()>;

    fn kind(&self) -> LoggerKind;

    /// Accumulated state to carry across a snapshot.
    fn save_state(&self) -> GsResult<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    fn restore_state(&mut self, _state: serde_json::Value) -> GsResult<()> {
        Ok(())
    }
}

fn header_line(name: &str) -> String {
    format!(
        "\n{} starts at {}\n",
        name,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

fn best_line<O: TrialOutput>(best: &TrialRecord<O>) -> String {
    format!("\nBest:\n{best}")
}

fn restore_history<O: TrialOutput>(state: serde_json::Value) -> GsResult<TrialHistory<O>> {
    if state.is_null() {
        return Ok(TrialHistory::new());
    }
    Ok(serde_json::from_value(state)?)
}

// ---- Console ----

/// Prints every trial to stdout and keeps the history in memory.
#[derive(Debug, Clone)]
pub struct ConsoleLogger<O> {
    name: String,
    history: TrialHistory<O>,
}

impl<O> ConsoleLogger<O> {
    pub fn new() -> Self {
        Self::named("Default Logger")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            history: TrialHistory::new(),
        }
    }

    pub fn history(&self) -> &TrialHistory<O> {
        &self.history
    }
}

impl<O> Default for ConsoleLogger<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: TrialOutput> TrialLogger<O> for ConsoleLogger<O> {
    fn initialize(&mut self) -> GsResult<()> {
        self.history.clear();
        println!("{}", header_line(&self.name));
        Ok(())
    }

    fn update(&mut self, record: &TrialRecord<O>) -> GsResult<()> {
        println!("{record}");
        self.history.results.push(record.clone());
        Ok(())
    }

    fn log_best(&mut self, best: Option<&TrialRecord<O>>) -> GsResult<()> {
        if let Some(best) = best {
            println!("{}", best_line(best));
            self.history.best = Some(best.clone());
        }
        Ok(())
    }

    fn kind(&self) -> LoggerKind {
        LoggerKind::Console {
            name: self.name.clone(),
        }
    }

    fn save_state(&self) -> GsResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.history)?)
    }

    fn restore_state(&mut self, state: serde_json::Value) -> GsResult<()> {
        self.history = restore_history(state)?;
        Ok(())
    }
}

// ---- File ----

/// Console output plus one appended line per event in a text file.
#[derive(Debug, Clone)]
pub struct FileLogger<O> {
    name: String,
    path: PathBuf,
    history: TrialHistory<O>,
}

impl<O> FileLogger<O> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::named(path, "Persistent Logger")
    }

    pub fn named(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            history: TrialHistory::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn history(&self) -> &TrialHistory<O> {
        &self.history
    }

    fn append(&self, text: &str) -> GsResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{text}")?;
        Ok(())
    }
}

impl<O: TrialOutput> TrialLogger<O> for FileLogger<O> {
    fn initialize(&mut self) -> GsResult<()> {
        self.history.clear();
        let head = header_line(&self.name);
        println!("{head}");
        self.append(&head)
    }

    fn update(&mut self, record: &TrialRecord<O>) -> GsResult<()> {
        let line = record.to_string();
        println!("{line}");
        self.append(&line)?;
        self.history.results.push(record.clone());
        Ok(())
    }

    fn log_best(&mut self, best: Option<&TrialRecord<O>>) -> GsResult<()> {
        if let Some(best) = best {
            let text = best_line(best);
            println!("{text}");
            self.append(&text)?;
            self.history.best = Some(best.clone());
        }
        Ok(())
    }

    fn kind(&self) -> LoggerKind {
        LoggerKind::File {
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }

    fn save_state(&self) -> GsResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.history)?)
    }

    fn restore_state(&mut self, state: serde_json::Value) -> GsResult<()> {
        self.history = restore_history(state)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_types::{ParamValue, TrialParams};
    use tempfile::tempdir;

    fn record(n: u64, x: i64, output: i64) -> TrialRecord<i64> {
        TrialRecord {
            trial_number: n,
            params: TrialParams {
                positional: vec![ParamValue::Int(x)],
                keyword: Vec::new(),
            },
            output,
        }
    }

    #[test]
    fn console_logger_accumulates_history() {
        let mut logger = ConsoleLogger::new();
        logger.initialize().unwrap();
        logger.update(&record(0, 1, 10)).unwrap();
        logger.update(&record(1, 2, 20)).unwrap();
        logger.log_best(None).unwrap();
        assert_eq!(logger.history().len(), 2);
        assert!(logger.history().best.is_none());

        logger.log_best(Some(&record(1, 2, 20))).unwrap();
        assert_eq!(logger.history().best.as_ref().unwrap().output, 20);

        logger.initialize().unwrap();
        assert!(logger.history().is_empty());
    }

    #[test]
    fn file_logger_appends_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trials.log");

        let mut logger = FileLogger::new(&path);
        logger.initialize().unwrap();
        logger.update(&record(0, 1, 10)).unwrap();
        logger.update(&record(1, 2, 20)).unwrap();
        logger.log_best(Some(&record(1, 2, 20))).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Persistent Logger starts at"));
        assert!(text.contains("(1) : 10\n"));
        assert!(text.contains("(2) : 20\n"));
        assert!(text.contains("\nBest:\n(2) : 20\n"));
    }

    #[test]
    fn file_logger_skips_missing_best() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trials.log");

        let mut logger = FileLogger::<i64>::new(&path);
        logger.initialize().unwrap();
        logger.log_best(None).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("Best:"));
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut logger = ConsoleLogger::named("sweep");
        logger.update(&record(0, 1, 10)).unwrap();
        let state = logger.save_state().unwrap();

        let mut restored = ConsoleLogger::<i64>::named("sweep");
        restored.restore_state(state).unwrap();
        assert_eq!(restored.history(), logger.history());

        restored.restore_state(serde_json::Value::Null).unwrap();
        assert!(restored.history().is_empty());
    }

    #[test]
    fn builtin_kinds_rebuild() {
        let kind = LoggerKind::File {
            name: "night run".into(),
            path: PathBuf::from("/tmp/run.log"),
        };
        let logger = kind.builtin::<f64>().unwrap();
        assert_eq!(logger.kind(), kind);

        let custom = LoggerKind::Custom { name: "db".into() };
        assert!(custom.builtin::<f64>().is_none());
    }
}
