//! Whole-session snapshots for resuming an interrupted search.
//!
//! A snapshot is an explicit, versioned capture of everything a session needs
//! to continue exactly where it stopped: the parameter space, the cursor
//! position, the best trial so far, and the logger's accumulated state. The
//! function under test cannot be captured and is supplied again on restore,
//! together with any comparer or logger that is not a built-in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use gs_types::{snapshot_error, GsResult, ParameterSpace, SessionState};

use crate::comparer::{Comparer, ComparerKind};
use crate::cursor::CursorState;
use crate::logger::{LoggerKind, TrialLogger};
use crate::session::{build_cursor, Objective, SearchSession, SessionId};
use crate::trial::{TrialOutput, TrialRecord};

/// Current on-disk layout. Snapshots with any other version are rejected.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Serializable capture of a [`SearchSession`] between two steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot<O> {
    pub format_version: u32,
    pub session_id: SessionId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    pub state: SessionState,
    pub space: ParameterSpace,
    pub cursor: CursorState,
    pub trials_completed: u64,
    pub best: Option<TrialRecord<O>>,
    pub comparer: Option<ComparerKind>,
    pub logger: LoggerKind,
    pub logger_state: serde_json::Value,
}

impl<O> SessionSnapshot<O>
where
    O: Serialize + for<'de> Deserialize<'de>,
{
    /// Writes JSON to a sibling temporary file, then renames it over `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> GsResult<()> {
        let path = path.as_ref();
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);

        {
            let mut writer = BufWriter::new(File::create(tmp_path)?);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        fs::rename(tmp_path, path)?;
        debug!(
            "Wrote snapshot of session {} after {} trials to {}",
            self.session_id,
            self.trials_completed,
            path.display()
        );
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> GsResult<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let snapshot: Self = serde_json::from_reader(reader)?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(snapshot_error!(
                "{} has format version {}, expected {}",
                path.display(),
                snapshot.format_version,
                SNAPSHOT_FORMAT_VERSION
            ));
        }
        Ok(snapshot)
    }
}

/// Comparer and logger handed back to a restored session.
///
/// A supplied plugin is used only when the snapshot recorded a custom kind or
/// the same kind; anything else is ignored. Missing entries are rebuilt from
/// the kinds recorded in the snapshot.
pub struct Plugins<O> {
    pub comparer: Option<Box<dyn Comparer<O>>>,
    pub logger: Option<Box<dyn TrialLogger<O>>>,
}

impl<O> Default for Plugins<O> {
    fn default() -> Self {
        Self {
            comparer: None,
            logger: None,
        }
    }
}

/// Keeps `supplied` only if it may stand in for the recorded `kind`.
fn accept_supplied<P, K>(
    supplied: Option<Box<P>>,
    kind_of: impl Fn(&P) -> K,
    recorded: &K,
    what: &str,
) -> Option<Box<P>>
where
    P: ?Sized,
    K: Debug + PartialEq + IsCustom,
{
    let supplied = supplied?;
    let kind = kind_of(&*supplied);
    if recorded.is_custom() || kind == *recorded {
        Some(supplied)
    } else {
        warn!("Ignoring supplied {what} {kind:?}; the snapshot recorded {recorded:?}");
        None
    }
}

trait IsCustom {
    fn is_custom(&self) -> bool;
}

impl IsCustom for ComparerKind {
    fn is_custom(&self) -> bool {
        matches!(self, Self::Custom { .. })
    }
}

impl IsCustom for LoggerKind {
    fn is_custom(&self) -> bool {
        matches!(self, Self::Custom { .. })
    }
}

impl<O: TrialOutput> SearchSession<O> {
    /// Capture the session between two steps.
    pub fn snapshot(&self) -> GsResult<SessionSnapshot<O>> {
        Ok(SessionSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            session_id: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
            saved_at: Utc::now(),
            state: self.state,
            space: self.space.clone(),
            cursor: self.cursor.capture(),
            trials_completed: self.trials_completed,
            best: self.best.clone(),
            comparer: self.comparer.as_ref().map(|c| c.kind()),
            logger: self.logger.kind(),
            logger_state: self.logger.save_state()?,
        })
    }

    /// Rebuild a session from a snapshot. The session continues in the
    /// captured state; a running one is not initialized again.
    pub fn restore(
        snapshot: SessionSnapshot<O>,
        objective: Objective<O>,
        plugins: Plugins<O>,
    ) -> GsResult<Self>
    where
        O: PartialOrd,
    {
        let mut cursor = build_cursor(&snapshot.space)?;
        cursor.restore(&snapshot.cursor)?;

        let comparer = match &snapshot.comparer {
            None => {
                if plugins.comparer.is_some() {
                    warn!("Ignoring comparer: the snapshot tracks no best result");
                }
                None
            }
            Some(kind) => Some(
                accept_supplied(plugins.comparer, |c| c.kind(), kind, "comparer")
                    .or_else(|| kind.builtin::<O>())
                    .ok_or_else(|| {
                        snapshot_error!("comparer {kind:?} is not built in and must be supplied")
                    })?,
            ),
        };

        let mut logger = accept_supplied(plugins.logger, |l| l.kind(), &snapshot.logger, "logger")
            .or_else(|| snapshot.logger.builtin::<O>())
            .ok_or_else(|| {
                snapshot_error!(
                    "logger {:?} is not built in and must be supplied",
                    snapshot.logger
                )
            })?;
        logger.restore_state(snapshot.logger_state)?;

        info!(
            "Restored session {} ({}) at trial {} in state {}",
            snapshot.name, snapshot.session_id, snapshot.trials_completed, snapshot.state
        );

        Ok(Self {
            id: snapshot.session_id,
            name: snapshot.name,
            space: snapshot.space,
            cursor,
            state: snapshot.state,
            best: snapshot.best,
            trials_completed: snapshot.trials_completed,
            created_at: snapshot.created_at,
            objective,
            comparer,
            logger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparer::{ComparerFn, GreaterThan};
    use crate::logger::ConsoleLogger;
    use crate::session::objective;
    use gs_types::{GsError, TrialParams};
    use std::convert::Infallible;
    use tempfile::tempdir;

    fn space() -> ParameterSpace {
        ParameterSpace::new()
            .add_positional([1, 2, 3])
            .add_keyword("y", [10, 20])
    }

    fn product() -> Objective<i64> {
        objective(|p: &TrialParams| -> Result<i64, Infallible> {
            let x = p.arg(0).and_then(|v| v.as_i64()).unwrap_or_default();
            let y = p.kwarg("y").and_then(|v| v.as_i64()).unwrap_or_default();
            Ok(x * y)
        })
    }

    fn session() -> SearchSession<i64> {
        SearchSession::new(space(), product())
            .unwrap()
            .with_name("mul")
            .with_comparer(Box::new(GreaterThan))
            .with_logger(Box::new(ConsoleLogger::named("mul log")))
    }

    fn drain(session: &mut SearchSession<i64>) -> Vec<TrialRecord<i64>> {
        let mut records = Vec::new();
        while session.is_running() {
            if let Some(record) = session.step().unwrap() {
                records.push(record);
            }
        }
        records
    }

    #[test]
    fn restored_session_replays_remaining_trials() {
        let mut reference = session();
        reference.initialize().unwrap();
        let all = drain(&mut reference);

        let mut interrupted = session();
        interrupted.initialize().unwrap();
        interrupted.step().unwrap();
        interrupted.step().unwrap();
        interrupted.step().unwrap();
        let snapshot = interrupted.snapshot().unwrap();

        let mut resumed =
            SearchSession::restore(snapshot, product(), Plugins::default()).unwrap();
        assert_eq!(resumed.trials_completed(), 3);
        assert_eq!(resumed.name(), "mul");
        let rest = drain(&mut resumed);

        assert_eq!(rest, all[3..].to_vec());
        assert_eq!(resumed.best(), reference.best());
        assert_eq!(resumed.trials_completed(), 6);
    }

    #[test]
    fn snapshot_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut original = session();
        original.initialize().unwrap();
        original.step().unwrap();
        let snapshot = original.snapshot().unwrap();
        snapshot.write_to(&path).unwrap();

        let loaded = SessionSnapshot::<i64>::read_from(&path).unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.comparer, Some(ComparerKind::GreaterThan));
        assert_eq!(
            loaded.logger,
            LoggerKind::Console {
                name: "mul log".into()
            }
        );
        assert_eq!(loaded.best.as_ref().unwrap().output, 10);
        assert!(!dir.path().join("session.json.tmp").exists());
    }

    #[test]
    fn logger_history_survives_restore() {
        let mut original = session();
        original.initialize().unwrap();
        original.step().unwrap();
        original.step().unwrap();
        let snapshot = original.snapshot().unwrap();

        let history = snapshot.logger_state["results"].as_array().unwrap().len();
        assert_eq!(history, 2);

        let resumed = SearchSession::restore(snapshot, product(), Plugins::default()).unwrap();
        let state = resumed.logger.save_state().unwrap();
        assert_eq!(state["results"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.json");

        let mut snapshot = session().snapshot().unwrap();
        snapshot.format_version = SNAPSHOT_FORMAT_VERSION + 1;
        snapshot.write_to(&path).unwrap();

        let err = SessionSnapshot::<i64>::read_from(&path).unwrap_err();
        assert!(matches!(err, GsError::Snapshot(_)));
    }

    #[test]
    fn custom_comparer_must_be_supplied() {
        let closest = ComparerFn::new("closest", |a: &i64, b: &i64| a.abs() < b.abs());
        let mut original = SearchSession::new(space(), product())
            .unwrap()
            .with_comparer(Box::new(closest));
        original.initialize().unwrap();
        let snapshot = original.snapshot().unwrap();

        let err = SearchSession::restore(snapshot.clone(), product(), Plugins::default())
            .err()
            .unwrap();
        assert!(matches!(err, GsError::Snapshot(_)));

        let plugins = Plugins {
            comparer: Some(Box::new(ComparerFn::new("closest", |a: &i64, b: &i64| {
                a.abs() < b.abs()
            })) as Box<dyn Comparer<i64>>),
            logger: None,
        };
        assert!(SearchSession::restore(snapshot, product(), plugins).is_ok());
    }

    #[test]
    fn terminated_snapshot_stays_terminated() {
        let mut original = session();
        original.initialize().unwrap();
        original.run_to_completion().unwrap();
        let snapshot = original.snapshot().unwrap();
        assert_eq!(snapshot.state, SessionState::Terminated);

        let mut resumed = SearchSession::restore(snapshot, product(), Plugins::default()).unwrap();
        assert!(!resumed.is_running());
        assert!(matches!(resumed.step(), Err(GsError::NotRunning { .. })));
        assert_eq!(resumed.best().unwrap().output, 60);
    }

    #[test]
    fn snapshot_with_foreign_cursor_is_rejected() {
        let mut snapshot = session().snapshot().unwrap();
        snapshot.cursor.pointers.push(0);
        let err = SearchSession::restore(snapshot, product(), Plugins::default())
            .err()
            .unwrap();
        assert!(matches!(err, GsError::Snapshot(_)));
    }
}
