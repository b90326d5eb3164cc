//! Top-level entry point: build or restore a session and run it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use gs_types::{config_error, GsResult, ParameterSpace, SessionState, TrialFailure, TrialParams};

use crate::comparer::Comparer;
use crate::config::SearchConfig;
use crate::logger::{FileLogger, TrialLogger};
use crate::session::{objective, Objective, SearchSession, SessionId};
use crate::snapshot::{Plugins, SessionSnapshot};
use crate::trial::{TrialOutput, TrialRecord};

/// What a finished (or resumed-and-finished) run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome<O> {
    pub session_id: SessionId,
    pub name: String,
    pub state: SessionState,
    pub trials_completed: u64,
    pub best: Option<TrialRecord<O>>,
}

/// Grid search builder.
///
/// Without a snapshot path the session runs straight through. With one, a
/// snapshot is written after every step so an interrupted run can be picked
/// up again with [`GridSearch::resume_from`].
pub struct GridSearch<O> {
    name: String,
    space: ParameterSpace,
    comparer: Option<Box<dyn Comparer<O>>>,
    logger: Option<Box<dyn TrialLogger<O>>>,
    snapshot_path: Option<PathBuf>,
    resume_from: Option<PathBuf>,
}

impl<O: TrialOutput + PartialOrd> GridSearch<O> {
    pub fn new(space: ParameterSpace) -> Self {
        Self {
            name: "grid_search".to_string(),
            space,
            comparer: None,
            logger: None,
            snapshot_path: None,
            resume_from: None,
        }
    }

    /// Resume-only search; the space comes from the snapshot.
    pub fn resume(path: impl Into<PathBuf>) -> Self {
        Self::new(ParameterSpace::new()).resume_from(path)
    }

    pub fn from_config(config: SearchConfig) -> GsResult<Self> {
        config.validate()?;
        let mut search = Self::new(config.space).name(config.name);
        search.snapshot_path = config.snapshot_path;

        if let Some(path) = config.resume_from {
            // Plugins are rebuilt from the snapshot.
            return Ok(search.resume_from(path));
        }

        if let Some(kind) = config.comparer {
            let comparer = kind
                .builtin::<O>()
                .ok_or_else(|| config_error!("comparer {kind:?} is not built in"))?;
            search.comparer = Some(comparer);
        }
        if let Some(path) = config.log_file {
            search.logger = Some(Box::new(FileLogger::new(path)));
        }
        Ok(search)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn comparer(mut self, comparer: impl Comparer<O> + 'static) -> Self {
        self.comparer = Some(Box::new(comparer));
        self
    }

    pub fn logger(mut self, logger: impl TrialLogger<O> + 'static) -> Self {
        self.logger = Some(Box::new(logger));
        self
    }

    pub fn snapshot_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Continue the session stored at `path`. Space, name, comparer and
    /// logger come from the snapshot. Plugins set on this builder are only
    /// used to stand in for custom kinds or for an identical recorded kind.
    pub fn resume_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.resume_from = Some(path.into());
        self
    }

    pub fn run<F, E>(self, func: F) -> GsResult<SearchOutcome<O>>
    where
        F: FnMut(&TrialParams) -> Result<O, E> + 'static,
        E: Into<TrialFailure>,
    {
        self.run_objective(objective(func))
    }

    pub fn run_objective(self, objective: Objective<O>) -> GsResult<SearchOutcome<O>> {
        let Self {
            name,
            space,
            comparer,
            logger,
            snapshot_path,
            resume_from,
        } = self;

        let mut session = match resume_from {
            Some(path) => {
                let snapshot = SessionSnapshot::read_from(&path)?;
                let mut session =
                    SearchSession::restore(snapshot, objective, Plugins { comparer, logger })?;
                match session.state() {
                    SessionState::Uninitialized => session.initialize()?,
                    SessionState::Terminated => {
                        warn!("Snapshot {} is already terminated", path.display())
                    }
                    SessionState::Running => {}
                }
                session
            }
            None => {
                let mut session = SearchSession::new(space, objective)?.with_name(name);
                if let Some(comparer) = comparer {
                    session = session.with_comparer(comparer);
                }
                if let Some(logger) = logger {
                    session = session.with_logger(logger);
                }
                session.initialize()?;
                session
            }
        };

        match &snapshot_path {
            None => session.run_to_completion()?,
            Some(path) => {
                info!("Writing a snapshot after every trial to {}", path.display());
                while session.is_running() {
                    session.step()?;
                    session.snapshot()?.write_to(path)?;
                }
            }
        }

        Ok(SearchOutcome {
            session_id: session.id(),
            name: session.name().to_string(),
            state: session.state(),
            trials_completed: session.trials_completed(),
            best: session.best().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparer::{ComparerKind, GreaterThan};
    use gs_types::GsError;
    use std::convert::Infallible;
    use tempfile::tempdir;

    fn sum(p: &TrialParams) -> Result<i64, Infallible> {
        Ok(p.positional.iter().filter_map(|v| v.as_i64()).sum())
    }

    #[test]
    fn runs_straight_through() {
        let outcome = GridSearch::<i64>::new(ParameterSpace::new().add_positional([1, 2]))
            .comparer(GreaterThan)
            .run(sum)
            .unwrap();
        assert_eq!(outcome.trials_completed, 2);
        assert_eq!(outcome.state, SessionState::Terminated);
        assert_eq!(outcome.best.unwrap().output, 2);
    }

    #[test]
    fn empty_space_fails_fast() {
        let err = GridSearch::<i64>::new(ParameterSpace::new()).run(sum).unwrap_err();
        assert!(matches!(err, GsError::Configuration(_)));
    }

    #[test]
    fn missing_resume_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = GridSearch::<i64>::resume(dir.path().join("absent.json"))
            .run(sum)
            .unwrap_err();
        assert!(matches!(err, GsError::Io(_)));
    }

    #[test]
    fn snapshot_mode_leaves_terminated_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");

        let outcome = GridSearch::<i64>::new(ParameterSpace::new().add_positional([4, 1, 7]))
            .name("three")
            .comparer(GreaterThan)
            .snapshot_to(&path)
            .run(sum)
            .unwrap();
        assert_eq!(outcome.best.as_ref().unwrap().output, 7);

        let snapshot = SessionSnapshot::<i64>::read_from(&path).unwrap();
        assert_eq!(snapshot.state, SessionState::Terminated);
        assert_eq!(snapshot.trials_completed, 3);
        assert_eq!(snapshot.name, "three");
        assert_eq!(snapshot.session_id, outcome.session_id);
    }

    #[test]
    fn from_config_builds_plugins() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("trials.log");
        let config = SearchConfig::new(ParameterSpace::new().add_positional([3, 5]))
            .with_name("cfg")
            .with_comparer(ComparerKind::LessThan)
            .with_log_file(&log);

        let outcome = GridSearch::from_config(config).unwrap().run(sum).unwrap();
        assert_eq!(outcome.name, "cfg");
        assert_eq!(outcome.best.unwrap().output, 3);

        let text = std::fs::read_to_string(&log).unwrap();
        assert!(text.contains("(3) : 3"));
        assert!(text.contains("(5) : 5"));
        assert!(text.contains("Best:\n(3) : 3"));
    }
}
