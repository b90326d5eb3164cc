//! Search session: drives one trial at a time over the parameter grid.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use gs_types::{internal_error, GsError, GsResult, ParameterSpace, SessionState, TrialFailure, TrialParams};

use crate::comparer::Comparer;
use crate::cursor::{Cursor, IndexValue, RangeIterator};
use crate::logger::{ConsoleLogger, TrialLogger};
use crate::trial::{TrialOutput, TrialRecord};

/// Unique search session identifier.
pub type SessionId = Uuid;

/// The function under test, with its error already lifted into [`GsError`].
pub type Objective<O> = Box<dyn FnMut(&TrialParams) -> GsResult<O>>;

/// Box a fallible closure as an [`Objective`]. Its errors come back out of
/// [`SearchSession::step`] as [`GsError::Trial`] with the original error as
/// the source.
pub fn objective<O, E, F>(mut func: F) -> Objective<O>
where
    F: FnMut(&TrialParams) -> Result<O, E> + 'static,
    E: Into<TrialFailure>,
{
    Box::new(move |params: &TrialParams| func(params).map_err(GsError::trial))
}

/// Builds the index cursor for a parameter space. Every value it yields is a
/// pair `(positional indices, keyword indices)`.
pub(crate) fn build_cursor(space: &ParameterSpace) -> GsResult<Cursor> {
    space.validate()?;

    let positional = Cursor::grid(space.positional.iter().map(Vec::len));
    let keyword = Cursor::grid(space.keyword.iter().map(|axis| axis.values.len()));
    let no_indices = || Some(vec![IndexValue::Tuple(Vec::new())]);

    let cursor = if space.positional.is_empty() {
        Cursor::padded(keyword, no_indices(), None)
    } else if space.keyword.is_empty() {
        Cursor::padded(positional, None, no_indices())
    } else {
        Cursor::product([positional, keyword])
    };
    Ok(cursor)
}

fn split_indices(value: &IndexValue) -> GsResult<(Vec<usize>, Vec<usize>)> {
    if let IndexValue::Tuple(halves) = value {
        if let [positional, keyword] = halves.as_slice() {
            if let (Some(p), Some(k)) = (positional.as_indices(), keyword.as_indices()) {
                return Ok((p, k));
            }
        }
    }
    Err(internal_error!("unexpected index shape: {value:?}"))
}

/// One grid search run.
pub struct SearchSession<O> {
    pub(crate) id: SessionId,
    pub(crate) name: String,
    pub(crate) space: ParameterSpace,
    pub(crate) cursor: Cursor,
    pub(crate) state: SessionState,
    pub(crate) best: Option<TrialRecord<O>>,
    pub(crate) trials_completed: u64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) objective: Objective<O>,
    pub(crate) comparer: Option<Box<dyn Comparer<O>>>,
    pub(crate) logger: Box<dyn TrialLogger<O>>,
}

impl<O: TrialOutput> SearchSession<O> {
    /// Fails with [`GsError::Configuration`] when the space has no axis.
    pub fn new(space: ParameterSpace, objective: Objective<O>) -> GsResult<Self> {
        let cursor = build_cursor(&space)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: "grid_search".to_string(),
            space,
            cursor,
            state: SessionState::Uninitialized,
            best: None,
            trials_completed: 0,
            created_at: Utc::now(),
            objective,
            comparer: None,
            logger: Box::new(ConsoleLogger::new()),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_comparer(mut self, comparer: Box<dyn Comparer<O>>) -> Self {
        self.comparer = Some(comparer);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn TrialLogger<O>>) -> Self {
        self.logger = logger;
        self
    }

    pub fn initialize(&mut self) -> GsResult<()> {
        info!(
            "Initializing session {} ({}) over {:?} trials",
            self.name,
            self.id,
            self.space.grid_size()
        );
        self.state = SessionState::Running;
        self.logger.initialize()?;
        self.cursor.reset();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Runs one trial, or finishes the session when the grid is exhausted.
    ///
    /// Returns the completed trial, or `None` on the finishing step. A failing
    /// function under test aborts the step with [`GsError::Trial`]; the cursor
    /// stays on that trial and best/logger state are left untouched.
    /// The failed trial is retried by the next call to `step`.
    pub fn step(&mut self) -> GsResult<Option<TrialRecord<O>>> {
        if !self.is_running() {
            return Err(GsError::NotRunning { state: self.state });
        }

        let Some(indices) = self.cursor.get() else {
            self.finish()?;
            return Ok(None);
        };

        let (positional, keyword) = split_indices(&indices)?;
        let params = self.space.resolve(&positional, &keyword)?;
        let output = (self.objective)(&params)?;
        self.cursor.advance();

        let record = TrialRecord {
            trial_number: self.trials_completed,
            params,
            output,
        };
        self.trials_completed += 1;
        debug!("Trial {}: {}", record.trial_number, record);

        if let Some(comparer) = &self.comparer {
            let improves = match &self.best {
                None => true,
                Some(best) => comparer.left_better_than_right(&record.output, &best.output),
            };
            if improves {
                self.best = Some(record.clone());
            }
        }

        self.logger.update(&record)?;
        Ok(Some(record))
    }

    fn finish(&mut self) -> GsResult<()> {
        self.state = SessionState::Terminated;
        info!(
            "Session {} finished after {} trials",
            self.name, self.trials_completed
        );
        self.logger.log_best(self.best.as_ref())
    }

    pub fn run_to_completion(&mut self) -> GsResult<()> {
        while self.is_running() {
            self.step()?;
        }
        Ok(())
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn best(&self) -> Option<&TrialRecord<O>> {
        self.best.as_ref()
    }

    pub fn trials_completed(&self) -> u64 {
        self.trials_completed
    }

    pub fn grid_size(&self) -> Option<usize> {
        self.space.grid_size()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
