//! # gs-search
//!
//! Resumable exhaustive grid search for GridStep.
//!
//! Walks the Cartesian product of positional and keyword parameter lists in a
//! fixed odometer order, calls the function under test once per combination,
//! keeps the best result under a pluggable comparer, reports every trial to a
//! pluggable logger, and can snapshot the whole session after each trial so an
//! interrupted search picks up exactly where it stopped.

mod comparer;
mod config;
mod cursor;
mod driver;
mod logger;
mod session;
mod snapshot;
mod trial;

pub use comparer::{Comparer, ComparerFn, ComparerKind, GreaterThan, LessThan};
pub use config::SearchConfig;
pub use cursor::{
    AxisCounter, Cursor, CursorState, IndexValue, PaddedCursor, ProductCursor, RangeIterator,
};
pub use driver::{GridSearch, SearchOutcome};
pub use logger::{ConsoleLogger, FileLogger, LoggerKind, TrialLogger};
pub use session::{objective, Objective, SearchSession, SessionId};
pub use snapshot::{Plugins, SessionSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use trial::{TrialHistory, TrialOutput, TrialRecord};

pub use gs_types::{GsError, GsResult, ParamValue, ParameterSpace, SessionState, TrialParams};
