use thiserror::Error;

use crate::state::SessionState;

/// Boxed error raised by a function under test.
pub type TrialFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the GridStep system
#[derive(Error, Debug)]
pub enum GsError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Session is not running (state: {state}); initialization needed")]
    NotRunning { state: SessionState },

    #[error("Trial failed: {0}")]
    Trial(#[source] TrialFailure),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GsError {
    /// Wrap an error returned by the function under test.
    pub fn trial<E>(error: E) -> Self
    where
        E: Into<TrialFailure>,
    {
        GsError::Trial(error.into())
    }

    /// The original error of a failed trial, if this is one.
    pub fn trial_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            GsError::Trial(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias for GridStep operations
pub type GsResult<T> = Result<T, GsError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::GsError::Configuration(format!($($arg)*))
    };
}

/// Macro for creating snapshot errors
#[macro_export]
macro_rules! snapshot_error {
    ($($arg:tt)*) => {
        $crate::GsError::Snapshot(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::GsError::Internal(format!($($arg)*))
    };
}
