use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Running,
    Terminated,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Uninitialized
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Uninitialized => "uninitialized",
            Self::Running => "running",
            Self::Terminated => "terminated",
        };
        f.write_str(label)
    }
}
