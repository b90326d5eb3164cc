//! File-loadable search configuration.
//!
//! ```
//! use gs_search::SearchConfig;
//!
//! let config = SearchConfig::from_json_str(r#"{
//!     "name": "lr sweep",
//!     "space": {
//!         "positional": [[1, 2, 3]],
//!         "keyword": [{ "name": "lr", "values": [0.1, 0.01] }]
//!     },
//!     "comparer": "less_than",
//!     "snapshot_path": "sweep.snapshot.json"
//! }"#).unwrap();
//!
//! assert_eq!(config.space.grid_size(), Some(6));
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use gs_types::{config_error, GsResult, ParameterSpace};

use crate::comparer::ComparerKind;

fn default_name() -> String {
    "grid_search".to_string()
}

/// Everything the driver needs apart from the function under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub space: ParameterSpace,

    /// Best-result rule; no best is tracked when absent.
    #[serde(default)]
    pub comparer: Option<ComparerKind>,

    /// Append trial lines to this file in addition to the console.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Write a snapshot here after every trial.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Resume from this snapshot; `space`, `comparer` and `log_file` are then
    /// ignored.
    #[serde(default)]
    pub resume_from: Option<PathBuf>,
}

impl SearchConfig {
    pub fn new(space: ParameterSpace) -> Self {
        Self {
            name: default_name(),
            space,
            comparer: None,
            log_file: None,
            snapshot_path: None,
            resume_from: None,
        }
    }

    /// Configuration that only resumes an existing snapshot.
    pub fn resume(path: impl Into<PathBuf>) -> Self {
        Self::new(ParameterSpace::new()).with_resume_from(path)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_comparer(mut self, comparer: ComparerKind) -> Self {
        self.comparer = Some(comparer);
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn with_resume_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.resume_from = Some(path.into());
        self
    }

    pub fn from_json_str(json: &str) -> GsResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> GsResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// A resuming config takes everything but `snapshot_path` from the
    /// snapshot, so only fresh configs are checked.
    pub fn validate(&self) -> GsResult<()> {
        if self.resume_from.is_some() {
            return Ok(());
        }
        if let Some(ComparerKind::Custom { name }) = &self.comparer {
            return Err(config_error!(
                "custom comparer {name} cannot be configured from a file"
            ));
        }
        self.space.validate()
    }
}
