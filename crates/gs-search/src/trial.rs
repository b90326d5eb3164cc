//! Trial records and the accumulated result history.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use gs_types::TrialParams;

/// Requirements on the output of a function under test: it is logged, kept
/// as the best result, and written into snapshots.
pub trait TrialOutput: Clone + fmt::Display + Serialize + DeserializeOwned + 'static {}

impl<T> TrialOutput for T where T: Clone + fmt::Display + Serialize + DeserializeOwned + 'static {}

/// One completed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord<O> {
    /// Zero-based position in enumeration order.
    pub trial_number: u64,
    pub params: TrialParams,
    pub output: O,
}

impl<O: fmt::Display> fmt::Display for TrialRecord<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.params, self.output)
    }
}

/// Everything a logger has seen so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialHistory<O> {
    pub results: Vec<TrialRecord<O>>,
    pub best: Option<TrialRecord<O>>,
}

impl<O> TrialHistory<O> {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            best: None,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn clear(&mut self) {
        self.results.clear();
        self.best = None;
    }
}

impl<O> Default for TrialHistory<O> {
    fn default() -> Self {
        Self::new()
    }
}
