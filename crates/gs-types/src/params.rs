//! Parameter values, parameter spaces, and resolved trial parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::GsResult;
use crate::{config_error, internal_error};

/// A concrete candidate value for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Json(serde_json::Value),
}

impl ParamValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

/// Candidate values for one keyword parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordAxis {
    pub name: String,
    pub values: Vec<ParamValue>,
}

/// The full search space: positional axes in call order plus keyword axes in
/// insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterSpace {
    #[serde(default)]
    pub positional: Vec<Vec<ParamValue>>,
    #[serde(default)]
    pub keyword: Vec<KeywordAxis>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_positional<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.positional
            .push(values.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a keyword axis. A second axis with the same name replaces the
    /// first one in place.
    pub fn add_keyword<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        let name = name.into();
        let values: Vec<ParamValue> = values.into_iter().map(Into::into).collect();
        match self.keyword.iter_mut().find(|axis| axis.name == name) {
            Some(axis) => axis.values = values,
            None => self.keyword.push(KeywordAxis { name, values }),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Number of varying axes, positional and keyword together.
    pub fn axis_count(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    /// Total number of trials. `Some(0)` when there is no axis at all or any
    /// axis is empty, `None` on overflow.
    pub fn grid_size(&self) -> Option<usize> {
        if self.is_empty() {
            return Some(0);
        }
        let mut total: usize = 1;
        let lengths = self
            .positional
            .iter()
            .map(Vec::len)
            .chain(self.keyword.iter().map(|axis| axis.values.len()));
        for len in lengths {
            total = total.checked_mul(len)?;
        }
        Some(total)
    }

    pub fn validate(&self) -> GsResult<()> {
        if self.is_empty() {
            return Err(config_error!("no parameter to iterate with"));
        }
        for (i, axis) in self.keyword.iter().enumerate() {
            if self.keyword[..i].iter().any(|other| other.name == axis.name) {
                return Err(config_error!("duplicate keyword parameter: {}", axis.name));
            }
        }
        Ok(())
    }

    /// Map one index per axis to the concrete candidate values.
    pub fn resolve(&self, positional: &[usize], keyword: &[usize]) -> GsResult<TrialParams> {
        if positional.len() != self.positional.len() || keyword.len() != self.keyword.len() {
            return Err(internal_error!(
                "index shape ({}, {}) does not match parameter space ({}, {})",
                positional.len(),
                keyword.len(),
                self.positional.len(),
                self.keyword.len()
            ));
        }

        let positional = self
            .positional
            .iter()
            .zip(positional)
            .map(|(values, &i)| {
                values
                    .get(i)
                    .cloned()
                    .ok_or_else(|| internal_error!("positional index {i} out of range"))
            })
            .collect::<GsResult<Vec<_>>>()?;

        let keyword = self
            .keyword
            .iter()
            .zip(keyword)
            .map(|(axis, &i)| {
                axis.values
                    .get(i)
                    .map(|v| (axis.name.clone(), v.clone()))
                    .ok_or_else(|| internal_error!("index {i} out of range for {}", axis.name))
            })
            .collect::<GsResult<Vec<_>>>()?;

        Ok(TrialParams {
            positional,
            keyword,
        })
    }
}

/// Concrete arguments for one trial.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrialParams {
    pub positional: Vec<ParamValue>,
    pub keyword: Vec<(String, ParamValue)>,
}

impl TrialParams {
    /// Positional argument `index`.
    pub fn arg(&self, index: usize) -> Option<&ParamValue> {
        self.positional.get(index)
    }

    /// Keyword argument `name`.
    pub fn kwarg(&self, name: &str) -> Option<&ParamValue> {
        self.keyword
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for TrialParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut first = true;
        for value in &self.positional {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
            first = false;
        }
        for (name, value) in &self.keyword {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
            first = false;
        }
        write!(f, ")")
    }
}
