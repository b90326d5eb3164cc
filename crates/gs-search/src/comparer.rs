//! Best-result comparison rules.

use serde::{Deserialize, Serialize};

/// Which comparison rule a session used, recorded in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparerKind {
    GreaterThan,
    LessThan,
    Custom { name: String },
}

impl ComparerKind {
    /// Rebuild a built-in comparer. `None` for custom kinds.
    pub fn builtin<O>(&self) -> Option<Box<dyn Comparer<O>>>
    where
        O: PartialOrd + 'static,
    {
        match self {
            Self::GreaterThan => Some(Box::new(GreaterThan)),
            Self::LessThan => Some(Box::new(LessThan)),
            Self::Custom { .. } => None,
        }
    }
}

/// Decides whether a candidate output beats the current best.
pub trait Comparer<O> {
    /// Strict: ties keep the current best.
    fn left_better_than_right(&self, left: &O, right: &O) -> bool;

    fn kind(&self) -> ComparerKind;
}

/// Larger output wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GreaterThan;

impl<O: PartialOrd> Comparer<O> for GreaterThan {
    fn left_better_than_right(&self, left: &O, right: &O) -> bool {
        left > right
    }

    fn kind(&self) -> ComparerKind {
        ComparerKind::GreaterThan
    }
}

/// Smaller output wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessThan;

impl<O: PartialOrd> Comparer<O> for LessThan {
    fn left_better_than_right(&self, left: &O, right: &O) -> bool {
        left < right
    }

    fn kind(&self) -> ComparerKind {
        ComparerKind::LessThan
    }
}

/// A named closure used as a comparer.
pub struct ComparerFn<F> {
    name: String,
    better: F,
}

impl<F> ComparerFn<F> {
    pub fn new(name: impl Into<String>, better: F) -> Self {
        Self {
            name: name.into(),
            better,
        }
    }
}

impl<O, F> Comparer<O> for ComparerFn<F>
where
    F: Fn(&O, &O) -> bool,
{
    fn left_better_than_right(&self, left: &O, right: &O) -> bool {
        (self.better)(left, right)
    }

    fn kind(&self) -> ComparerKind {
        ComparerKind::Custom {
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greater_than_is_strict() {
        let cmp = GreaterThan;
        assert!(cmp.left_better_than_right(&2.0, &1.0));
        assert!(!cmp.left_better_than_right(&1.0, &1.0));
        assert!(!cmp.left_better_than_right(&0, &1));
    }

    #[test]
    fn less_than_prefers_smaller() {
        let cmp = LessThan;
        assert!(cmp.left_better_than_right(&-3, &1));
        assert!(!cmp.left_better_than_right(&1, &1));
    }

    #[test]
    fn closure_comparer_reports_custom_kind() {
        let cmp = ComparerFn::new("closest_to_zero", |a: &i64, b: &i64| a.abs() < b.abs());
        assert!(cmp.left_better_than_right(&-1, &5));
        assert_eq!(
            Comparer::<i64>::kind(&cmp),
            ComparerKind::Custom {
                name: "closest_to_zero".into()
            }
        );
    }

    #[test]
    fn builtin_kinds_rebuild() {
        let rebuilt = ComparerKind::LessThan.builtin::<i64>().unwrap();
        assert!(rebuilt.left_better_than_right(&1, &2));
        assert_eq!(rebuilt.kind(), ComparerKind::LessThan);

        let custom = ComparerKind::Custom { name: "x".into() };
        assert!(custom.builtin::<i64>().is_none());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ComparerKind::GreaterThan).unwrap();
        assert_eq!(json, "\"greater_than\"");
        let back: ComparerKind = serde_json::from_str(r#"{"custom":{"name":"f1"}}"#).unwrap();
        assert_eq!(back, ComparerKind::Custom { name: "f1".into() });
    }
}
