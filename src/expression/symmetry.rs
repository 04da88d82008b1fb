use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::qft::{IndexKind, IndexValue};

use super::Factor;

/// A renaming of flavors and index values.
///
/// Every lookup reads the unmodified maps, so applying a relabeling is a
/// simultaneous substitution: `swap(a, b)` really exchanges `a` and `b`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relabeling {
    flavors: IndexMap<String, String>,
    indices: IndexMap<IndexKind, IndexMap<IndexValue, IndexValue>>,
}

impl Relabeling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(mut self, kind: IndexKind, from: impl ToString, to: impl ToString) -> Self {
        self.indices
            .entry(kind)
            .or_default()
            .insert(from.to_string(), to.to_string());
        self
    }

    pub fn swap(self, kind: IndexKind, a: impl ToString, b: impl ToString) -> Self {
        let (a, b) = (a.to_string(), b.to_string());
        self.map(kind.clone(), &a, &b).map(kind, b, a)
    }

    pub fn rename_flavor(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.flavors.insert(from.into(), to.into());
        self
    }

    pub fn is_identity(&self) -> bool {
        self.flavors.iter().all(|(a, b)| a == b)
            && self.indices.values().flatten().all(|(a, b)| a == b)
    }

    pub fn index<'a>(&'a self, kind: &IndexKind, value: &'a IndexValue) -> &'a IndexValue {
        self.indices
            .get(kind)
            .and_then(|m| m.get(value))
            .unwrap_or(value)
    }

    pub fn flavor<'a>(&'a self, flavor: &'a str) -> &'a str {
        self.flavors.get(flavor).map_or(flavor, String::as_str)
    }

    /// The relabeling undoing this one. When several values map to the same
    /// target, the last one wins.
    pub fn inverse(&self) -> Relabeling {
        Relabeling {
            flavors: self
                .flavors
                .iter()
                .map(|(a, b)| (b.clone(), a.clone()))
                .collect(),
            indices: self
                .indices
                .iter()
                .map(|(k, m)| {
                    let inv = m.iter().map(|(a, b)| (b.clone(), a.clone())).collect();
                    (k.clone(), inv)
                })
                .collect(),
        }
    }
}

/// An exchange of index values under which the physics is unchanged, e.g.
/// swapping two external positions of a symmetric correlator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeSymmetry {
    relabeling: Relabeling,
}

impl ExchangeSymmetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn swap(mut self, kind: IndexKind, a: impl ToString, b: impl ToString) -> Self {
        self.relabeling = self.relabeling.swap(kind, a, b);
        self
    }

    pub fn relabeling(&self) -> &Relabeling {
        &self.relabeling
    }

    pub fn apply(&self, factor: &Factor) -> Factor {
        factor.relabel(&self.relabeling)
    }
}
