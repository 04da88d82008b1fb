use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub mod factory;
pub mod field;
pub mod propagator;

/// The value an index takes on a field, e.g. a position label `x` or a
/// color label `i`.
pub type IndexValue = String;

/// The name of an index slot carried by fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IndexKind {
    Position,
    Spin,
    Color,
    Lorentz,
    Custom(String),
}

impl IndexKind {
    pub fn as_str(&self) -> &str {
        match self {
            IndexKind::Position => "pos",
            IndexKind::Spin => "spin",
            IndexKind::Color => "color",
            IndexKind::Lorentz => "lorentz",
            IndexKind::Custom(name) => name,
        }
    }
}

impl From<&str> for IndexKind {
    fn from(value: &str) -> Self {
        match value {
            "pos" => IndexKind::Position,
            "spin" => IndexKind::Spin,
            "color" => IndexKind::Color,
            "lorentz" => IndexKind::Lorentz,
            other => IndexKind::Custom(other.to_string()),
        }
    }
}

impl From<String> for IndexKind {
    fn from(value: String) -> Self {
        IndexKind::from(value.as_str())
    }
}

impl From<IndexKind> for String {
    fn from(value: IndexKind) -> Self {
        value.as_str().to_string()
    }
}

impl Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies a field type. A field and its conjugate share it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SpeciesId(pub usize);

impl Display for SpeciesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistics {
    Boson,
    Fermion,
}

impl Statistics {
    /// Sign picked up when two operators of this statistics are exchanged.
    pub fn sign(&self) -> i8 {
        match self {
            Statistics::Boson => 1,
            Statistics::Fermion => -1,
        }
    }

    pub fn is_fermion(&self) -> bool {
        matches!(self, Statistics::Fermion)
    }
}

/// Drawing hint carried from a field to its propagators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Squiggle,
    Curly,
}

impl LineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineStyle::Solid => "default",
            LineStyle::Dashed => "dashed",
            LineStyle::Squiggle => "squiggle",
            LineStyle::Curly => "curly",
        }
    }
}
