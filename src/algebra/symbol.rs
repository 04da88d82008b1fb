use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    render::{Render, RenderSettings},
    utils::to_superscript,
};

/// A commuting variable raised to an integer power.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    name: String,
    pow: i64,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol::with_pow(name, 1)
    }

    pub fn with_pow(name: impl Into<String>, pow: i64) -> Self {
        Symbol {
            name: name.into(),
            pow,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pow(&self) -> i64 {
        self.pow
    }

    /// Merges symbols of equal name by adding their exponents.
    ///
    /// Symbols whose exponents cancel are dropped, and the result is sorted by
    /// its printed form.
    pub fn reduce<I: IntoIterator<Item = Symbol>>(symbols: I) -> Vec<Symbol> {
        let mut powers: IndexMap<String, i64> = IndexMap::new();
        for s in symbols {
            *powers.entry(s.name).or_insert(0) += s.pow;
        }

        let canonical = RenderSettings::canonical();
        let mut reduced: Vec<Symbol> = powers
            .into_iter()
            .filter(|(_, pow)| *pow != 0)
            .map(|(name, pow)| Symbol { name, pow })
            .collect();
        reduced.sort_by_cached_key(|s| s.render(&canonical));
        reduced
    }
}

impl Render for Symbol {
    fn render(&self, settings: &RenderSettings) -> String {
        match self.pow {
            1 => self.name.clone(),
            p if settings.latex => format!("{}^{{{p}}}", self.name),
            p => format!("{}{}", self.name, to_superscript(p as isize)),
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&RenderSettings::default()))
    }
}
