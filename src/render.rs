use std::{fmt::Display, path::Path};

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::qft::IndexKind;

/// How expressions are turned into text.
///
/// `verbose` decides per index kind whether its values are printed next to
/// fields and propagators; kinds missing from the map are printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub latex: bool,
    pub verbose: IndexMap<IndexKind, bool>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            latex: false,
            verbose: [
                IndexKind::Position,
                IndexKind::Spin,
                IndexKind::Lorentz,
                IndexKind::Color,
            ]
            .into_iter()
            .map(|k| (k, true))
            .collect(),
        }
    }
}

impl RenderSettings {
    pub fn latex() -> Self {
        RenderSettings {
            latex: true,
            ..Default::default()
        }
    }

    /// The settings every canonical key is computed with: plain text, every
    /// index shown. Never affected by user configuration.
    pub fn canonical() -> Self {
        RenderSettings {
            latex: false,
            verbose: IndexMap::new(),
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid render settings")
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading render settings from {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn with_verbose(mut self, kind: IndexKind, show: bool) -> Self {
        self.verbose.insert(kind, show);
        self
    }

    pub fn shows(&self, kind: &IndexKind) -> bool {
        self.verbose.get(kind).copied().unwrap_or(true)
    }

    /// A copy that hides the given kinds, used for the inside of a trace.
    pub fn hiding<'a, I: IntoIterator<Item = &'a IndexKind>>(&self, kinds: I) -> Self {
        let mut settings = self.clone();
        for k in kinds {
            settings.verbose.insert(k.clone(), false);
        }
        settings
    }

    /// Separator between the factors of a product.
    pub(crate) fn product_separator(&self) -> &'static str {
        if self.latex {
            r"\,"
        } else {
            " * "
        }
    }
}

pub trait Render {
    fn render(&self, settings: &RenderSettings) -> String;

    fn display<'a>(&'a self, settings: &'a RenderSettings) -> Rendered<'a, Self> {
        Rendered {
            item: self,
            settings,
        }
    }
}

/// A value paired with the settings it should be displayed with.
pub struct Rendered<'a, T: ?Sized> {
    item: &'a T,
    settings: &'a RenderSettings,
}

impl<T: Render + ?Sized> Display for Rendered<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.item.render(self.settings))
    }
}
