use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    expression::symmetry::Relabeling,
    render::{Render, RenderSettings},
};

use super::{propagator::Propagator, IndexKind, IndexValue, LineStyle, SpeciesId, Statistics};

/// What a field stands for when it is printed after contraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldRole {
    #[default]
    Operator,
    /// One leg of a Dirac matrix; two contracted legs print as `γ`.
    DiracMatrix,
}

/// An atomic field operator.
///
/// A field and its conjugate share a [`SpeciesId`] and differ in `anti`.
/// Self conjugate fields (real scalars, photons) contract with any field of
/// the same species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    species: SpeciesId,
    flavor: String,
    anti: bool,
    self_conjugate: bool,
    statistics: Statistics,
    role: FieldRole,
    linestyle: LineStyle,
    indices: IndexMap<IndexKind, IndexValue>,
}

impl Field {
    pub fn new(species: SpeciesId, flavor: impl Into<String>, statistics: Statistics) -> Self {
        Field {
            species,
            flavor: flavor.into(),
            anti: false,
            self_conjugate: false,
            statistics,
            role: FieldRole::Operator,
            linestyle: LineStyle::Solid,
            indices: IndexMap::new(),
        }
    }

    pub fn anti(mut self, anti: bool) -> Self {
        self.anti = anti;
        self
    }

    pub fn self_conjugate(mut self) -> Self {
        self.self_conjugate = true;
        self
    }

    pub fn with_role(mut self, role: FieldRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_linestyle(mut self, linestyle: LineStyle) -> Self {
        self.linestyle = linestyle;
        self
    }

    pub fn with_index(mut self, kind: IndexKind, value: impl ToString) -> Self {
        self.indices.insert(kind, value.to_string());
        self
    }

    /// The same operator with the conjugation flag flipped.
    pub fn conjugate(&self) -> Self {
        let mut f = self.clone();
        f.anti = !f.anti;
        f
    }

    pub fn species(&self) -> SpeciesId {
        self.species
    }

    pub fn flavor(&self) -> &str {
        &self.flavor
    }

    pub fn is_anti(&self) -> bool {
        self.anti
    }

    pub fn is_self_conjugate(&self) -> bool {
        self.self_conjugate
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    pub fn role(&self) -> FieldRole {
        self.role
    }

    pub fn linestyle(&self) -> LineStyle {
        self.linestyle
    }

    pub fn index(&self, kind: &IndexKind) -> Option<&IndexValue> {
        self.indices.get(kind)
    }

    pub fn indices(&self) -> &IndexMap<IndexKind, IndexValue> {
        &self.indices
    }

    fn same_kinds(&self, other: &Field) -> bool {
        self.indices.len() == other.indices.len()
            && self.indices.keys().all(|k| other.indices.contains_key(k))
    }

    pub fn can_be_contracted(&self, other: &Field) -> bool {
        self.species == other.species
            && self.same_kinds(other)
            && (self.self_conjugate || self.anti != other.anti)
    }

    /// Contracts two fields into a propagator running from the non conjugated
    /// field to the conjugated one.
    ///
    /// # Panics
    ///
    /// Panics if the fields cannot be contracted.
    pub fn contract(&self, other: &Field) -> Propagator {
        assert!(
            self.can_be_contracted(other),
            "cannot contract {self} with {other}"
        );
        if self.anti && !other.anti {
            Propagator::new(other.clone(), self.clone())
        } else {
            Propagator::new(self.clone(), other.clone())
        }
    }

    pub fn relabel(&self, relabeling: &Relabeling) -> Field {
        Field {
            flavor: relabeling.flavor(&self.flavor).to_string(),
            indices: self
                .indices
                .iter()
                .map(|(k, v)| (k.clone(), relabeling.index(k, v).clone()))
                .collect(),
            ..self.clone()
        }
    }

    /// The printed name, with a dagger or a bar when conjugated.
    pub(crate) fn label(&self, settings: &RenderSettings) -> String {
        if self.role == FieldRole::DiracMatrix {
            return if settings.latex { r"\gamma" } else { "gamma" }.to_string();
        }
        if !self.anti || self.self_conjugate {
            return self.flavor.clone();
        }
        match (self.statistics, settings.latex) {
            (Statistics::Boson, true) => format!(r"{{{}}}^\dagger", self.flavor),
            (Statistics::Boson, false) => format!("{}†", self.flavor),
            (Statistics::Fermion, true) => format!(r"\bar{{{}}}", self.flavor),
            (Statistics::Fermion, false) => format!("{}bar", self.flavor),
        }
    }
}

impl Render for Field {
    fn render(&self, settings: &RenderSettings) -> String {
        let shown: Vec<&str> = self
            .indices
            .iter()
            .filter(|(k, _)| settings.shows(k))
            .map(|(_, v)| v.as_str())
            .collect();
        let label = self.label(settings);
        if shown.is_empty() {
            label
        } else {
            format!("{label}({})", shown.join(", "))
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&RenderSettings::default()))
    }
}
