use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    expression::symmetry::Relabeling,
    render::{Render, RenderSettings},
};

use super::{
    field::{Field, FieldRole},
    IndexKind, IndexValue, LineStyle,
};

/// Two contracted fields.
///
/// `fx` is the non conjugated endpoint. Contractions of self conjugate fields
/// are symmetric and may be read in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Propagator {
    fx: Field,
    fy: Field,
}

impl Propagator {
    pub(crate) fn new(fx: Field, fy: Field) -> Self {
        Propagator { fx, fy }
    }

    pub fn fx(&self) -> &Field {
        &self.fx
    }

    pub fn fy(&self) -> &Field {
        &self.fy
    }

    pub fn symmetric(&self) -> bool {
        self.fx.is_self_conjugate()
    }

    pub fn linestyle(&self) -> LineStyle {
        self.fx.linestyle()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &IndexKind> {
        self.fx.indices().keys()
    }

    /// The values of `kind` at both ends, read from `fx` to `fy`.
    pub fn endpoints(&self, kind: &IndexKind) -> Option<(&IndexValue, &IndexValue)> {
        Some((self.fx.index(kind)?, self.fy.index(kind)?))
    }

    pub fn index_pairs(&self) -> impl Iterator<Item = (&IndexKind, (&IndexValue, &IndexValue))> {
        self.kinds()
            .filter_map(move |k| self.endpoints(k).map(|pair| (k, pair)))
    }

    /// The same line read from `fy` to `fx`.
    pub fn reversed(&self) -> Propagator {
        Propagator {
            fx: self.fy.clone(),
            fy: self.fx.clone(),
        }
    }

    pub fn relabel(&self, relabeling: &Relabeling) -> Propagator {
        Propagator {
            fx: self.fx.relabel(relabeling),
            fy: self.fy.relabel(relabeling),
        }
    }

    /// Printed form with every index shown, independent of the direction
    /// of symmetric lines.
    pub fn canonical_key(&self) -> String {
        let canonical = RenderSettings::canonical();
        let key = self.render(&canonical);
        if self.symmetric() {
            key.min(self.reversed().render(&canonical))
        } else {
            key
        }
    }
}

impl Render for Propagator {
    fn render(&self, settings: &RenderSettings) -> String {
        let pairs = self
            .index_pairs()
            .filter(|(k, _)| settings.shows(k));

        if self.fx.role() == FieldRole::DiracMatrix {
            let mut mu = None;
            let mut rest = vec![];
            for (k, (a, b)) in pairs {
                if *k == IndexKind::Lorentz && a == b {
                    mu = Some(a);
                } else {
                    rest.push(format!("({a}, {b})"));
                }
            }
            let label = self.fx.label(settings);
            let head = match (mu, settings.latex) {
                (Some(mu), true) => format!("{label}_{{{mu}}}"),
                (Some(mu), false) => format!("{label}_{mu}"),
                (None, _) => label,
            };
            return format!("{head}{}", rest.join(""));
        }

        let head = if settings.latex {
            format!("S_{{{}}}", self.fx.flavor())
        } else {
            format!("S_{}", self.fx.flavor())
        };
        pairs.fold(head, |acc, (_, (a, b))| format!("{acc}({a}, {b})"))
    }
}

impl Display for Propagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&RenderSettings::default()))
    }
}
