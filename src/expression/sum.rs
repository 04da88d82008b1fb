use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::render::{Render, RenderSettings};

use super::{collect::TermCollector, product::Product, symmetry::Relabeling, Expr};

/// A sum of products in canonical form: nested sums are flattened and terms
/// equal up to their coefficient are merged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sum {
    terms: Vec<Product>,
}

impl Sum {
    pub fn new<I: IntoIterator<Item = Expr>>(terms: I) -> Sum {
        let mut collector = TermCollector::default();
        for t in terms {
            match t {
                Expr::Sum(s) => s.terms.into_iter().for_each(|p| collector.add(p)),
                e => collector.add(Product::from(e)),
            }
        }
        Sum {
            terms: collector.finish(),
        }
    }

    pub fn zero() -> Sum {
        Sum::default()
    }

    pub fn terms(&self) -> &[Product] {
        &self.terms
    }

    pub fn into_terms(self) -> Vec<Product> {
        self.terms
    }

    pub fn elements(&self) -> impl Iterator<Item = &Product> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn replace(&self, relabeling: &Relabeling) -> Sum {
        Sum::new(
            self.terms
                .iter()
                .map(|t| Expr::Product(t.replace(relabeling))),
        )
    }

    /// Term keys sorted, so that the key does not depend on term order.
    pub fn canonical_key(&self) -> String {
        let mut keys: Vec<String> = self.terms.iter().map(Product::canonical_key).collect();
        keys.sort();
        format!("( {} )", keys.join(" + "))
    }
}

impl Render for Sum {
    fn render(&self, settings: &RenderSettings) -> String {
        if self.terms.is_empty() {
            return "0".into();
        }
        let body: Vec<String> = self
            .terms
            .iter()
            .map(|t| {
                let s = t.render(settings);
                if t.is_negative() {
                    s
                } else {
                    format!("+{s}")
                }
            })
            .collect();
        format!("( {} )", body.join(" "))
    }
}

impl Display for Sum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&RenderSettings::default()))
    }
}
