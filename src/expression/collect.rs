use indexmap::{map::Entry, IndexMap};
use itertools::Itertools;
use log::debug;
use num::Zero;

use crate::{algebra::cnumber::CNumber, render::Render};

use super::{product::Product, sum::Sum, symmetry::ExchangeSymmetry, Expr, Factor};

/// Merges products that agree up to their numerical coefficient.
///
/// Buckets keep the order in which they were first seen.
#[derive(Debug, Default)]
pub(crate) struct TermCollector {
    buckets: IndexMap<String, (CNumber, Product)>,
}

impl TermCollector {
    pub(crate) fn add(&mut self, term: Product) {
        let (coefficient, rest) = term.split_coefficient();
        match self.buckets.entry(rest.canonical_key()) {
            Entry::Occupied(mut e) => {
                let acc = &mut e.get_mut().0;
                *acc = &*acc + &coefficient;
            }
            Entry::Vacant(e) => {
                e.insert((coefficient, rest));
            }
        }
    }

    pub(crate) fn finish(self) -> Vec<Product> {
        self.buckets
            .into_values()
            .filter(|(c, _)| !c.is_zero())
            .map(|(c, rest)| rest.scaled(&c))
            .collect()
    }
}

struct Bucket {
    prefactors: Vec<Expr>,
    opaque: Product,
    keys: Vec<String>,
}

fn relabeled_keys(data: &[Factor], composition: &[&ExchangeSymmetry]) -> Vec<String> {
    let mut keys: Vec<String> = data
        .iter()
        .map(|f| {
            composition
                .iter()
                .fold(f.clone(), |f, s| s.apply(&f))
                .canonical_key()
        })
        .collect();
    keys.sort();
    keys
}

impl Sum {
    /// Merges terms whose fields, propagators and traces agree after some
    /// composition of the given symmetries, the identity included.
    ///
    /// Merged terms are written as the sum of their prefactors times the
    /// shared opaque part. Calling it again on the result changes nothing.
    pub fn simplify(&self, symmetries: &[ExchangeSymmetry]) -> Sum {
        let compositions: Vec<Vec<&ExchangeSymmetry>> = symmetries.iter().powerset().collect();
        let mut buckets: Vec<Bucket> = vec![];

        for term in self.terms() {
            let opaque = term.opaque();
            let found = buckets.iter_mut().find(|b| {
                b.keys.len() == opaque.data().len()
                    && compositions
                        .iter()
                        .any(|c| relabeled_keys(opaque.data(), c) == b.keys)
            });
            match found {
                Some(b) => b.prefactors.push(Expr::Product(term.prefactor())),
                None => buckets.push(Bucket {
                    prefactors: vec![Expr::Product(term.prefactor())],
                    keys: relabeled_keys(opaque.data(), &[]),
                    opaque,
                }),
            }
        }

        Sum::new(buckets.into_iter().map(|b| {
            let merged = b.prefactors.len();
            let prefactor = Sum::new(b.prefactors);
            debug!(
                "simplify: {merged} term(s) with {} collect into {}",
                b.opaque,
                prefactor.render(&Default::default())
            );
            Expr::Sum(prefactor).concat(Expr::Product(b.opaque))
        }))
    }
}
