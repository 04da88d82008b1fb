use ahash::AHashSet;
use bitvec::vec::BitVec;
use itertools::Itertools;
use log::{debug, trace};
use rayon::prelude::*;

use crate::{
    algebra::cnumber::CNumber,
    expression::{product::Product, sum::Sum, Expr, Factor},
    qft::{field::Field, propagator::Propagator},
};

/// One complete pairing of a list of fields, as positions into that list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contraction {
    pairs: Vec<(usize, usize)>,
    sign: i8,
}

impl Contraction {
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn sign(&self) -> i8 {
        self.sign
    }

    /// The pairs as ordered tuples, sorted. Two contractions with the same
    /// tag produce the same propagators.
    pub fn tag(&self) -> Vec<(usize, usize)> {
        self.pairs
            .iter()
            .map(|&(i, j)| (i.min(j), i.max(j)))
            .sorted()
            .collect()
    }

    pub fn propagators(&self, fields: &[Field]) -> Vec<Propagator> {
        self.pairs
            .iter()
            .map(|&(i, j)| fields[i].contract(&fields[j]))
            .collect()
    }
}

/// All distinct complete contractions of `fields`.
///
/// The pairing always starts from the first unpaired position. A fermionic
/// pair `(i, j)` picks up the statistics sign of every field still unpaired
/// strictly between `i` and `j`. Bosonic pairs and the relative order of the
/// two partners contribute nothing, so `ψ̄ ψ` pairs with `+1` and a closed
/// fermion loop carries no sign of its own. A list that cannot be paired
/// completely, in particular one of odd length, has no contractions.
pub fn contractions(fields: &[Field]) -> Vec<Contraction> {
    if fields.len() % 2 != 0 {
        debug!("{} fields cannot be paired completely", fields.len());
        return vec![];
    }
    let mut search = WickSearch {
        fields,
        seen: AHashSet::new(),
        found: vec![],
        pairs: vec![],
    };
    search.backtrack(BitVec::repeat(true, fields.len()), 1);
    search.found
}

struct WickSearch<'a> {
    fields: &'a [Field],
    seen: AHashSet<Vec<(usize, usize)>>,
    found: Vec<Contraction>,
    pairs: Vec<(usize, usize)>,
}

impl WickSearch<'_> {
    fn backtrack(&mut self, remaining: BitVec, sign: i8) {
        let Some(i) = remaining.first_one() else {
            let c = Contraction {
                pairs: self.pairs.clone(),
                sign,
            };
            if self.seen.insert(c.tag()) {
                trace!("contraction {:?} with sign {}", c.pairs, c.sign);
                self.found.push(c);
            }
            return;
        };

        for j in remaining.iter_ones().skip(1) {
            if !self.fields[i].can_be_contracted(&self.fields[j]) {
                continue;
            }
            let pair_sign: i8 = if self.fields[i].statistics().is_fermion() {
                remaining[i + 1..j]
                    .iter_ones()
                    .map(|k| self.fields[k].statistics().sign())
                    .product()
            } else {
                1
            };

            let mut rest = remaining.clone();
            rest.set(i, false);
            rest.set(j, false);
            self.pairs.push((i, j));
            self.backtrack(rest, sign * pair_sign);
            self.pairs.pop();
        }
    }
}

impl Product {
    /// Replaces the fields of the product by the signed sum of all their
    /// complete contractions.
    ///
    /// Propagators and traces already present are kept in front of the new
    /// propagators. A product without fields is returned as a single term,
    /// one whose fields cannot all be paired gives the empty sum.
    pub fn wick(&self) -> Sum {
        let (fields, carried): (Vec<&Factor>, Vec<&Factor>) = self
            .data()
            .iter()
            .partition(|f| matches!(f, Factor::Field(_)));
        let fields: Vec<Field> = fields
            .into_iter()
            .filter_map(|f| f.clone().try_into_field().ok())
            .collect();

        let found = contractions(&fields);
        debug!(
            "wick: {} contraction(s) of {} field(s)",
            found.len(),
            fields.len()
        );

        let prefactor = self.prefactor();
        Sum::new(found.iter().map(|c| {
            let mut factors = vec![
                Expr::Number(CNumber::from(c.sign())),
                Expr::Product(prefactor.clone()),
            ];
            factors.extend(carried.iter().map(|&f| Expr::from(f.clone())));
            factors.extend(c.propagators(&fields).into_iter().map(Expr::Propagator));
            Expr::Product(Product::new(factors))
        }))
    }
}

impl Sum {
    /// Wick contracts every term, in parallel. The result does not depend on
    /// the number of threads.
    pub fn wick(&self) -> Sum {
        let expanded: Vec<Sum> = self.terms().par_iter().map(Product::wick).collect();
        Sum::new(expanded.into_iter().map(Expr::Sum))
    }
}
