use std::fmt::Display;

use num::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::{
    algebra::{cnumber::CNumber, symbol::Symbol},
    render::{Render, RenderSettings},
};

use super::{sum::Sum, symmetry::Relabeling, Expr, Factor};

/// A product in canonical form.
///
/// The factors are kept in four buckets, printed in this order:
///
/// 1. a single numerical coefficient,
/// 2. symbols, merged by name and sorted,
/// 3. at most one nested [`Sum`] that is not distributed,
/// 4. fields, propagators and traces in the order they were given.
///
/// A product never holds another product, and a zero coefficient empties
/// every other bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    coefficient: CNumber,
    symbols: Vec<Symbol>,
    sum: Option<Sum>,
    data: Vec<Factor>,
}

impl Default for Product {
    fn default() -> Self {
        Product::one()
    }
}

impl Product {
    /// Builds the canonical form of the product of `factors`.
    ///
    /// Several sums among the factors are added together into the nested
    /// sum. A nested sum reducing to zero zeroes the product, one reducing to
    /// a single term is multiplied in.
    pub fn new<I: IntoIterator<Item = Expr>>(factors: I) -> Product {
        let mut numbers = vec![];
        let mut symbols = vec![];
        let mut sums = vec![];
        let mut data = vec![];

        for f in factors {
            match f {
                Expr::Number(c) => numbers.push(c),
                Expr::Symbol(s) => symbols.push(s),
                Expr::Sum(s) => sums.push(Expr::Sum(s)),
                Expr::Field(f) => data.push(Factor::Field(f)),
                Expr::Propagator(p) => data.push(Factor::Propagator(p)),
                Expr::Trace(t) => data.push(Factor::Trace(t)),
                Expr::Product(p) => {
                    numbers.push(p.coefficient);
                    symbols.extend(p.symbols);
                    sums.extend(p.sum.map(Expr::Sum));
                    data.extend(p.data);
                }
            }
        }

        let coefficient = CNumber::reduce(numbers);
        if coefficient.is_zero() {
            return Product::zero();
        }
        let symbols = Symbol::reduce(symbols);
        let sum = (!sums.is_empty()).then(|| Sum::new(sums));

        match sum {
            Some(s) if s.is_empty() => Product::zero(),
            Some(s) if s.len() == 1 => {
                let mut factors = vec![Expr::Number(coefficient)];
                factors.extend(symbols.into_iter().map(Expr::Symbol));
                factors.extend(s.into_terms().into_iter().map(Expr::Product));
                factors.extend(data.into_iter().map(Expr::from));
                Product::new(factors)
            }
            sum => Product {
                coefficient,
                symbols,
                sum,
                data,
            },
        }
    }

    pub fn zero() -> Product {
        Product {
            coefficient: CNumber::zero(),
            symbols: vec![],
            sum: None,
            data: vec![],
        }
    }

    pub fn one() -> Product {
        Product {
            coefficient: CNumber::one(),
            symbols: vec![],
            sum: None,
            data: vec![],
        }
    }

    pub fn coefficient(&self) -> &CNumber {
        &self.coefficient
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn nested_sum(&self) -> Option<&Sum> {
        self.sum.as_ref()
    }

    pub fn data(&self) -> &[Factor] {
        &self.data
    }

    /// The non trivial factors in bucket order. A unit coefficient is left
    /// out, and the zero product has no factors at all.
    pub fn factors(&self) -> Vec<Expr> {
        if self.is_zero() {
            return vec![];
        }
        self.clone().into_factors()
    }

    pub(crate) fn into_factors(self) -> Vec<Expr> {
        let mut factors = vec![];
        if !self.coefficient.is_one() {
            factors.push(Expr::Number(self.coefficient));
        }
        factors.extend(self.symbols.into_iter().map(Expr::Symbol));
        factors.extend(self.sum.map(Expr::Sum));
        factors.extend(self.data.into_iter().map(Expr::from));
        factors
    }

    pub fn size(&self) -> usize {
        self.factors().len()
    }

    /// Coefficient, symbols and nested sum.
    pub fn prefactor(&self) -> Product {
        Product {
            data: vec![],
            ..self.clone()
        }
    }

    /// Fields, propagators and traces, with a unit coefficient.
    pub fn opaque(&self) -> Product {
        Product {
            data: self.data.clone(),
            ..Product::one()
        }
    }

    pub fn is_zero(&self) -> bool {
        self.coefficient.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.coefficient.is_negative()
    }

    pub(crate) fn split_coefficient(&self) -> (CNumber, Product) {
        let rest = Product {
            coefficient: CNumber::one(),
            ..self.clone()
        };
        (self.coefficient.clone(), rest)
    }

    pub(crate) fn scaled(self, factor: &CNumber) -> Product {
        if factor.is_zero() {
            return Product::zero();
        }
        Product {
            coefficient: &self.coefficient * factor,
            ..self
        }
    }

    /// Whether a factor equal to `factor` up to the direction of symmetric
    /// lines and rotations of closed traces appears in the product.
    pub fn contains(&self, factor: &Factor) -> bool {
        let key = factor.canonical_key();
        self.data.iter().any(|f| f.canonical_key() == key)
    }

    /// The key products are collected by.
    ///
    /// Fields keep their relative order, while propagators and traces are
    /// sorted since they commute.
    pub fn canonical_key(&self) -> String {
        if self.is_zero() {
            return "0".into();
        }
        let canonical = RenderSettings::canonical();
        let mut parts = vec![];
        if !self.coefficient.is_one() {
            parts.push(self.coefficient.render(&canonical));
        }
        parts.extend(self.symbols.iter().map(|s| s.render(&canonical)));
        if let Some(s) = &self.sum {
            parts.push(s.canonical_key());
        }

        let (commuting, fields): (Vec<&Factor>, Vec<&Factor>) =
            self.data.iter().partition(|f| f.commutes());
        parts.extend(fields.into_iter().map(Factor::canonical_key));
        let mut commuting: Vec<String> = commuting.into_iter().map(Factor::canonical_key).collect();
        commuting.sort();
        parts.extend(commuting);

        if parts.is_empty() {
            "1".into()
        } else {
            parts.join(" * ")
        }
    }

    pub fn replace(&self, relabeling: &Relabeling) -> Product {
        let mut factors = vec![Expr::Number(self.coefficient.clone())];
        factors.extend(self.symbols.iter().cloned().map(Expr::Symbol));
        factors.extend(self.sum.iter().map(|s| Expr::Sum(s.replace(relabeling))));
        factors.extend(self.data.iter().map(|f| Expr::from(f.relabel(relabeling))));
        Product::new(factors)
    }
}

impl From<Expr> for Product {
    fn from(value: Expr) -> Self {
        match value {
            Expr::Product(p) => p,
            e => Product::new([e]),
        }
    }
}

impl Render for Product {
    fn render(&self, settings: &RenderSettings) -> String {
        if self.is_zero() {
            return "0".into();
        }
        let mut parts: Vec<String> = self.symbols.iter().map(|s| s.render(settings)).collect();
        parts.extend(self.sum.iter().map(|s| s.render(settings)));
        parts.extend(self.data.iter().map(|f| f.render(settings)));
        let sep = settings.product_separator();
        let body = parts.join(sep);

        match (body.is_empty(), &self.coefficient) {
            (true, c) => c.render(settings),
            (false, c) if c.is_one() => body,
            (false, c) if c.is_minus_one() => format!("-{body}"),
            (false, c) => format!("{}{sep}{body}", c.render(settings)),
        }
    }
}

impl Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&RenderSettings::default()))
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use crate::qft::factory::FieldFactory;

    use super::*;

    #[test]
    fn buckets_are_ordered() {
        let mut factory = FieldFactory::new();
        let phi = factory.real_scalar("phi");
        let p = Product::new([
            Expr::Field(phi.at(1)),
            Expr::Symbol(Symbol::new("g")),
            Expr::Number(CNumber::new(1, 2)),
            Expr::Field(phi.at(2)),
            Expr::Symbol(Symbol::new("g")),
            Expr::Number(CNumber::integer(4)),
        ]);
        assert_eq!(p.coefficient(), &CNumber::integer(2));
        assert_eq!(p.symbols(), &[Symbol::with_pow("g", 2)]);
        assert_eq!(p.size(), 4);
        assert_snapshot!(p.to_string(), @"2 * g² * phi(1) * phi(2)");
    }

    #[test]
    fn zero_absorbs() {
        let mut factory = FieldFactory::new();
        let phi = factory.real_scalar("phi");
        let p = Product::new([
            Expr::Symbol(Symbol::new("g")),
            Expr::Number(CNumber::zero()),
            Expr::Field(phi.at(1)),
        ]);
        assert!(p.is_zero());
        assert!(p.factors().is_empty());
        assert_eq!(p.to_string(), "0");
    }

    #[test]
    fn nested_products_flatten() {
        let inner = Product::new([Expr::from(3), Expr::Symbol(Symbol::new("x"))]);
        let outer = Product::new([Expr::Product(inner), Expr::Symbol(Symbol::new("x"))]);
        assert!(outer
            .factors()
            .iter()
            .all(|f| !matches!(f, Expr::Product(_))));
        assert_eq!(outer.to_string(), "3 * x²");
    }

    #[test]
    fn single_term_sums_are_multiplied_in() {
        let x = Expr::Symbol(Symbol::new("x"));
        let single = Sum::new([x.clone(), x.clone()]);
        let p = Product::new([Expr::Sum(single), Expr::Symbol(Symbol::new("y"))]);
        assert!(p.nested_sum().is_none());
        assert_eq!(p.to_string(), "2 * x * y");

        let empty = Sum::new([x.clone(), Expr::from(-1) * x]);
        assert!(Product::new([Expr::Sum(empty), Expr::from(5)]).is_zero());
    }

    #[test]
    fn several_sums_are_added() {
        let x = Expr::Symbol(Symbol::new("x"));
        let y = Expr::Symbol(Symbol::new("y"));
        let a = Sum::new([x.clone(), y.clone()]);
        let b = Sum::new([x, Expr::from(-1) * y]);
        let p = Product::new([Expr::Sum(a), Expr::Sum(b)]);
        assert_eq!(p.to_string(), "2 * x");
    }

    #[test]
    fn prefactor_and_opaque_split() {
        let mut factory = FieldFactory::new();
        let phi = factory.real_scalar("phi");
        let p = Product::new([
            Expr::from(-1),
            Expr::Symbol(Symbol::new("g")),
            Expr::Field(phi.at(1)),
        ]);
        assert!(p.is_negative());
        assert_eq!(p.to_string(), "-g * phi(1)");
        assert_eq!(p.prefactor().to_string(), "-g");
        assert_eq!(p.opaque().to_string(), "phi(1)");
        assert!(p.contains(&Factor::Field(phi.at(1))));
        assert!(!p.contains(&Factor::Field(phi.at(2))));
    }

    #[test]
    fn latex_rendering() {
        let p = Product::new([Expr::Number(CNumber::new(-1, 2)), Expr::Symbol(Symbol::with_pow("g", 2))]);
        assert_eq!(p.render(&RenderSettings::latex()), r"-\frac{1}{2}\,g^{2}");
    }
}
