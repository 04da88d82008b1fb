use std::{
    fmt::Display,
    ops::{Add, Mul, Neg, Sub},
};

use derive_more::From;
use duplicate::duplicate;
use enum_try_as_inner::EnumTryAsInner;
use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::{
    algebra::{cnumber::CNumber, symbol::Symbol},
    contraction::{trace::Trace, ContractionError},
    qft::{field::Field, propagator::Propagator, IndexKind},
    render::{Render, RenderSettings},
};

use self::{product::Product, sum::Sum, symmetry::ExchangeSymmetry, symmetry::Relabeling};

pub mod collect;
pub mod product;
pub mod sum;
pub mod symmetry;

/// Any node of an expression tree.
///
/// Products and sums are always stored in canonical form, see
/// [`Product::new`] and [`Sum::new`].
#[derive(Debug, Clone, PartialEq, EnumTryAsInner, Serialize, Deserialize, From)]
#[derive_err(Debug)]
pub enum Expr {
    Number(CNumber),
    Symbol(Symbol),
    Field(Field),
    Propagator(Propagator),
    Trace(Trace),
    Product(Product),
    Sum(Sum),
}

/// The non commuting, non numerical part of a product.
#[derive(Debug, Clone, PartialEq, EnumTryAsInner, Serialize, Deserialize, From)]
#[derive_err(Debug)]
pub enum Factor {
    Field(Field),
    Propagator(Propagator),
    Trace(Trace),
}

impl Factor {
    pub fn relabel(&self, relabeling: &Relabeling) -> Factor {
        match self {
            Factor::Field(f) => Factor::Field(f.relabel(relabeling)),
            Factor::Propagator(p) => Factor::Propagator(p.relabel(relabeling)),
            Factor::Trace(t) => Factor::Trace(t.relabel(relabeling)),
        }
    }

    /// Printed form under [`RenderSettings::canonical`], insensitive to the
    /// direction of symmetric lines and to the rotation of closed traces.
    pub fn canonical_key(&self) -> String {
        match self {
            Factor::Field(f) => f.render(&RenderSettings::canonical()),
            Factor::Propagator(p) => p.canonical_key(),
            Factor::Trace(t) => t.canonical_key(),
        }
    }

    /// Propagators commute with everything, and so do traces built from them.
    pub fn commutes(&self) -> bool {
        !matches!(self, Factor::Field(_))
    }

    /// Every propagator in the factor, looking inside traces.
    pub fn propagators(&self) -> Vec<&Propagator> {
        match self {
            Factor::Field(_) => vec![],
            Factor::Propagator(p) => vec![p],
            Factor::Trace(t) => t.links().iter().flat_map(Factor::propagators).collect(),
        }
    }
}

impl Render for Factor {
    fn render(&self, settings: &RenderSettings) -> String {
        match self {
            Factor::Field(f) => f.render(settings),
            Factor::Propagator(p) => p.render(settings),
            Factor::Trace(t) => t.render(settings),
        }
    }
}

impl From<Factor> for Expr {
    fn from(value: Factor) -> Self {
        match value {
            Factor::Field(f) => Expr::Field(f),
            Factor::Propagator(p) => Expr::Propagator(p),
            Factor::Trace(t) => Expr::Trace(t),
        }
    }
}

duplicate! {
    [int; [i32]; [i64];]
    impl From<int> for Expr {
        fn from(value: int) -> Self {
            Expr::Number(CNumber::integer(value as i64))
        }
    }
}

impl Expr {
    pub fn zero() -> Expr {
        Expr::Product(Product::zero())
    }

    pub fn one() -> Expr {
        Expr::Product(Product::one())
    }

    fn into_factor_list(self) -> Vec<Expr> {
        match self {
            Expr::Product(p) => p.into_factors(),
            e => vec![e],
        }
    }

    fn into_term_list(self) -> Vec<Expr> {
        match self {
            Expr::Sum(s) => s.into_terms().into_iter().map(Expr::Product).collect(),
            e => vec![e],
        }
    }

    /// Multiplication without distributing over sums: a sum on either side
    /// ends up as the nested sum of the product.
    pub fn concat(self, rhs: impl Into<Expr>) -> Expr {
        let factors = self
            .into_factor_list()
            .into_iter()
            .chain(rhs.into().into_factor_list());
        Expr::Product(Product::new(factors))
    }

    /// `self` multiplied with itself `n` times; `pow(0)` is one.
    pub fn pow(&self, n: u32) -> Expr {
        (0..n).fold(Expr::one(), |acc, _| acc * self.clone())
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Expr::Number(c) => c.is_negative(),
            Expr::Product(p) => p.is_negative(),
            _ => false,
        }
    }

    /// Applies Wick's theorem to every product in the expression.
    pub fn wick(&self) -> Expr {
        match self {
            Expr::Product(p) => Expr::Sum(p.wick()),
            Expr::Sum(s) => Expr::Sum(s.wick()),
            Expr::Field(_) => Expr::Sum(Product::from(self.clone()).wick()),
            other => other.clone(),
        }
    }

    /// Glues propagators along the given index kinds, see [`Product::contract`].
    pub fn contract(&self, kinds: &[IndexKind]) -> Result<Expr, ContractionError> {
        Ok(match self {
            Expr::Product(p) => Expr::Product(p.contract(kinds)?),
            Expr::Sum(s) => Expr::Sum(s.contract(kinds)?),
            Expr::Propagator(_) | Expr::Trace(_) => {
                Expr::Product(Product::from(self.clone()).contract(kinds)?)
            }
            other => other.clone(),
        })
    }

    pub fn replace(&self, relabeling: &Relabeling) -> Expr {
        match self {
            Expr::Number(_) | Expr::Symbol(_) => self.clone(),
            Expr::Field(f) => Expr::Field(f.relabel(relabeling)),
            Expr::Propagator(p) => Expr::Propagator(p.relabel(relabeling)),
            Expr::Trace(t) => Expr::Trace(t.relabel(relabeling)),
            Expr::Product(p) => Expr::Product(p.replace(relabeling)),
            Expr::Sum(s) => Expr::Sum(s.replace(relabeling)),
        }
    }

    pub fn simplify(&self, symmetries: &[ExchangeSymmetry]) -> Sum {
        match self {
            Expr::Sum(s) => s.simplify(symmetries),
            other => Sum::new([other.clone()]).simplify(symmetries),
        }
    }
}

impl<T: Into<Expr>> Add<T> for Expr {
    type Output = Expr;
    fn add(self, rhs: T) -> Expr {
        Expr::Sum(Sum::new([self, rhs.into()]))
    }
}

impl<T: Into<Expr>> Sub<T> for Expr {
    type Output = Expr;
    fn sub(self, rhs: T) -> Expr {
        self + (-rhs.into())
    }
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::from(-1) * self
    }
}

impl<T: Into<Expr>> Mul<T> for Expr {
    type Output = Expr;
    fn mul(self, rhs: T) -> Expr {
        let rhs = rhs.into();
        if matches!(self, Expr::Sum(_)) || matches!(rhs, Expr::Sum(_)) {
            let terms = iproduct!(self.into_term_list(), rhs.into_term_list())
                .map(|(a, b)| a.concat(b));
            Expr::Sum(Sum::new(terms))
        } else {
            self.concat(rhs)
        }
    }
}

duplicate! {
    [lhs; [Symbol]; [Field]; [Propagator]; [Trace]; [Product]; [Sum];]
    impl<T: Into<Expr>> Mul<T> for lhs {
        type Output = Expr;
        fn mul(self, rhs: T) -> Expr {
            Expr::from(self) * rhs
        }
    }

    impl<T: Into<Expr>> Add<T> for lhs {
        type Output = Expr;
        fn add(self, rhs: T) -> Expr {
            Expr::from(self) + rhs
        }
    }
}

impl Render for Expr {
    fn render(&self, settings: &RenderSettings) -> String {
        match self {
            Expr::Number(c) => c.render(settings),
            Expr::Symbol(s) => s.render(settings),
            Expr::Field(f) => f.render(settings),
            Expr::Propagator(p) => p.render(settings),
            Expr::Trace(t) => t.render(settings),
            Expr::Product(p) => p.render(settings),
            Expr::Sum(s) => s.render(settings),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&RenderSettings::default()))
    }
}
