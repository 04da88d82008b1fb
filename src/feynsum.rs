/*!

A symbolic kernel for perturbative quantum field theory.

Expressions are built from field operators ([`Field`]), exact coefficients
([`CNumber`]) and commuting symbols ([`Symbol`]). They live in a single tagged
tree, [`Expr`], whose [`Product`] and [`Sum`] nodes are kept in canonical form
at all times: coefficients are folded, symbols merged, nested products
flattened and equal terms collected.

On top of the normal form sit the two physics engines:

- Wick's theorem ([`Product::wick`]), which turns a product of field operators
  into the signed sum of all its complete pairings into [`Propagator`]s.
- Index contraction ([`Product::contract`]), which glues propagators sharing a
  named index into open chains and closed traces ([`Trace`]).

[`Sum::simplify`] finally merges terms that only differ by caller-supplied
relabelings ([`ExchangeSymmetry`]).

Fields are created through a [`FieldFactory`], which hands out the species ids
that decide which operators contract with which. Every string produced by the
crate goes through [`RenderSettings`].

*/

/// Exact coefficients and commuting symbols
pub mod algebra;

/// Contraction engines: Wick pairings and index traces
pub mod contraction;

/// The canonical expression tree
pub mod expression;

/// Field operators, propagators and their constructors
pub mod qft;

/// Output configuration
pub mod render;

pub mod utils;

pub use algebra::{cnumber::CNumber, symbol::Symbol};
pub use contraction::{trace::Trace, wick::Contraction, ContractionError};
pub use expression::{
    product::Product,
    sum::Sum,
    symmetry::{ExchangeSymmetry, Relabeling},
    Expr, Factor,
};
pub use qft::{
    factory::FieldFactory, field::Field, propagator::Propagator, IndexKind, IndexValue,
    LineStyle, SpeciesId, Statistics,
};
pub use render::{Render, RenderSettings};
