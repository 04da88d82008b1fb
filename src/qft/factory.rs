use crate::{
    expression::{product::Product, Expr},
    utils::to_subscript,
};

use super::{
    field::{Field, FieldRole},
    IndexKind, IndexValue, LineStyle, SpeciesId, Statistics,
};

/// Allocates species ids and fresh dummy variables.
///
/// Every constructor call creates a new species, so two calls with the same
/// flavor name still give fields that never contract with each other.
#[derive(Debug, Default)]
pub struct FieldFactory {
    species: usize,
    variables: usize,
}

impl FieldFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_species(&mut self) -> SpeciesId {
        self.species += 1;
        SpeciesId(self.species)
    }

    /// A fresh integration variable `x₁`, `x₂`, ...
    pub fn variable(&mut self) -> IndexValue {
        self.variables += 1;
        format!("x{}", to_subscript(self.variables as isize))
    }

    pub fn real_scalar(&mut self, flavor: impl Into<String>) -> RealScalar {
        RealScalar {
            species: self.next_species(),
            flavor: flavor.into(),
        }
    }

    pub fn complex_scalar(&mut self, flavor: impl Into<String>) -> ComplexScalar {
        ComplexScalar {
            species: self.next_species(),
            flavor: flavor.into(),
        }
    }

    pub fn spinor(&mut self, flavor: impl Into<String>) -> Spinor {
        Spinor {
            species: self.next_species(),
            flavor: flavor.into(),
        }
    }

    pub fn quark(&mut self, flavor: impl Into<String>) -> Quark {
        Quark {
            species: self.next_species(),
            flavor: flavor.into(),
        }
    }

    pub fn photon(&mut self) -> Photon {
        Photon {
            species: self.next_species(),
        }
    }

    /// The matrix `γ^μ_{ab}` as a pair of legs. Wick contraction joins the
    /// legs into a single line carrying the spin indices `a` and `b`.
    pub fn dirac_gamma(&mut self, mu: impl ToString, a: impl ToString, b: impl ToString) -> Product {
        let species = self.next_species();
        let mu = mu.to_string();
        let leg = |anti: bool, spin: String| {
            Field::new(species, "G", Statistics::Boson)
                .with_role(FieldRole::DiracMatrix)
                .anti(anti)
                .with_index(IndexKind::Lorentz, &mu)
                .with_index(IndexKind::Spin, spin)
        };
        Product::new([
            Expr::Field(leg(false, a.to_string())),
            Expr::Field(leg(true, b.to_string())),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct RealScalar {
    species: SpeciesId,
    flavor: String,
}

impl RealScalar {
    pub fn at(&self, pos: impl ToString) -> Field {
        Field::new(self.species, &self.flavor, Statistics::Boson)
            .self_conjugate()
            .with_index(IndexKind::Position, pos)
    }
}

#[derive(Debug, Clone)]
pub struct ComplexScalar {
    species: SpeciesId,
    flavor: String,
}

impl ComplexScalar {
    pub fn at(&self, pos: impl ToString) -> Field {
        Field::new(self.species, &self.flavor, Statistics::Boson).with_index(IndexKind::Position, pos)
    }

    pub fn dagger(&self, pos: impl ToString) -> Field {
        self.at(pos).anti(true)
    }
}

#[derive(Debug, Clone)]
pub struct Photon {
    species: SpeciesId,
}

impl Photon {
    pub fn at(&self, pos: impl ToString, mu: impl ToString) -> Field {
        Field::new(self.species, "A", Statistics::Boson)
            .self_conjugate()
            .with_linestyle(LineStyle::Squiggle)
            .with_index(IndexKind::Position, pos)
            .with_index(IndexKind::Lorentz, mu)
    }
}

#[derive(Debug, Clone)]
pub struct Spinor {
    species: SpeciesId,
    flavor: String,
}

impl Spinor {
    pub fn psi(&self, pos: impl ToString, spin: impl ToString) -> Field {
        Field::new(self.species, &self.flavor, Statistics::Fermion)
            .with_index(IndexKind::Position, pos)
            .with_index(IndexKind::Spin, spin)
    }

    pub fn psibar(&self, pos: impl ToString, spin: impl ToString) -> Field {
        self.psi(pos, spin).anti(true)
    }
}

#[derive(Debug, Clone)]
pub struct Quark {
    species: SpeciesId,
    flavor: String,
}

impl Quark {
    pub fn psi(&self, pos: impl ToString, spin: impl ToString, color: impl ToString) -> Field {
        Field::new(self.species, &self.flavor, Statistics::Fermion)
            .with_index(IndexKind::Position, pos)
            .with_index(IndexKind::Spin, spin)
            .with_index(IndexKind::Color, color)
    }

    pub fn psibar(&self, pos: impl ToString, spin: impl ToString, color: impl ToString) -> Field {
        self.psi(pos, spin, color).anti(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_are_fresh() {
        let mut factory = FieldFactory::new();
        let a = factory.real_scalar("phi");
        let b = factory.real_scalar("phi");
        assert!(!a.at(1).can_be_contracted(&b.at(2)));
        assert!(a.at(1).can_be_contracted(&a.at(2)));
    }

    #[test]
    fn variables_are_fresh() {
        let mut factory = FieldFactory::new();
        assert_eq!(factory.variable(), "x₁");
        assert_eq!(factory.variable(), "x₂");
    }

    #[test]
    fn conjugate_pairs() {
        let mut factory = FieldFactory::new();
        let phi = factory.complex_scalar("phi");
        assert!(!phi.at(1).can_be_contracted(&phi.at(2)));
        assert!(phi.at(1).can_be_contracted(&phi.dagger(2)));
        assert_eq!(phi.dagger(2).to_string(), "phi†(2)");

        let q = factory.quark("q");
        assert!(q.psi(1, "a", "i").can_be_contracted(&q.psibar(2, "b", "j")));
        assert!(!factory.spinor("e").psi(1, "a").can_be_contracted(&q.psibar(2, "b", "j")));
    }

    #[test]
    fn photon_lines_are_squiggly() {
        let mut factory = FieldFactory::new();
        let a = factory.photon();
        let p = a.at(1, "mu").contract(&a.at(2, "nu"));
        assert_eq!(p.linestyle(), LineStyle::Squiggle);
        assert!(p.symmetric());
    }
}
