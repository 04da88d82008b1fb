use std::{
    fmt::Display,
    iter::{Product, Sum},
    ops::{Add, Mul, Neg, Sub},
};

use duplicate::duplicate;
use num::{complex::Complex64, BigInt, BigRational, One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::render::{Render, RenderSettings};

use super::SNAP_TOLERANCE;

/// A numerical coefficient.
///
/// Exact rationals are kept in lowest terms with a positive denominator.
/// As soon as a floating point or complex value enters the arithmetic the
/// result becomes inexact, but every component lying within
/// [`SNAP_TOLERANCE`] of an integer is rounded to it, and a value whose
/// components are all integral is turned back into an exact one. Term
/// collection compares coefficients through their printed form, so this keeps
/// `0.1 + 0.2 - 0.3` from surviving as a spurious non zero term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CNumber(Value);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Value {
    Exact(BigRational),
    Inexact(Complex64),
}

fn snap_component(x: f64) -> f64 {
    let rounded = x.round();
    if (x - rounded).abs() <= SNAP_TOLERANCE {
        rounded
    } else {
        x
    }
}

impl CNumber {
    /// The reduced fraction `numerator / denominator`.
    ///
    /// # Panics
    ///
    /// Panics if the denominator is zero.
    pub fn new(numerator: i64, denominator: i64) -> Self {
        assert!(denominator != 0, "denominator cannot be zero");
        CNumber(Value::Exact(BigRational::new(
            numerator.into(),
            denominator.into(),
        )))
    }

    pub fn integer(n: i64) -> Self {
        CNumber(Value::Exact(BigRational::from_integer(n.into())))
    }

    pub fn from_ratio(ratio: BigRational) -> Self {
        CNumber(Value::Exact(ratio))
    }

    pub fn from_f64(x: f64) -> Self {
        Self::complex(x, 0.)
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Self::snap(Complex64::new(re, im))
    }

    fn snap(z: Complex64) -> Self {
        let re = snap_component(z.re);
        let im = snap_component(z.im);
        if im == 0. && re.fract() == 0. {
            if let Some(exact) = BigRational::from_float(re) {
                return CNumber(Value::Exact(exact));
            }
        }
        CNumber(Value::Inexact(Complex64::new(re, im)))
    }

    pub fn is_exact(&self) -> bool {
        matches!(self.0, Value::Exact(_))
    }

    /// The rational value, if the number is exact.
    pub fn as_ratio(&self) -> Option<&BigRational> {
        match &self.0 {
            Value::Exact(r) => Some(r),
            Value::Inexact(_) => None,
        }
    }

    pub fn numerator(&self) -> Option<BigInt> {
        self.as_ratio().map(|r| r.numer().clone())
    }

    pub fn denominator(&self) -> Option<BigInt> {
        self.as_ratio().map(|r| r.denom().clone())
    }

    pub fn to_complex(&self) -> Complex64 {
        match &self.0 {
            Value::Exact(r) => Complex64::new(r.to_f64().unwrap_or(f64::NAN), 0.),
            Value::Inexact(z) => *z,
        }
    }

    /// Only real numbers can be negative; a complex value never is.
    pub fn is_negative(&self) -> bool {
        match &self.0 {
            Value::Exact(r) => r.is_negative(),
            Value::Inexact(z) => z.im == 0. && z.re < 0.,
        }
    }

    pub fn is_minus_one(&self) -> bool {
        (-self.clone()).is_one()
    }

    /// Magnitude of a real number; complex values are returned unchanged.
    pub fn abs(&self) -> CNumber {
        if self.is_negative() {
            -self.clone()
        } else {
            self.clone()
        }
    }

    /// Folds a list of coefficients into their product, one for an empty list.
    pub fn reduce<I: IntoIterator<Item = CNumber>>(numbers: I) -> CNumber {
        numbers.into_iter().product()
    }
}

impl Zero for CNumber {
    fn zero() -> Self {
        CNumber(Value::Exact(BigRational::zero()))
    }

    fn is_zero(&self) -> bool {
        match &self.0 {
            Value::Exact(r) => r.is_zero(),
            Value::Inexact(z) => z.is_zero(),
        }
    }
}

impl One for CNumber {
    fn one() -> Self {
        CNumber(Value::Exact(BigRational::one()))
    }

    fn is_one(&self) -> bool {
        match &self.0 {
            Value::Exact(r) => r.is_one(),
            Value::Inexact(_) => false,
        }
    }
}

impl Add<&CNumber> for &CNumber {
    type Output = CNumber;
    fn add(self, rhs: &CNumber) -> CNumber {
        match (&self.0, &rhs.0) {
            (Value::Exact(a), Value::Exact(b)) => CNumber(Value::Exact(a + b)),
            _ => CNumber::snap(self.to_complex() + rhs.to_complex()),
        }
    }
}

impl Mul<&CNumber> for &CNumber {
    type Output = CNumber;
    fn mul(self, rhs: &CNumber) -> CNumber {
        match (&self.0, &rhs.0) {
            (Value::Exact(a), Value::Exact(b)) => CNumber(Value::Exact(a * b)),
            _ => CNumber::snap(self.to_complex() * rhs.to_complex()),
        }
    }
}

impl Sub<&CNumber> for &CNumber {
    type Output = CNumber;
    fn sub(self, rhs: &CNumber) -> CNumber {
        self + &(-rhs.clone())
    }
}

duplicate! {
    [op_trait op_fn;
    [Add] [add];
    [Mul] [mul];
    [Sub] [sub];
    ]
    impl op_trait for CNumber {
        type Output = CNumber;
        fn op_fn(self, rhs: CNumber) -> CNumber {
            (&self).op_fn(&rhs)
        }
    }
}

impl Neg for CNumber {
    type Output = CNumber;
    fn neg(self) -> CNumber {
        match self.0 {
            Value::Exact(r) => CNumber(Value::Exact(-r)),
            Value::Inexact(z) => CNumber::snap(-z),
        }
    }
}

impl Product for CNumber {
    fn product<I: Iterator<Item = CNumber>>(iter: I) -> Self {
        iter.fold(CNumber::one(), |acc, c| acc * c)
    }
}

impl Sum for CNumber {
    fn sum<I: Iterator<Item = CNumber>>(iter: I) -> Self {
        iter.fold(CNumber::zero(), |acc, c| acc + c)
    }
}

duplicate! {
    [int; [i8]; [i16]; [i32]; [i64]; [u8]; [u16]; [u32];]
    impl From<int> for CNumber {
        fn from(value: int) -> Self {
            CNumber::integer(value as i64)
        }
    }
}

impl From<f64> for CNumber {
    fn from(value: f64) -> Self {
        CNumber::from_f64(value)
    }
}

impl From<Complex64> for CNumber {
    fn from(value: Complex64) -> Self {
        CNumber::snap(value)
    }
}

impl From<BigRational> for CNumber {
    fn from(value: BigRational) -> Self {
        CNumber::from_ratio(value)
    }
}

impl Render for CNumber {
    fn render(&self, settings: &RenderSettings) -> String {
        match &self.0 {
            Value::Exact(r) if r.is_integer() => r.numer().to_string(),
            Value::Exact(r) => {
                if settings.latex {
                    let sign = if r.is_negative() { "-" } else { "" };
                    format!(r"{sign}\frac{{{}}}{{{}}}", r.numer().abs(), r.denom())
                } else {
                    format!("{}/{}", r.numer(), r.denom())
                }
            }
            Value::Inexact(z) if z.im == 0. => z.re.to_string(),
            Value::Inexact(z) => format!("({}{:+}i)", z.re, z.im),
        }
    }
}

impl Display for CNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&RenderSettings::default()))
    }
}
