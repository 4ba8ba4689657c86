//! Rational functions over GF(2), kept in lowest terms.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use super::BinaryPolynomial;
use crate::error::{Error, Result};

/// A fraction `numerator / denominator` of binary polynomials.
///
/// The fraction is reduced on construction, and zero is always represented as
/// `0 / 1`, so two fractions are equal exactly when their parts are equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BinaryPolynomialFraction {
    numerator: BinaryPolynomial,
    denominator: BinaryPolynomial,
}

impl BinaryPolynomialFraction {
    /// Creates a reduced fraction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DivisionByZero`] if the denominator is zero.
    pub fn new(numerator: BinaryPolynomial, denominator: BinaryPolynomial) -> Result<Self> {
        if denominator.is_zero() {
            return Err(Error::DivisionByZero(
                "fraction with zero denominator".into(),
            ));
        }
        if numerator.is_zero() {
            return Ok(Self::from(BinaryPolynomial::zero()));
        }
        let g = numerator.gcd(&denominator);
        let (numerator, _) = numerator.div_rem(&g)?;
        let (denominator, _) = denominator.div_rem(&g)?;
        Ok(Self { numerator, denominator })
    }

    /// Numerator in lowest terms.
    pub fn numerator(&self) -> &BinaryPolynomial {
        &self.numerator
    }

    /// Denominator in lowest terms.
    pub fn denominator(&self) -> &BinaryPolynomial {
        &self.denominator
    }

    /// Returns true if the fraction is a polynomial (denominator 1).
    pub fn is_polynomial(&self) -> bool {
        self.denominator.is_one()
    }

    /// Multiplicative inverse.
    pub fn inverse(&self) -> Result<Self> {
        Self::new(self.denominator.clone(), self.numerator.clone())
    }

    /// Division by another fraction.
    pub fn checked_div(&self, rhs: &Self) -> Result<Self> {
        Ok(self * &rhs.inverse()?)
    }

    /// First `length` coefficients of the formal power series expansion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the denominator has no constant
    /// term, since the expansion would then need negative powers.
    pub fn power_series(&self, length: usize) -> Result<Vec<u8>> {
        if self.denominator.coefficient(0) == 0 {
            return Err(Error::InvalidParameter(format!(
                "fraction {} has no power series expansion (denominator divisible by x)",
                self
            )));
        }
        let taps: Vec<usize> = (1..=self.denominator.degree().max(0) as usize)
            .filter(|&j| self.denominator.coefficient(j) == 1)
            .collect();
        let mut series = Vec::with_capacity(length);
        for t in 0..length {
            let mut s = self.numerator.coefficient(t);
            for &j in taps.iter().take_while(|&&j| j <= t) {
                s ^= series[t - j];
            }
            series.push(s);
        }
        Ok(series)
    }
}

impl From<BinaryPolynomial> for BinaryPolynomialFraction {
    fn from(p: BinaryPolynomial) -> Self {
        Self {
            numerator: p,
            denominator: BinaryPolynomial::one(),
        }
    }
}

fn reduce(numerator: BinaryPolynomial, denominator: BinaryPolynomial) -> BinaryPolynomialFraction {
    // Both operators below only build nonzero denominators.
    BinaryPolynomialFraction::new(numerator.clone(), denominator).unwrap_or_else(|_| {
        BinaryPolynomialFraction::from(numerator)
    })
}

impl Add for &BinaryPolynomialFraction {
    type Output = BinaryPolynomialFraction;

    fn add(self, rhs: &BinaryPolynomialFraction) -> BinaryPolynomialFraction {
        let numerator = &(&self.numerator * &rhs.denominator) + &(&rhs.numerator * &self.denominator);
        reduce(numerator, &self.denominator * &rhs.denominator)
    }
}

impl Sub for &BinaryPolynomialFraction {
    type Output = BinaryPolynomialFraction;

    fn sub(self, rhs: &BinaryPolynomialFraction) -> BinaryPolynomialFraction {
        self + rhs
    }
}

impl Mul for &BinaryPolynomialFraction {
    type Output = BinaryPolynomialFraction;

    fn mul(self, rhs: &BinaryPolynomialFraction) -> BinaryPolynomialFraction {
        reduce(
            &self.numerator * &rhs.numerator,
            &self.denominator * &rhs.denominator,
        )
    }
}

impl fmt::Display for BinaryPolynomialFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_polynomial() {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl fmt::Debug for BinaryPolynomialFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryPolynomialFraction({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: u64) -> BinaryPolynomial {
        BinaryPolynomial::from_u64(v)
    }

    #[test]
    fn test_reduction() {
        // (x^2 + 1) / (x + 1) = x + 1
        let f = BinaryPolynomialFraction::new(p(0b101), p(0b11)).unwrap();
        assert!(f.is_polynomial());
        assert_eq!(f.numerator(), &p(0b11));
        let zero = BinaryPolynomialFraction::new(BinaryPolynomial::zero(), p(0b111)).unwrap();
        assert_eq!(zero, BinaryPolynomialFraction::from(BinaryPolynomial::zero()));
    }

    #[test]
    fn test_zero_denominator() {
        assert!(matches!(
            BinaryPolynomialFraction::new(p(1), BinaryPolynomial::zero()),
            Err(Error::DivisionByZero(_))
        ));
        let zero = BinaryPolynomialFraction::from(BinaryPolynomial::zero());
        assert!(zero.inverse().is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = BinaryPolynomialFraction::new(p(1), p(0b11)).unwrap();
        let b = BinaryPolynomialFraction::new(p(0b10), p(0b11)).unwrap();
        // 1/(x+1) + x/(x+1) = 1
        assert_eq!(&a + &b, BinaryPolynomialFraction::from(p(1)));
        assert_eq!(&a - &a, BinaryPolynomialFraction::from(BinaryPolynomial::zero()));
        let prod = &a * &BinaryPolynomialFraction::from(p(0b11));
        assert_eq!(prod, BinaryPolynomialFraction::from(p(1)));
        assert_eq!(a.checked_div(&a).unwrap(), BinaryPolynomialFraction::from(p(1)));
    }

    #[test]
    fn test_power_series() {
        // 1 / (1 + x) = 1 + x + x^2 + ...
        let f = BinaryPolynomialFraction::new(p(1), p(0b11)).unwrap();
        assert_eq!(f.power_series(5).unwrap(), vec![1, 1, 1, 1, 1]);
        // 1 / (1 + x + x^2) has period 3: 1 1 0 1 1 0
        let g = BinaryPolynomialFraction::new(p(1), p(0b111)).unwrap();
        assert_eq!(g.power_series(6).unwrap(), vec![1, 1, 0, 1, 1, 0]);
        let h = BinaryPolynomialFraction::new(p(1), p(0b10)).unwrap();
        assert!(h.power_series(3).is_err());
    }
}
