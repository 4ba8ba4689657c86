//! Polynomials over GF(2).
//!
//! [`BinaryPolynomial`] stores coefficients low-to-high in 64-bit limbs, so the
//! coefficient of x^i is bit `i % 64` of limb `i / 64`. Values are always kept
//! normalized (no zero limbs at the top), so structural equality is polynomial
//! equality. The zero polynomial has degree -1.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use num_traits::{One, Zero};

use crate::error::{Error, Result};
use crate::galois::FiniteField;

mod fraction;

pub use fraction::BinaryPolynomialFraction;

/// A polynomial with coefficients in GF(2).
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BinaryPolynomial {
    limbs: Vec<u64>,
}

impl BinaryPolynomial {
    /// The zero polynomial.
    pub fn zero() -> Self {
        Self { limbs: Vec::new() }
    }

    /// The constant polynomial 1.
    pub fn one() -> Self {
        Self { limbs: vec![1] }
    }

    /// The monomial x^degree.
    pub fn monomial(degree: usize) -> Self {
        let mut p = Self::zero();
        p.toggle(degree);
        p
    }

    /// Builds a polynomial from its integer representation (bit i is the
    /// coefficient of x^i), e.g. `0b1011` is x^3 + x + 1.
    pub fn from_u64(value: u64) -> Self {
        let mut p = Self { limbs: vec![value] };
        p.normalize();
        p
    }

    /// Builds a polynomial from a low-to-high coefficient sequence. Nonzero
    /// entries are taken as 1.
    pub fn from_bits(bits: &[u8]) -> Self {
        let mut limbs = vec![0u64; bits.len().div_ceil(64)];
        for (i, &b) in bits.iter().enumerate() {
            if b != 0 {
                limbs[i / 64] |= 1 << (i % 64);
            }
        }
        let mut p = Self { limbs };
        p.normalize();
        p
    }

    /// Returns the first `width` coefficients, low-to-high. Higher-order
    /// coefficients are dropped.
    pub fn to_bits(&self, width: usize) -> Vec<u8> {
        (0..width).map(|i| self.coefficient(i)).collect()
    }

    /// Returns all coefficients up to the degree, low-to-high. Empty for zero.
    pub fn coefficients(&self) -> Vec<u8> {
        self.to_bits((self.degree() + 1) as usize)
    }

    /// Returns the integer representation if the degree is below 64.
    pub fn to_u64(&self) -> Option<u64> {
        match self.limbs.len() {
            0 => Some(0),
            1 => Some(self.limbs[0]),
            _ => None,
        }
    }

    /// Degree of the polynomial, or -1 for the zero polynomial.
    pub fn degree(&self) -> isize {
        match self.limbs.last() {
            None => -1,
            Some(&top) => {
                ((self.limbs.len() - 1) * 64 + (63 - top.leading_zeros() as usize)) as isize
            }
        }
    }

    /// Returns true if this is the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    /// Returns true if this is the constant polynomial 1.
    pub fn is_one(&self) -> bool {
        self.limbs.len() == 1 && self.limbs[0] == 1
    }

    /// Coefficient of x^i.
    pub fn coefficient(&self, i: usize) -> u8 {
        self.limbs
            .get(i / 64)
            .map_or(0, |&limb| ((limb >> (i % 64)) & 1) as u8)
    }

    /// Number of nonzero coefficients.
    pub fn weight(&self) -> usize {
        self.limbs.iter().map(|l| l.count_ones() as usize).sum()
    }

    /// Multiplies by x^shift.
    pub fn shift_left(&self, shift: usize) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        let mut limbs = Vec::new();
        xor_shifted(&mut limbs, &self.limbs, shift);
        let mut p = Self { limbs };
        p.normalize();
        p
    }

    /// Polynomial long division, returning `(quotient, remainder)` with
    /// `degree(remainder) < degree(divisor)`.
    pub fn div_rem(&self, divisor: &Self) -> Result<(Self, Self)> {
        if divisor.is_zero() {
            return Err(Error::DivisionByZero(
                "polynomial division by the zero polynomial".into(),
            ));
        }
        let divisor_degree = divisor.degree();
        let mut remainder = self.clone();
        let mut quotient = Self::zero();
        while remainder.degree() >= divisor_degree {
            let shift = (remainder.degree() - divisor_degree) as usize;
            xor_shifted(&mut remainder.limbs, &divisor.limbs, shift);
            remainder.normalize();
            quotient.toggle(shift);
        }
        Ok((quotient, remainder))
    }

    /// Remainder of division by `modulus`.
    pub fn rem(&self, modulus: &Self) -> Result<Self> {
        self.div_rem(modulus).map(|(_, r)| r)
    }

    /// Greatest common divisor (Euclidean algorithm). `gcd(0, 0) = 0`.
    pub fn gcd(&self, other: &Self) -> Self {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            // b is nonzero, so the division cannot fail
            let r = match a.div_rem(&b) {
                Ok((_, r)) => r,
                Err(_) => break,
            };
            a = std::mem::replace(&mut b, r);
        }
        a
    }

    /// Least common multiple. Zero if either operand is zero.
    pub fn lcm(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let g = self.gcd(other);
        match (self * other).div_rem(&g) {
            Ok((q, _)) => q,
            Err(_) => Self::zero(),
        }
    }

    /// Raises the polynomial to a power.
    pub fn pow(&self, exponent: u32) -> Self {
        let mut result = Self::one();
        let mut base = self.clone();
        let mut e = exponent;
        while e > 0 {
            if e & 1 == 1 {
                result = &result * &base;
            }
            base = &base * &base;
            e >>= 1;
        }
        result
    }

    /// Computes `self^exponent mod modulus` by square-and-multiply.
    pub fn pow_mod(&self, exponent: u64, modulus: &Self) -> Result<Self> {
        let mut result = Self::one().rem(modulus)?;
        let mut base = self.rem(modulus)?;
        let mut e = exponent;
        while e > 0 {
            if e & 1 == 1 {
                result = (&result * &base).rem(modulus)?;
            }
            base = (&base * &base).rem(modulus)?;
            e >>= 1;
        }
        Ok(result)
    }

    /// Reciprocal polynomial x^deg * p(1/x) (coefficients reversed).
    pub fn reciprocal(&self) -> Self {
        let mut bits = self.coefficients();
        bits.reverse();
        Self::from_bits(&bits)
    }

    /// Evaluates the polynomial at an element of GF(2^m) by Horner's rule.
    pub fn evaluate(&self, field: &FiniteField, x: u16) -> u16 {
        let mut result = 0u16;
        for i in (0..=self.degree().max(0) as usize).rev() {
            result = field.multiply(result, x) ^ self.coefficient(i) as u16;
        }
        result
    }

    /// Returns true if the polynomial is irreducible over GF(2) (Ben-Or test).
    pub fn is_irreducible(&self) -> bool {
        let degree = self.degree();
        if degree < 1 {
            return false;
        }
        let x = Self::monomial(1);
        let mut u = x.clone();
        for _ in 0..(degree as usize / 2) {
            u = match (&u * &u).rem(self) {
                Ok(r) => r,
                Err(_) => return false,
            };
            if !self.gcd(&(&u + &x)).is_one() {
                return false;
            }
        }
        true
    }

    /// Returns true if the polynomial is primitive, i.e. irreducible and x has
    /// multiplicative order 2^m - 1 modulo it. Defined for degrees up to 63.
    pub fn is_primitive(&self) -> bool {
        let degree = self.degree();
        if !(1..=63).contains(&degree) || !self.is_irreducible() {
            return false;
        }
        let order = (1u64 << degree) - 1;
        let x = Self::monomial(1);
        let power_is_one =
            |e: u64| matches!(x.pow_mod(e, self), Ok(p) if p.is_one());
        power_is_one(order) && prime_factors(order).into_iter().all(|p| !power_is_one(order / p))
    }

    fn toggle(&mut self, i: usize) {
        let limb = i / 64;
        if self.limbs.len() <= limb {
            self.limbs.resize(limb + 1, 0);
        }
        self.limbs[limb] ^= 1 << (i % 64);
        self.normalize();
    }

    fn normalize(&mut self) {
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
    }
}

/// XORs `src * x^shift` into `dst`, growing `dst` as needed.
fn xor_shifted(dst: &mut Vec<u64>, src: &[u64], shift: usize) {
    let (limb_shift, bit_shift) = (shift / 64, shift % 64);
    let needed = src.len() + limb_shift + 1;
    if dst.len() < needed {
        dst.resize(needed, 0);
    }
    for (i, &word) in src.iter().enumerate() {
        dst[i + limb_shift] ^= word << bit_shift;
        if bit_shift != 0 {
            dst[i + limb_shift + 1] ^= word >> (64 - bit_shift);
        }
    }
}

fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut p = 2;
    while p * p <= n {
        if n % p == 0 {
            factors.push(p);
            while n % p == 0 {
                n /= p;
            }
        }
        p += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

impl From<u64> for BinaryPolynomial {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl Add for &BinaryPolynomial {
    type Output = BinaryPolynomial;

    fn add(self, rhs: &BinaryPolynomial) -> BinaryPolynomial {
        let mut limbs = self.limbs.clone();
        xor_shifted(&mut limbs, &rhs.limbs, 0);
        let mut p = BinaryPolynomial { limbs };
        p.normalize();
        p
    }
}

impl Add for BinaryPolynomial {
    type Output = BinaryPolynomial;

    fn add(self, rhs: BinaryPolynomial) -> BinaryPolynomial {
        &self + &rhs
    }
}

// Subtraction and addition coincide in characteristic 2.
impl Sub for &BinaryPolynomial {
    type Output = BinaryPolynomial;

    fn sub(self, rhs: &BinaryPolynomial) -> BinaryPolynomial {
        self + rhs
    }
}

impl Sub for BinaryPolynomial {
    type Output = BinaryPolynomial;

    fn sub(self, rhs: BinaryPolynomial) -> BinaryPolynomial {
        &self + &rhs
    }
}

impl Mul for &BinaryPolynomial {
    type Output = BinaryPolynomial;

    fn mul(self, rhs: &BinaryPolynomial) -> BinaryPolynomial {
        let mut limbs = Vec::with_capacity(self.limbs.len() + rhs.limbs.len());
        for (i, &word) in self.limbs.iter().enumerate() {
            let mut w = word;
            while w != 0 {
                let bit = w.trailing_zeros() as usize;
                xor_shifted(&mut limbs, &rhs.limbs, i * 64 + bit);
                w &= w - 1;
            }
        }
        let mut p = BinaryPolynomial { limbs };
        p.normalize();
        p
    }
}

impl Mul for BinaryPolynomial {
    type Output = BinaryPolynomial;

    fn mul(self, rhs: BinaryPolynomial) -> BinaryPolynomial {
        &self * &rhs
    }
}

impl Zero for BinaryPolynomial {
    fn zero() -> Self {
        BinaryPolynomial::zero()
    }

    fn is_zero(&self) -> bool {
        BinaryPolynomial::is_zero(self)
    }
}

impl One for BinaryPolynomial {
    fn one() -> Self {
        BinaryPolynomial::one()
    }
}

impl fmt::Display for BinaryPolynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0b0");
        }
        write!(f, "0b")?;
        for i in (0..=self.degree() as usize).rev() {
            write!(f, "{}", self.coefficient(i))?;
        }
        Ok(())
    }
}

impl fmt::Debug for BinaryPolynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryPolynomial({})", self)
    }
}
