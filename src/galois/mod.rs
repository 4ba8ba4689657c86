//! Binary extension field arithmetic.
//!
//! This module provides GF(2^m) for 1 <= m <= 16 with O(1) multiplication,
//! division and exponentiation through precomputed exponential and logarithm
//! tables. Elements are represented as `u16` integers whose bit i is the
//! coefficient of x^i in the polynomial basis.
//!
//! Building the tables costs O(2^m). Codes that share a field degree should
//! share one instance through [`FiniteField::shared`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::polynomial::BinaryPolynomial;

/// The maximum supported field degree.
pub const MAX_FIELD_DEGREE: usize = 16;

const DEFAULT_MODULI: [u64; MAX_FIELD_DEGREE] = [
    0b11,
    0b111,
    0b1011,
    0b10011,
    0b100101,
    0b1000011,
    0b10001001,
    0b100011101,
    0b1000010001,
    0b10000001001,
    0b100000000101,
    0b1000001010011,
    0b10000000011011,
    0b100010001000011,
    0b1000000000000011,
    0b10001000000001011,
];

// Shared fields keyed by modulus; one table build per modulus per process.
lazy_static! {
    static ref SHARED_FIELDS: Mutex<HashMap<u64, Arc<FiniteField>>> = Mutex::new(HashMap::new());
}

/// Returns the default primitive modulus for a field degree.
pub fn default_modulus(degree: usize) -> Result<BinaryPolynomial> {
    if !(1..=MAX_FIELD_DEGREE).contains(&degree) {
        return Err(Error::InvalidField(format!(
            "no default modulus for degree {} (supported: 1..={})",
            degree, MAX_FIELD_DEGREE
        )));
    }
    Ok(BinaryPolynomial::from_u64(DEFAULT_MODULI[degree - 1]))
}

/// The finite field GF(2^m).
pub struct FiniteField {
    /// Degree m of the extension.
    degree: usize,

    /// The irreducible polynomial that defines the field.
    modulus: BinaryPolynomial,

    /// Integer form of the modulus, used by the direct multiplier.
    modulus_bits: u32,

    /// 2^m.
    field_size: usize,

    /// 2^m - 1, the order of the multiplicative group.
    element_count: usize,

    /// Element whose powers generate the multiplicative group.
    primitive_element: u16,

    /// exp_table[i] = alpha^i, stored twice over so that sums of two logs index directly.
    exp_table: Vec<u16>,

    /// log_table[a] = i such that alpha^i = a. Entry 0 is unused.
    log_table: Vec<u16>,
}

impl FiniteField {
    /// Creates GF(2^m).
    ///
    /// # Arguments
    ///
    /// * `degree` - Extension degree m
    /// * `modulus` - Irreducible polynomial of degree m, or `None` for the default
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidField`] if the modulus does not have degree m, is
    /// reducible, or no default exists for m.
    pub fn new(degree: usize, modulus: Option<BinaryPolynomial>) -> Result<Self> {
        if !(1..=MAX_FIELD_DEGREE).contains(&degree) {
            return Err(Error::InvalidField(format!(
                "field degree must be between 1 and {} (got {})",
                MAX_FIELD_DEGREE, degree
            )));
        }
        let modulus = match modulus {
            Some(p) => p,
            None => default_modulus(degree)?,
        };
        if modulus.degree() != degree as isize {
            return Err(Error::InvalidField(format!(
                "modulus {} has degree {}, expected {}",
                modulus,
                modulus.degree(),
                degree
            )));
        }
        if !modulus.is_irreducible() {
            return Err(Error::InvalidField(format!(
                "modulus {} is not irreducible",
                modulus
            )));
        }
        let modulus_bits = modulus.to_u64().unwrap_or_default() as u32;
        let field_size = 1usize << degree;
        let element_count = field_size - 1;

        let mut field = Self {
            degree,
            modulus,
            modulus_bits,
            field_size,
            element_count,
            primitive_element: 0,
            exp_table: Vec::new(),
            log_table: Vec::new(),
        };
        field.primitive_element = field.find_primitive_element()?;
        field.generate_tables();
        debug!(
            degree,
            modulus = %field.modulus,
            primitive_element = field.primitive_element,
            "built finite field tables"
        );
        Ok(field)
    }

    /// Returns a process-wide shared instance of GF(2^m), building it on first use.
    pub fn shared(degree: usize, modulus: Option<BinaryPolynomial>) -> Result<Arc<Self>> {
        let modulus = match modulus {
            Some(p) => p,
            None => default_modulus(degree)?,
        };
        let key = modulus.to_u64().ok_or_else(|| {
            Error::InvalidField(format!("modulus {} exceeds the supported degree", modulus))
        })?;
        if let Some(field) = SHARED_FIELDS.lock().get(&key) {
            if field.degree == degree {
                return Ok(Arc::clone(field));
            }
        }
        // Built outside the lock; a concurrent builder of the same field is harmless.
        let field = Arc::new(Self::new(degree, Some(modulus))?);
        SHARED_FIELDS
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::clone(&field));
        Ok(field)
    }

    fn find_primitive_element(&self) -> Result<u16> {
        if self.element_count == 1 {
            return Ok(1);
        }
        (2..self.field_size as u32)
            .map(|g| g as u16)
            .find(|&g| self.direct_order(g) == self.element_count)
            .ok_or_else(|| {
                Error::InvalidField(format!("no primitive element modulo {}", self.modulus))
            })
    }

    fn direct_order(&self, a: u16) -> usize {
        let mut x = a;
        let mut order = 1;
        while x != 1 {
            x = self.multiply_direct(x, a);
            order += 1;
            if order > self.element_count {
                break;
            }
        }
        order
    }

    /// Builds the exponential and logarithm tables from the primitive element.
    fn generate_tables(&mut self) {
        let mut exp_table = vec![0u16; 2 * self.element_count];
        let mut log_table = vec![0u16; self.field_size];

        let mut x = 1u16;
        for i in 0..self.element_count {
            exp_table[i] = x;
            log_table[x as usize] = i as u16;
            x = self.multiply_direct(x, self.primitive_element);
        }
        // Extend the exp table to handle wrap-around
        for i in self.element_count..(2 * self.element_count) {
            exp_table[i] = exp_table[i - self.element_count];
        }
        self.exp_table = exp_table;
        self.log_table = log_table;
    }

    /// Multiplies two elements by shift-and-reduce, without the tables.
    pub fn multiply_direct(&self, a: u16, b: u16) -> u16 {
        let mut result = 0u32;
        let mut a_temp = a as u32;
        let mut b_temp = b as u32;
        while b_temp > 0 {
            if b_temp & 1 != 0 {
                result ^= a_temp;
            }
            a_temp <<= 1;
            if a_temp & (self.field_size as u32) != 0 {
                a_temp ^= self.modulus_bits;
            }
            b_temp >>= 1;
        }
        result as u16
    }

    /// Extension degree m.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The defining modulus.
    pub fn modulus(&self) -> &BinaryPolynomial {
        &self.modulus
    }

    /// Number of field elements, 2^m.
    pub fn field_size(&self) -> usize {
        self.field_size
    }

    /// Order of the multiplicative group, 2^m - 1.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// The generator alpha of the multiplicative group used by `exp` and `log`.
    pub fn primitive_element(&self) -> u16 {
        self.primitive_element
    }

    /// Returns true if `a` is an element of this field.
    pub fn contains(&self, a: u16) -> bool {
        (a as usize) < self.field_size
    }

    /// Validates an element, returning it unchanged.
    pub fn element(&self, a: u16) -> Result<u16> {
        if self.contains(a) {
            Ok(a)
        } else {
            Err(Error::InvalidParameter(format!(
                "{} is not an element of GF(2^{})",
                a, self.degree
            )))
        }
    }

    /// Adds two elements (XOR).
    #[inline]
    pub fn add(&self, a: u16, b: u16) -> u16 {
        a ^ b
    }

    /// Subtracts two elements, which is the same as addition in characteristic 2.
    #[inline]
    pub fn subtract(&self, a: u16, b: u16) -> u16 {
        a ^ b
    }

    /// Multiplies two elements using the lookup tables.
    ///
    /// Operands must be field elements (see [`FiniteField::contains`]);
    /// [`FiniteField::checked_multiply`] validates them.
    #[inline]
    pub fn multiply(&self, a: u16, b: u16) -> u16 {
        debug_assert!(self.contains(a) && self.contains(b));
        if a == 0 || b == 0 {
            return 0;
        }
        let log_a = self.log_table[a as usize] as usize;
        let log_b = self.log_table[b as usize] as usize;
        self.exp_table[log_a + log_b]
    }

    /// Multiplies two elements after checking both belong to the field.
    pub fn checked_multiply(&self, a: u16, b: u16) -> Result<u16> {
        Ok(self.multiply(self.element(a)?, self.element(b)?))
    }

    /// Divides `a` by `b`.
    pub fn divide(&self, a: u16, b: u16) -> Result<u16> {
        self.element(a)?;
        self.element(b)?;
        if b == 0 {
            return Err(Error::DivisionByZero(format!("{} / 0 in GF(2^{})", a, self.degree)));
        }
        if a == 0 {
            return Ok(0);
        }
        let log_a = self.log_table[a as usize] as usize;
        let log_b = self.log_table[b as usize] as usize;
        Ok(self.exp_table[log_a + self.element_count - log_b])
    }

    /// Multiplicative inverse.
    pub fn inverse(&self, a: u16) -> Result<u16> {
        self.divide(1, a)
    }

    /// Raises `a` to a power. `0^0` is 1.
    ///
    /// `a` must be a field element.
    pub fn power(&self, a: u16, exponent: u64) -> u16 {
        debug_assert!(self.contains(a));
        if a == 0 {
            return if exponent == 0 { 1 } else { 0 };
        }
        let log_a = self.log_table[a as usize] as u64;
        let e = (log_a * (exponent % self.element_count as u64)) % self.element_count as u64;
        self.exp_table[e as usize]
    }

    /// alpha^i for any integer i, negative exponents included.
    pub fn exp(&self, i: i64) -> u16 {
        self.exp_table[i.rem_euclid(self.element_count as i64) as usize]
    }

    /// Discrete logarithm to base alpha.
    pub fn log(&self, a: u16) -> Result<usize> {
        self.element(a)?;
        if a == 0 {
            return Err(Error::DivisionByZero("logarithm of zero".into()));
        }
        Ok(self.log_table[a as usize] as usize)
    }

    /// Multiplicative order of a nonzero element.
    pub fn order(&self, a: u16) -> Result<usize> {
        let l = self.log(a)?;
        Ok(self.element_count / gcd(l, self.element_count))
    }

    /// The conjugacy class {a, a^2, a^4, ...} of an element, in that order.
    pub fn conjugates(&self, a: u16) -> Vec<u16> {
        let mut class = vec![a];
        let mut x = self.multiply(a, a);
        while x != a {
            class.push(x);
            x = self.multiply(x, x);
        }
        class
    }

    /// Minimal polynomial of an element over GF(2).
    pub fn minimal_polynomial(&self, a: u16) -> BinaryPolynomial {
        // Product of (x + c) over the conjugates, coefficients low-to-high.
        let mut product = vec![1u16];
        for c in self.conjugates(a) {
            product = self.poly_multiply(&product, &[c, 1]);
        }
        // The coefficients lie in GF(2) because the product is Frobenius-invariant.
        let bits: Vec<u8> = product.iter().map(|&c| (c & 1) as u8).collect();
        BinaryPolynomial::from_bits(&bits)
    }

    /// Evaluates a polynomial with field coefficients (low-to-high) at `x`.
    pub fn poly_eval(&self, poly: &[u16], x: u16) -> u16 {
        poly.iter()
            .rev()
            .fold(0, |acc, &c| self.multiply(acc, x) ^ c)
    }

    /// Multiplies two polynomials with field coefficients (low-to-high).
    pub fn poly_multiply(&self, a: &[u16], b: &[u16]) -> Vec<u16> {
        if a.is_empty() || b.is_empty() {
            return Vec::new();
        }
        let mut result = vec![0u16; a.len() + b.len() - 1];
        for (i, &x) in a.iter().enumerate() {
            if x == 0 {
                continue;
            }
            for (j, &y) in b.iter().enumerate() {
                result[i + j] ^= self.multiply(x, y);
            }
        }
        result
    }

    /// Computes the syndromes S_i = r(alpha^i) for i = 1..=count of a binary word.
    ///
    /// # Arguments
    ///
    /// * `received` - Received word, bit j being the coefficient of x^j
    /// * `count` - Number of syndromes to compute
    pub fn syndromes(&self, received: &[u8], count: usize) -> Vec<u16> {
        (1..=count as i64)
            .map(|i| {
                received
                    .iter()
                    .enumerate()
                    .filter(|(_, &b)| b == 1)
                    .fold(0, |acc, (j, _)| acc ^ self.exp(i * j as i64))
            })
            .collect()
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl fmt::Debug for FiniteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiniteField")
            .field("degree", &self.degree)
            .field("modulus", &self.modulus)
            .field("primitive_element", &self.primitive_element)
            .finish()
    }
}
