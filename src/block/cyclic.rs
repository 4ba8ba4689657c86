//! Cyclic codes and the Meggitt decoder.
//!
//! Bit i of a word is the coefficient of x^i. The parity-check matrix of a
//! cyclic code has column j equal to x^j mod g(x), so the matrix syndrome and
//! the polynomial syndrome r(x) mod g(x) coincide.

use std::collections::HashSet;

use itertools::Itertools;
use ndarray::Array2;
use tracing::debug;

use super::{check_matrix_size, BlockCode, CodeFamily, DecodingMethod};
use crate::error::{Error, Result};
use crate::matrix;
use crate::polynomial::BinaryPolynomial;

/// Polynomial description of a cyclic code of length n.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicStructure {
    length: usize,
    generator: BinaryPolynomial,
    check: BinaryPolynomial,
    systematic: bool,
}

impl CyclicStructure {
    /// Validates g(x) as a generator of a cyclic code of the given length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGenerator`] if g(x) does not divide x^n - 1, and
    /// [`Error::InvalidParameter`] if the resulting dimension would be zero.
    pub fn new(length: usize, generator: BinaryPolynomial, systematic: bool) -> Result<Self> {
        if length == 0 {
            return Err(Error::InvalidParameter("code length must be positive".into()));
        }
        let modulus = BinaryPolynomial::monomial(length) + BinaryPolynomial::one();
        let (check, remainder) = modulus.div_rem(&generator)?;
        if !remainder.is_zero() {
            return Err(Error::InvalidGenerator(format!(
                "{} does not divide x^{} + 1",
                generator, length
            )));
        }
        if generator.degree() as usize >= length {
            return Err(Error::InvalidParameter(format!(
                "generator {} leaves a code of dimension 0",
                generator
            )));
        }
        check_matrix_size(length, length - generator.degree() as usize)?;
        Ok(Self {
            length,
            generator,
            check,
            systematic,
        })
    }

    /// Code length n.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Dimension k = n - deg g.
    pub fn dimension(&self) -> usize {
        self.length - self.redundancy()
    }

    /// Redundancy deg g.
    pub fn redundancy(&self) -> usize {
        self.generator.degree() as usize
    }

    /// The generator polynomial g(x).
    pub fn generator_polynomial(&self) -> &BinaryPolynomial {
        &self.generator
    }

    /// The check polynomial h(x) = (x^n + 1) / g(x).
    pub fn check_polynomial(&self) -> &BinaryPolynomial {
        &self.check
    }

    /// Whether codewords carry the message in the last k positions.
    pub fn is_systematic(&self) -> bool {
        self.systematic
    }

    /// Encodes a k-bit message.
    ///
    /// Non-systematic encoding is m(x) g(x). Systematic encoding is
    /// x^(n-k) m(x) + (x^(n-k) m(x) mod g(x)), giving [parity | message].
    pub fn encode(&self, message: &[u8]) -> Vec<u8> {
        let m = BinaryPolynomial::from_bits(message);
        let c = if self.systematic {
            let shifted = m.shift_left(self.redundancy());
            // g is nonzero by construction
            let parity = shifted.rem(&self.generator).unwrap_or_default();
            &shifted + &parity
        } else {
            &m * &self.generator
        };
        c.to_bits(self.length)
    }

    /// Reads the message out of a word; exact for codewords.
    pub fn message(&self, word: &[u8]) -> Vec<u8> {
        if self.systematic {
            return word[self.redundancy()..].to_vec();
        }
        let (q, _) = BinaryPolynomial::from_bits(word)
            .div_rem(&self.generator)
            .unwrap_or_default();
        q.to_bits(self.dimension())
    }

    /// Syndrome polynomial r(x) mod g(x).
    pub fn syndrome_polynomial(&self, word: &[u8]) -> BinaryPolynomial {
        BinaryPolynomial::from_bits(word)
            .rem(&self.generator)
            .unwrap_or_default()
    }

    /// Generator matrix whose row i encodes the i-th unit message.
    pub fn generator_matrix(&self) -> Array2<u8> {
        let (k, n) = (self.dimension(), self.length);
        let mut g = Array2::zeros((k, n));
        for i in 0..k {
            let mut unit = vec![0u8; k];
            unit[i] = 1;
            for (j, b) in self.encode(&unit).into_iter().enumerate() {
                g[[i, j]] = b;
            }
        }
        g
    }

    /// Parity-check matrix with column j equal to x^j mod g(x).
    pub fn check_matrix(&self) -> Array2<u8> {
        let r = self.redundancy();
        let mut h = Array2::zeros((r, self.length));
        for j in 0..self.length {
            let column = BinaryPolynomial::monomial(j)
                .rem(&self.generator)
                .unwrap_or_default();
            for i in 0..r {
                h[[i, j]] = column.coefficient(i);
            }
        }
        h
    }
}

impl BlockCode {
    /// Creates a cyclic code of the given length from its generator polynomial.
    pub fn cyclic(length: usize, generator: BinaryPolynomial, systematic: bool) -> Result<Self> {
        let structure = CyclicStructure::new(length, generator, systematic)?;
        Ok(Self::from_cyclic(CodeFamily::Cyclic, structure))
    }

    /// Creates a cyclic code from its check polynomial h(x), with g(x) = (x^n + 1) / h(x).
    pub fn cyclic_from_check_polynomial(
        length: usize,
        check: BinaryPolynomial,
        systematic: bool,
    ) -> Result<Self> {
        let modulus = BinaryPolynomial::monomial(length) + BinaryPolynomial::one();
        let (generator, remainder) = modulus.div_rem(&check)?;
        if !remainder.is_zero() {
            return Err(Error::InvalidGenerator(format!(
                "check polynomial {} does not divide x^{} + 1",
                check, length
            )));
        }
        Self::cyclic(length, generator, systematic)
    }

    pub(crate) fn from_cyclic(family: CodeFamily, structure: CyclicStructure) -> Self {
        let generator = structure.generator_matrix();
        let check = structure.check_matrix();
        let recovery = if structure.systematic {
            let (n, k) = (structure.length, structure.dimension());
            let r = n - k;
            Array2::from_shape_fn((n, k), |(p, i)| u8::from(p == r + i))
        } else {
            // Only used through the polynomial path; kept consistent anyway.
            matrix::right_inverse(&generator).unwrap_or_else(|_| Array2::zeros((structure.length, structure.dimension())))
        };
        let mut code = BlockCode::from_parts(family, generator, check, recovery);
        code.cyclic = Some(structure);
        code
    }

    fn meggitt_table(&self, structure: &CyclicStructure) -> &HashSet<BinaryPolynomial> {
        self.meggitt_table.get_or_init(|| {
            let n = structure.length;
            let t = self.packing_radius();
            let columns: Vec<BinaryPolynomial> = (0..n)
                .map(|j| {
                    BinaryPolynomial::monomial(j)
                        .rem(&structure.generator)
                        .unwrap_or_default()
                })
                .collect();
            let mut table = HashSet::new();
            // Correctable patterns with an error in the last position.
            for w in 1..=t.min(n) {
                for combo in (0..n - 1).combinations(w - 1) {
                    let s = combo
                        .iter()
                        .fold(columns[n - 1].clone(), |acc, &j| &acc + &columns[j]);
                    table.insert(s);
                }
            }
            debug!(length = n, radius = t, entries = table.len(), "built Meggitt table");
            table
        })
    }
}

pub(super) fn decode_meggitt(code: &BlockCode, received: &[u8]) -> Result<(Vec<u8>, bool)> {
    let structure = code
        .cyclic
        .as_ref()
        .ok_or_else(|| code.unsupported(DecodingMethod::Meggitt))?;
    let n = structure.length;
    let table = code.meggitt_table(structure);
    let x = BinaryPolynomial::monomial(1);
    let last = BinaryPolynomial::monomial(n - 1).rem(&structure.generator)?;

    let mut word = received.to_vec();
    let mut s = structure.syndrome_polynomial(received);
    for _ in 0..n {
        if table.contains(&s) {
            word[n - 1] ^= 1;
            s = &s + &last;
        }
        // Cyclic shift x * w(x) mod (x^n + 1), tracked on the syndrome.
        word.rotate_right(1);
        s = (&s * &x).rem(&structure.generator)?;
    }
    Ok((word, !s.is_zero()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits;
    use rand::seq::index::sample;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn hamming_7_4(systematic: bool) -> BlockCode {
        BlockCode::cyclic(7, BinaryPolynomial::from_u64(0b1011), systematic).unwrap()
    }

    #[test]
    fn test_structure() {
        let code = hamming_7_4(false);
        assert_eq!((code.length(), code.dimension()), (7, 4));
        let s = code.cyclic_structure().unwrap();
        assert_eq!(s.check_polynomial(), &BinaryPolynomial::from_u64(0b10111));
        assert_eq!(code.minimum_distance(), 3);
        let product = matrix::multiply(code.generator_matrix(), &code.check_matrix().t().to_owned());
        assert!(matrix::is_zero(&product));
    }

    #[test]
    fn test_invalid_generator() {
        assert!(matches!(
            BlockCode::cyclic(7, BinaryPolynomial::from_u64(0b111), false),
            Err(Error::InvalidGenerator(_))
        ));
        assert!(matches!(
            BlockCode::cyclic(7, BinaryPolynomial::zero(), false),
            Err(Error::DivisionByZero(_))
        ));
    }

    #[test]
    fn test_non_systematic_encoding() {
        let code = hamming_7_4(false);
        // (1 + x^3)(1 + x + x^3) = 1 + x + x^4 + x^6
        assert_eq!(code.encode(&[1, 0, 0, 1]).unwrap(), vec![1, 1, 0, 0, 1, 0, 1]);
        let c = code.encode(&[0, 1, 1, 0]).unwrap();
        assert_eq!(code.inverse_encode(&c).unwrap(), vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_systematic_encoding() {
        let code = hamming_7_4(true);
        // x^3 mod g = 1 + x
        assert_eq!(code.encode(&[1, 0, 0, 0]).unwrap(), vec![1, 1, 0, 1, 0, 0, 0]);
        for m in 0..16u64 {
            let message = bits::int_to_bits(m, 4);
            let c = code.encode(&message).unwrap();
            assert_eq!(&c[3..], &message[..]);
            assert!(code.is_codeword(&c).unwrap());
        }
    }

    #[test]
    fn test_matrix_syndrome_matches_polynomial() {
        let code = hamming_7_4(true);
        let s = code.cyclic_structure().unwrap();
        for r in 0..128u64 {
            let word = bits::int_to_bits(r, 7);
            assert_eq!(code.syndrome(&word).unwrap(), s.syndrome_polynomial(&word).to_bits(3));
        }
    }

    #[test]
    fn test_meggitt_corrects_single_errors() {
        for systematic in [false, true] {
            let code = hamming_7_4(systematic);
            assert_eq!(code.default_method(), DecodingMethod::Meggitt);
            for m in 0..16u64 {
                let message = bits::int_to_bits(m, 4);
                let c = code.encode(&message).unwrap();
                for i in 0..7 {
                    let mut r = c.clone();
                    r[i] ^= 1;
                    let decoded = code.decode(&r).unwrap();
                    assert_eq!(decoded.message, message);
                    assert!(!decoded.uncorrectable);
                }
            }
        }
    }

    #[test]
    fn test_meggitt_double_error_cyclic_code() {
        // (15, 7) BCH generator x^8 + x^7 + x^6 + x^4 + 1 corrects two errors.
        let code = BlockCode::cyclic(15, BinaryPolynomial::from_u64(0b111010001), true).unwrap();
        assert_eq!(code.minimum_distance(), 5);
        let c = code.encode(&[1, 0, 1, 1, 0, 0, 1]).unwrap();
        for (i, j) in [(0, 14), (3, 9), (13, 14)] {
            let mut r = c.clone();
            r[i] ^= 1;
            r[j] ^= 1;
            let decoded = code.decode(&r).unwrap();
            assert_eq!(decoded.codeword, c);
            assert!(!decoded.uncorrectable);
        }
    }

    #[test]
    fn test_meggitt_beyond_two_errors() {
        let code = BlockCode::cyclic(15, BinaryPolynomial::from_u64(0b111010001), true).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let mut flagged = 0;
        for _ in 0..100 {
            let message: Vec<u8> = (0..7).map(|_| rng.random_range(0..2u8)).collect();
            let c = code.encode(&message).unwrap();
            let weight = rng.random_range(3..=5);
            let mut r = c.clone();
            for i in sample(&mut rng, 15, weight) {
                r[i] ^= 1;
            }
            let decoded = code.decode_with(DecodingMethod::Meggitt, &r).unwrap();
            if decoded.uncorrectable {
                flagged += 1;
            } else {
                assert!(code.is_codeword(&decoded.codeword).unwrap());
                assert!(decoded.corrections <= 2);
                assert_eq!(decoded.corrections, bits::hamming_distance(&r, &decoded.codeword));
                assert_ne!(decoded.codeword, c);
            }
        }
        assert!(flagged > 0);
    }

    #[test]
    fn test_from_check_polynomial() {
        let code =
            BlockCode::cyclic_from_check_polynomial(7, BinaryPolynomial::from_u64(0b10111), false).unwrap();
        assert_eq!(
            code.cyclic_structure().unwrap().generator_polynomial(),
            &BinaryPolynomial::from_u64(0b1011)
        );
    }
}
