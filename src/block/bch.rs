//! Narrow-sense primitive BCH codes with Berlekamp-Massey decoding.

use std::sync::Arc;

use super::{BlockCode, CodeFamily, CyclicStructure, DecodingMethod};
use crate::error::{Error, Result};
use crate::galois::FiniteField;
use crate::polynomial::BinaryPolynomial;

/// Distinct minimal polynomials of alpha^1 .. alpha^(delta - 1).
fn minimal_polynomial_set(field: &FiniteField, delta: usize) -> Vec<BinaryPolynomial> {
    let mut set: Vec<BinaryPolynomial> = Vec::new();
    for i in 1..delta {
        let phi = field.minimal_polynomial(field.exp(i as i64));
        if !set.contains(&phi) {
            set.push(phi);
        }
    }
    set
}

impl BlockCode {
    /// BCH code over GF(2^mu) with Bose distance `delta`: n = 2^mu - 1 and
    /// g(x) = lcm of the minimal polynomials of alpha, alpha^2, ..., alpha^(delta - 1).
    pub fn bch(mu: usize, delta: usize) -> Result<Self> {
        if mu < 2 {
            return Err(Error::InvalidParameter(format!("'mu' must satisfy mu >= 2 (got {})", mu)));
        }
        Self::bch_with_field(FiniteField::shared(mu, None)?, delta)
    }

    /// BCH code over a caller-supplied field, so codes can share one field instance.
    pub fn bch_with_field(field: Arc<FiniteField>, delta: usize) -> Result<Self> {
        let mu = field.degree();
        if mu < 2 {
            return Err(Error::InvalidParameter(format!("'mu' must satisfy mu >= 2 (got {})", mu)));
        }
        let n = field.element_count();
        if !(2..=n).contains(&delta) {
            return Err(Error::InvalidParameter(format!(
                "'delta' must satisfy 2 <= delta <= {} (got {})",
                n, delta
            )));
        }
        let set = minimal_polynomial_set(&field, delta);
        let phi = |i: usize| field.minimal_polynomial(field.exp(i as i64));
        if set.contains(&phi(delta)) {
            let mut next = delta;
            while set.contains(&phi(next)) {
                next += 1;
            }
            return Err(Error::InvalidParameter(format!(
                "'delta' must be a Bose distance (the next one is {})",
                next
            )));
        }
        let generator = set
            .iter()
            .fold(BinaryPolynomial::one(), |acc, p| &acc * p);
        let structure = CyclicStructure::new(n, generator, true)?;
        let mut code = Self::from_cyclic(CodeFamily::Bch { mu, delta }, structure);
        code.field = Some(field);
        Ok(code)
    }
}

/// Berlekamp-Massey: shortest LFSR (error locator, low-to-high) generating the syndromes.
fn berlekamp_massey(field: &FiniteField, syndromes: &[u16]) -> Vec<u16> {
    let mut locator = vec![1u16];
    let mut previous = vec![1u16];
    let mut length = 0usize;
    let mut shift = 1usize;
    let mut previous_discrepancy = 1u16;
    for n in 0..syndromes.len() {
        let discrepancy = (1..=length)
            .filter(|&i| i < locator.len())
            .fold(syndromes[n], |acc, i| acc ^ field.multiply(locator[i], syndromes[n - i]));
        if discrepancy == 0 {
            shift += 1;
            continue;
        }
        // previous_discrepancy is never zero once assigned
        let scale = field.divide(discrepancy, previous_discrepancy).unwrap_or(0);
        let mut updated = locator.clone();
        if updated.len() < previous.len() + shift {
            updated.resize(previous.len() + shift, 0);
        }
        for (i, &b) in previous.iter().enumerate() {
            updated[i + shift] ^= field.multiply(scale, b);
        }
        if 2 * length <= n {
            length = n + 1 - length;
            previous = std::mem::replace(&mut locator, updated);
            previous_discrepancy = discrepancy;
            shift = 1;
        } else {
            locator = updated;
            shift += 1;
        }
    }
    locator.truncate(length + 1);
    while locator.len() > 1 && locator.last() == Some(&0) {
        locator.pop();
    }
    locator
}

pub(super) fn decode_berlekamp(code: &BlockCode, received: &[u8]) -> Result<(Vec<u8>, bool)> {
    let (field, delta) = match (code.field.as_ref(), code.family) {
        (Some(field), CodeFamily::Bch { delta, .. }) => (field, delta),
        _ => return Err(code.unsupported(DecodingMethod::Berlekamp)),
    };
    let t = (delta - 1) / 2;
    let n = code.length();
    let syndromes = field.syndromes(received, 2 * t);
    if syndromes.iter().all(|&s| s == 0) {
        return Ok((received.to_vec(), false));
    }
    let locator = berlekamp_massey(field, &syndromes);
    let degree = locator.len() - 1;
    // Chien search: a root at alpha^(-j) marks an error at position j.
    let positions: Vec<usize> = (0..n)
        .filter(|&j| field.poly_eval(&locator, field.exp(-(j as i64))) == 0)
        .collect();
    if degree > t || positions.len() != degree {
        return Ok((received.to_vec(), true));
    }
    let mut codeword = received.to_vec();
    for j in positions {
        codeword[j] ^= 1;
    }
    Ok((codeword, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::index::sample;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_bch_5_7() {
        let code = BlockCode::bch(5, 7).unwrap();
        assert_eq!((code.length(), code.dimension()), (31, 16));
        assert_eq!(
            code.cyclic_structure().unwrap().generator_polynomial(),
            &BinaryPolynomial::from_u64(0b1000111110101111)
        );
        assert_eq!(code.minimum_distance(), 7);
    }

    #[test]
    fn test_bose_distance_validation() {
        assert!(BlockCode::bch(7, 31).is_ok());
        match BlockCode::bch(7, 32) {
            Err(Error::InvalidParameter(msg)) => {
                assert_eq!(msg, "'delta' must be a Bose distance (the next one is 43)")
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(BlockCode::bch(7, 43).is_ok());
        assert!(BlockCode::bch(4, 4).is_err());
        assert!(BlockCode::bch(4, 16).is_err());
        assert!(BlockCode::bch(1, 3).is_err());
    }

    #[test]
    fn test_reductions() {
        // delta = 3 gives a Hamming code, delta = n a repetition code.
        let h = BlockCode::bch(4, 3).unwrap();
        assert_eq!((h.length(), h.dimension()), (15, 11));
        let r = BlockCode::bch(3, 7).unwrap();
        assert_eq!((r.length(), r.dimension()), (7, 1));
    }

    #[test]
    fn test_berlekamp_corrects_up_to_t() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for (mu, delta) in [(4, 5), (4, 7), (5, 7), (6, 11)] {
            let code = BlockCode::bch(mu, delta).unwrap();
            let (n, k, t) = (code.length(), code.dimension(), (delta - 1) / 2);
            for _ in 0..40 {
                let message: Vec<u8> = (0..k).map(|_| rng.random_range(0..2u8)).collect();
                let c = code.encode(&message).unwrap();
                let weight = rng.random_range(0..=t);
                let mut r = c.clone();
                for i in sample(&mut rng, n, weight) {
                    r[i] ^= 1;
                }
                let decoded = code.decode(&r).unwrap();
                assert_eq!(decoded.message, message);
                assert_eq!(decoded.corrections, weight);
                assert!(!decoded.uncorrectable);
            }
        }
    }

    #[test]
    fn test_beyond_capability_is_flagged_or_valid() {
        // Three errors exceed t = 2: the result is either flagged or a genuine
        // codeword within the decoding radius of the received word.
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let code = BlockCode::bch(4, 5).unwrap();
        let c = code.encode(&[0; 7]).unwrap();
        for _ in 0..100 {
            let mut r = c.clone();
            for i in sample(&mut rng, 15, 3) {
                r[i] ^= 1;
            }
            let decoded = code.decode(&r).unwrap();
            assert!(
                decoded.uncorrectable
                    || (code.is_codeword(&decoded.codeword).unwrap() && decoded.corrections <= 2)
            );
            assert_ne!(decoded.codeword, c);
        }
    }

    #[test]
    fn test_berlekamp_requires_bch() {
        let code = BlockCode::hamming(3, false).unwrap();
        assert!(matches!(
            code.decode_with(DecodingMethod::Berlekamp, &[0; 7]),
            Err(Error::UnsupportedParameter(_))
        ));
    }
}
