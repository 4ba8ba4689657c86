//! Hamming and simplex codes.

use itertools::Itertools;
use ndarray::Array2;

use super::{check_matrix_size, BlockCode, CodeFamily, InformationSet};
use crate::error::{Error, Result};

/// Parity submatrix of the Hamming code with redundancy `mu`: its rows are all
/// `mu`-bit vectors of weight at least 2, by weight and then by position set.
fn hamming_parity_submatrix(mu: usize, extended: bool) -> Array2<u8> {
    let rows: Vec<Vec<usize>> = (2..=mu)
        .flat_map(|w| (0..mu).combinations(w))
        .collect();
    let cols = if extended { mu + 1 } else { mu };
    let mut p = Array2::zeros((rows.len(), cols));
    for (i, ones) in rows.iter().enumerate() {
        for &j in ones {
            p[[i, j]] = 1;
        }
        if extended {
            // Overall parity makes every codeword weight even.
            p[[i, mu]] = ((ones.len() + 1) % 2) as u8;
        }
    }
    p
}

impl BlockCode {
    /// Hamming code with redundancy `mu` >= 2: n = 2^mu - 1, k = n - mu, d = 3.
    ///
    /// The extended code appends an overall parity bit (n = 2^mu, d = 4).
    pub fn hamming(mu: usize, extended: bool) -> Result<Self> {
        if !(2..=16).contains(&mu) {
            return Err(Error::InvalidParameter(format!(
                "Hamming code needs 2 <= mu <= 16 (got {})",
                mu
            )));
        }
        let n = (1usize << mu) - 1;
        check_matrix_size(n + usize::from(extended), n - mu)?;
        let code = Self::systematic(hamming_parity_submatrix(mu, extended), InformationSet::Left)?;
        Ok(code
            .with_family(CodeFamily::Hamming { mu, extended })
            .with_known_distance(if extended { 4 } else { 3 }))
    }

    /// Simplex code of dimension `kappa` >= 2, the dual of the Hamming code:
    /// n = 2^kappa - 1, every nonzero codeword has weight 2^(kappa - 1).
    pub fn simplex(kappa: usize) -> Result<Self> {
        if !(2..=16).contains(&kappa) {
            return Err(Error::InvalidParameter(format!(
                "simplex code needs 2 <= kappa <= 16 (got {})",
                kappa
            )));
        }
        check_matrix_size((1usize << kappa) - 1, kappa)?;
        let p = hamming_parity_submatrix(kappa, false).t().to_owned();
        let code = Self::systematic(p, InformationSet::Right)?;
        Ok(code
            .with_family(CodeFamily::Simplex { kappa })
            .with_known_distance(1 << (kappa - 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits;
    use crate::matrix;

    #[test]
    fn test_hamming_7_4() {
        let code = BlockCode::hamming(3, false).unwrap();
        assert_eq!((code.length(), code.dimension(), code.minimum_distance()), (7, 4, 3));
        assert_eq!(
            matrix::to_rows(code.generator_matrix()),
            vec![
                vec![1, 0, 0, 0, 1, 1, 0],
                vec![0, 1, 0, 0, 1, 0, 1],
                vec![0, 0, 1, 0, 0, 1, 1],
                vec![0, 0, 0, 1, 1, 1, 1],
            ]
        );
        assert_eq!(code.weight_distribution().unwrap(), vec![1, 0, 0, 7, 7, 0, 0, 1]);
        // Perfect code: every coset leader has weight at most 1.
        assert_eq!(code.coset_leader_weight_distribution().unwrap()[..2], [1, 7]);
    }

    #[test]
    fn test_known_distance_matches_enumeration() {
        for mu in 2..=4 {
            for extended in [false, true] {
                let code = BlockCode::hamming(mu, extended).unwrap();
                let weights = code.weight_distribution().unwrap();
                let d = (1..weights.len()).find(|&w| weights[w] > 0).unwrap();
                assert_eq!(d, code.minimum_distance());
            }
        }
    }

    #[test]
    fn test_extended_hamming_corrects_and_detects() {
        let code = BlockCode::hamming(3, true).unwrap();
        assert_eq!((code.length(), code.dimension()), (8, 4));
        let c = code.encode(&[1, 0, 1, 1]).unwrap();
        for i in 0..8 {
            let mut r = c.clone();
            r[i] ^= 1;
            let decoded = code.decode(&r).unwrap();
            assert_eq!(decoded.codeword, c);
            assert!(!decoded.uncorrectable);
            for j in (i + 1)..8 {
                let mut r2 = r.clone();
                r2[j] ^= 1;
                assert!(code.decode(&r2).unwrap().uncorrectable);
            }
        }
    }

    #[test]
    fn test_simplex() {
        let code = BlockCode::simplex(3).unwrap();
        assert_eq!((code.length(), code.dimension(), code.minimum_distance()), (7, 3, 4));
        assert_eq!(code.weight_distribution().unwrap(), vec![1, 0, 0, 0, 7, 0, 0, 0]);
        let message = vec![1, 1, 0];
        let c = code.encode(&message).unwrap();
        let mut r = c.clone();
        r[2] ^= 1;
        assert_eq!(code.decode(&r).unwrap().message, message);
        // Simplex code is the dual of the Hamming code.
        let hamming = BlockCode::hamming(3, false).unwrap();
        for m in 0..8u64 {
            let c = code.encode(&bits::int_to_bits(m, 3)).unwrap();
            for row in hamming.generator_matrix().rows() {
                let dot = row.iter().zip(&c).fold(0, |acc, (&a, &b)| acc ^ (a & b));
                assert_eq!(dot, 0);
            }
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(BlockCode::hamming(1, false).is_err());
        assert!(BlockCode::simplex(1).is_err());
        assert!(matches!(BlockCode::hamming(12, false), Err(Error::UnsupportedParameter(_))));
        assert!(matches!(BlockCode::hamming(16, true), Err(Error::UnsupportedParameter(_))));
        assert!(matches!(BlockCode::simplex(12), Err(Error::UnsupportedParameter(_))));
        assert!(matches!(BlockCode::hamming(17, false), Err(Error::InvalidParameter(_))));
    }
}
