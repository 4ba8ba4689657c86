//! Reed-Muller codes and Reed majority-logic decoding.
//!
//! Position j of a codeword is the evaluation point whose variable v is bit v
//! of j. Generator rows are the monomials of degree 0..=rho, by degree and then
//! by variable set.

use itertools::Itertools;
use ndarray::Array2;

use super::{check_matrix_size, BlockCode, CodeFamily, DecodingMethod};
use crate::error::{Error, Result};
use crate::matrix;

fn monomials(rho: usize, mu: usize) -> Vec<Vec<usize>> {
    (0..=rho).flat_map(|deg| (0..mu).combinations(deg)).collect()
}

fn mask(vars: &[usize]) -> usize {
    vars.iter().fold(0, |acc, &v| acc | (1 << v))
}

impl BlockCode {
    /// Reed-Muller code RM(rho, mu) with 0 <= rho < mu: n = 2^mu,
    /// k = sum of C(mu, i) for i <= rho, d = 2^(mu - rho).
    pub fn reed_muller(rho: usize, mu: usize) -> Result<Self> {
        if mu == 0 || mu > 16 || rho >= mu {
            return Err(Error::InvalidParameter(format!(
                "Reed-Muller code needs 0 <= rho < mu <= 16 (got rho = {}, mu = {})",
                rho, mu
            )));
        }
        let n = 1usize << mu;
        let rows = monomials(rho, mu);
        check_matrix_size(n, rows.len())?;
        let generator = Array2::from_shape_fn((rows.len(), n), |(i, j)| {
            let m = mask(&rows[i]);
            u8::from(j & m == m)
        });
        let check = matrix::null_space(&generator);
        let recovery = matrix::right_inverse(&generator)?;
        Ok(Self::from_parts(CodeFamily::ReedMuller { rho, mu }, generator, check, recovery)
            .with_known_distance(1 << (mu - rho)))
    }
}

pub(super) fn decode_reed_majority(code: &BlockCode, received: &[u8]) -> Result<(Vec<u8>, bool)> {
    let (rho, mu) = match code.family {
        CodeFamily::ReedMuller { rho, mu } => (rho, mu),
        _ => return Err(code.unsupported(DecodingMethod::ReedMajority)),
    };
    let rows = monomials(rho, mu);
    let mut word = received.to_vec();
    let mut message = vec![0u8; rows.len()];
    let mut tie = false;
    let mut end = rows.len();
    for deg in (0..=rho).rev() {
        let start = end - rows[..end].iter().rev().take_while(|r| r.len() == deg).count();
        for (index, vars) in rows.iter().enumerate().take(end).skip(start) {
            let inside = mask(vars);
            let outside: Vec<usize> = (0..mu).filter(|v| !vars.contains(v)).collect();
            let checks = 1usize << outside.len();
            let mut ones = 0;
            // Each check sums the word over one coset of the subcube spanned by `vars`.
            for a in 0..checks {
                let base = outside
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| (a >> bit) & 1 == 1)
                    .fold(0, |acc, (_, &v)| acc | (1 << v));
                let mut parity = 0u8;
                let mut sub = inside;
                loop {
                    parity ^= word[base | sub];
                    if sub == 0 {
                        break;
                    }
                    sub = (sub - 1) & inside;
                }
                ones += usize::from(parity);
            }
            if 2 * ones == checks {
                tie = true;
            }
            message[index] = u8::from(2 * ones > checks);
        }
        for index in start..end {
            if message[index] == 1 {
                for (w, &g) in word.iter_mut().zip(code.generator_matrix().row(index)) {
                    *w ^= g;
                }
            }
        }
        end = start;
    }
    Ok((matrix::vector_matrix(&message, code.generator_matrix()), tie))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits;
    use rand::seq::index::sample;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_parameters() {
        for (rho, mu, k) in [(0, 3, 1), (1, 3, 4), (2, 4, 11), (1, 5, 6)] {
            let code = BlockCode::reed_muller(rho, mu).unwrap();
            assert_eq!((code.length(), code.dimension()), (1 << mu, k));
        }
        let code = BlockCode::reed_muller(1, 3).unwrap();
        assert_eq!(code.minimum_distance(), 4);
        assert_eq!(code.weight_distribution().unwrap(), vec![1, 0, 0, 0, 14, 0, 0, 0, 1]);
        assert!(BlockCode::reed_muller(3, 3).is_err());
        assert!(matches!(BlockCode::reed_muller(0, 12), Err(Error::UnsupportedParameter(_))));
        assert!(matches!(BlockCode::reed_muller(8, 16), Err(Error::UnsupportedParameter(_))));
    }

    #[test]
    fn test_generator_rows() {
        let code = BlockCode::reed_muller(1, 3).unwrap();
        assert_eq!(
            matrix::to_rows(code.generator_matrix()),
            vec![
                vec![1, 1, 1, 1, 1, 1, 1, 1],
                vec![0, 1, 0, 1, 0, 1, 0, 1],
                vec![0, 0, 1, 1, 0, 0, 1, 1],
                vec![0, 0, 0, 0, 1, 1, 1, 1],
            ]
        );
    }

    #[test]
    fn test_round_trip() {
        let code = BlockCode::reed_muller(2, 4).unwrap();
        for m in (0..2048u64).step_by(37) {
            let message = bits::int_to_bits(m, 11);
            let c = code.encode(&message).unwrap();
            let decoded = code.decode(&c).unwrap();
            assert_eq!(decoded.message, message);
            assert!(!decoded.uncorrectable);
        }
    }

    #[test]
    fn test_majority_corrects_up_to_radius() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for (rho, mu) in [(1, 4), (1, 5), (2, 5)] {
            let code = BlockCode::reed_muller(rho, mu).unwrap();
            let (n, k, t) = (code.length(), code.dimension(), code.packing_radius());
            for _ in 0..30 {
                let message: Vec<u8> = (0..k).map(|_| rng.random_range(0..2u8)).collect();
                let c = code.encode(&message).unwrap();
                let weight = rng.random_range(0..=t);
                let mut r = c.clone();
                for i in sample(&mut rng, n, weight) {
                    r[i] ^= 1;
                }
                let decoded = code.decode(&r).unwrap();
                assert_eq!(decoded.message, message);
                assert!(!decoded.uncorrectable);
            }
        }
    }

    #[test]
    fn test_tie_is_flagged() {
        let code = BlockCode::reed_muller(1, 3).unwrap();
        // Two errors on the zero codeword of a d = 4 code.
        let decoded = code.decode(&[1, 1, 0, 0, 0, 0, 0, 0]).unwrap();
        assert!(decoded.uncorrectable);
    }
}
