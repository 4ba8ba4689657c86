//! Cordaro-Wagner codes, the optimal (n, 2) codes.

use ndarray::Array2;

use super::{BlockCode, CodeFamily};
use crate::error::{Error, Result};
use crate::matrix;

impl BlockCode {
    /// Cordaro-Wagner (n, 2) code with minimum distance floor(2n / 3).
    ///
    /// Columns of the generator are (1, 0), (0, 1) and (1, 1) in counts as equal
    /// as possible, so all three nonzero codewords have near-equal weight.
    pub fn cordaro_wagner(length: usize) -> Result<Self> {
        if length < 2 {
            return Err(Error::InvalidParameter(format!(
                "Cordaro-Wagner code needs length >= 2 (got {})",
                length
            )));
        }
        let (q, r) = (length / 3, length % 3);
        let (first, second) = if r == 2 { (q + 1, q + 1) } else { (q, q) };
        let generator = Array2::from_shape_fn((2, length), |(i, j)| {
            let column = if j < first {
                [1, 0]
            } else if j < first + second {
                [0, 1]
            } else {
                [1, 1]
            };
            column[i]
        });
        let check = matrix::null_space(&generator);
        let recovery = matrix::right_inverse(&generator)?;
        Ok(Self::from_parts(CodeFamily::CordaroWagner, generator, check, recovery)
            .with_known_distance(2 * length / 3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_matches_enumeration() {
        for n in 2..=12 {
            let code = BlockCode::cordaro_wagner(n).unwrap();
            let weights = code.weight_distribution().unwrap();
            let d = (1..weights.len()).find(|&w| weights[w] > 0).unwrap();
            assert_eq!(d, 2 * n / 3, "n = {}", n);
            assert_eq!(code.dimension(), 2);
        }
    }

    #[test]
    fn test_decoding() {
        let code = BlockCode::cordaro_wagner(6).unwrap();
        let c = code.encode(&[1, 1]).unwrap();
        let mut r = c.clone();
        r[0] ^= 1;
        let decoded = code.decode(&r).unwrap();
        assert_eq!(decoded.message, vec![1, 1]);
        assert!(!decoded.uncorrectable);
    }
}
