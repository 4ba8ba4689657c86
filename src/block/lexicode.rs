//! Lexicographic codes.
//!
//! The lexicode of length n and distance d is built greedily: scanning all
//! words in increasing integer order (LSB first), a word is kept when it is at
//! distance at least d from every word kept so far. The result is linear, and
//! the word kept at position 2^j is the smallest word at distance at least d
//! from the span of the earlier ones. Construction grows that basis directly,
//! tracking which words lie within distance d - 1 of the current code.

use tracing::debug;

use super::{BlockCode, CodeFamily};
use crate::bits;
use crate::error::{Error, Result};
use crate::matrix;

/// Largest length for which lexicodes are enumerated.
pub const MAX_LEXICODE_LENGTH: usize = 24;

impl BlockCode {
    /// Lexicode with the given length and minimum distance, 1 <= d <= n <= 24.
    ///
    /// Construction takes O(n 2^n) time and 2^n bytes; decoding defaults to exhaustive search,
    /// whose ties go to the smallest codeword, matching the construction order.
    pub fn lexicode(length: usize, minimum_distance: usize) -> Result<Self> {
        if !(1..=MAX_LEXICODE_LENGTH).contains(&length) {
            return Err(Error::UnsupportedParameter(format!(
                "lexicode length must be between 1 and {} (got {})",
                MAX_LEXICODE_LENGTH, length
            )));
        }
        if !(1..=length).contains(&minimum_distance) {
            return Err(Error::InvalidParameter(format!(
                "lexicode distance must satisfy 1 <= d <= {} (got {})",
                length, minimum_distance
            )));
        }
        let basis = greedy_basis(length, minimum_distance as u32);
        let dimension = basis.len();
        debug!(length, minimum_distance, dimension, "built lexicode");
        let rows: Vec<Vec<u8>> = basis
            .iter()
            .map(|&b| bits::int_to_bits(u64::from(b), length))
            .collect();
        let generator = matrix::from_rows(&rows)?;
        let code = Self::from_generator_matrix(generator)?;
        Ok(code
            .with_family(CodeFamily::Lexicode { minimum_distance })
            .with_known_distance(minimum_distance))
    }
}

/// Basis b_0 < b_1 < ... of the lexicode, each the smallest uncovered word.
fn greedy_basis(length: usize, d: u32) -> Vec<u32> {
    let size = 1usize << length;
    // covered[x]: x is within distance d - 1 of some codeword
    let mut covered: Vec<bool> = (0..size).map(|x| (x as u32).count_ones() < d).collect();
    let mut basis = Vec::new();
    let mut next = 1;
    while let Some(offset) = covered[next..].iter().position(|&c| !c) {
        let b = next + offset;
        basis.push(b as u32);
        // covered |= covered ^ b, pairing x with x ^ b across b's top bit
        let top = 1usize << (usize::BITS - 1 - b.leading_zeros());
        for base in (0..size).step_by(2 * top) {
            for x in base..base + top {
                let y = x ^ b;
                let either = covered[x] || covered[y];
                covered[x] = either;
                covered[y] = either;
            }
        }
        next = b + 1;
    }
    basis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::DecodingMethod;

    #[test]
    fn test_lexicode_parameters() {
        // Lexicodes with d = 3 are the Hamming codes at n = 2^m - 1.
        let code = BlockCode::lexicode(7, 3).unwrap();
        assert_eq!((code.length(), code.dimension()), (7, 4));
        let code = BlockCode::lexicode(8, 4).unwrap();
        assert_eq!(code.dimension(), 4);
        let code = BlockCode::lexicode(5, 1).unwrap();
        assert_eq!(code.dimension(), 5);
    }

    #[test]
    fn test_codewords_follow_construction_order() {
        let code = BlockCode::lexicode(6, 3).unwrap();
        let words = code.codewords().unwrap();
        let ints: Vec<u64> = words.iter().map(|w| bits::bits_to_int(w)).collect();
        assert_eq!(ints[..4], [0, 7, 25, 30]);
        let mut sorted = ints.clone();
        sorted.sort_unstable();
        assert_eq!(ints, sorted);
        assert_eq!(code.minimum_distance(), 3);
    }

    #[test]
    fn test_tie_goes_to_smallest_codeword() {
        let code = BlockCode::lexicode(4, 2).unwrap();
        assert_eq!(code.default_method(), DecodingMethod::ExhaustiveSearch);
        // 1000 is at distance 1 from 0000 (0), 1100 (3), 1010 (5) and 1001 (9).
        let decoded = code.decode(&[1, 0, 0, 0]).unwrap();
        assert_eq!(decoded.codeword, vec![0, 0, 0, 0]);
        assert!(decoded.uncorrectable);
    }

    #[test]
    fn test_basis_matches_word_by_word_scan() {
        for (n, d) in [(6, 3), (7, 2), (9, 4), (10, 5)] {
            let mut kept: Vec<u32> = vec![0];
            for word in 1..(1u32 << n) {
                if kept.iter().all(|&c| (word ^ c).count_ones() >= d) {
                    kept.push(word);
                }
            }
            let basis = greedy_basis(n, d);
            assert_eq!(kept.len(), 1 << basis.len());
            for (j, &b) in basis.iter().enumerate() {
                assert_eq!(kept[1 << j], b, "n = {}, d = {}", n, d);
            }
        }
    }

    #[test]
    fn test_full_length_lexicodes() {
        // d = 2 gives the even-weight code, d = 8 the extended Golay code.
        let parity = BlockCode::lexicode(MAX_LEXICODE_LENGTH, 2).unwrap();
        assert_eq!(parity.dimension(), 23);
        let golay = BlockCode::lexicode(MAX_LEXICODE_LENGTH, 8).unwrap();
        assert_eq!(golay.dimension(), 12);
        assert_eq!(golay.minimum_distance(), 8);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(BlockCode::lexicode(0, 1).is_err());
        assert!(BlockCode::lexicode(5, 6).is_err());
        assert!(matches!(BlockCode::lexicode(25, 3), Err(Error::UnsupportedParameter(_))));
    }
}
