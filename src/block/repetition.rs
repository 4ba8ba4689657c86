//! Repetition codes.

use ndarray::Array2;

use super::{BlockCode, CodeFamily, DecodingMethod};
use crate::bits;
use crate::error::{Error, Result};

impl BlockCode {
    /// Repetition code (n, 1, n): the single message bit is sent n times.
    pub fn repetition(length: usize) -> Result<Self> {
        if length == 0 {
            return Err(Error::InvalidParameter("repetition code length must be positive".into()));
        }
        let generator = Array2::ones((1, length));
        // Each check compares position 0 with one other position.
        let check = Array2::from_shape_fn((length - 1, length), |(i, j)| u8::from(j == 0 || j == i + 1));
        let recovery = Array2::from_shape_fn((length, 1), |(p, _)| u8::from(p == 0));
        Ok(Self::from_parts(CodeFamily::Repetition, generator, check, recovery).with_known_distance(length))
    }
}

/// Majority vote. A tie (even length, equal counts) decodes to 0 and is flagged.
pub(super) fn decode_majority(code: &BlockCode, received: &[u8]) -> Result<(Vec<u8>, bool)> {
    if code.family != CodeFamily::Repetition {
        return Err(code.unsupported(DecodingMethod::Majority));
    }
    let ones = bits::weight(received);
    let zeros = received.len() - ones;
    let bit = u8::from(ones > zeros);
    Ok((vec![bit; received.len()], ones == zeros))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority() {
        let code = BlockCode::repetition(5).unwrap();
        assert_eq!(code.encode(&[1]).unwrap(), vec![1; 5]);
        let decoded = code.decode(&[1, 0, 1, 1, 0]).unwrap();
        assert_eq!(decoded.message, vec![1]);
        assert_eq!(decoded.corrections, 2);
        assert!(!decoded.uncorrectable);
        assert_eq!(code.decode(&[0, 0, 1, 0, 1]).unwrap().message, vec![0]);
    }

    #[test]
    fn test_tie_decodes_to_zero_and_flags() {
        let code = BlockCode::repetition(4).unwrap();
        let decoded = code.decode(&[1, 1, 0, 0]).unwrap();
        assert_eq!(decoded.message, vec![0]);
        assert!(decoded.uncorrectable);
    }

    #[test]
    fn test_check_matrix_and_table_agree() {
        let code = BlockCode::repetition(5).unwrap();
        assert_eq!(code.minimum_distance(), 5);
        let table = code.decode_with(DecodingMethod::SyndromeTable, &[1, 0, 1, 1, 0]).unwrap();
        assert_eq!(table.message, vec![1]);
        assert!(code.is_codeword(&[1; 5]).unwrap());
        assert!(!code.is_codeword(&[1, 1, 0, 1, 1]).unwrap());
        assert!(BlockCode::repetition(0).is_err());
    }
}
