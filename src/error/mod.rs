//! Error handling for the gf2code library.
//!
//! This module defines the error types used throughout the crate. Construction
//! errors are fatal to the caller; decode-time uncorrectable patterns are
//! reported through [`crate::block::Decoded`] and only become an
//! [`Error::Uncorrectable`] when the caller asks for it.

use thiserror::Error;

/// Result type used throughout the gf2code crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error enum for the gf2code crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed construction input
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The field modulus is not irreducible of the requested degree, or no
    /// default modulus exists for that degree
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// The generator polynomial does not divide x^n - 1
    #[error("Invalid generator polynomial: {0}")]
    InvalidGenerator(String),

    /// Field or polynomial division (or inversion) by zero
    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    /// Input length incompatible with the block size
    #[error("Length error: expected {expected}, got {actual}")]
    Length {
        /// Expected length (or block multiple)
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Decoding found an error pattern outside the correction radius
    #[error("Uncorrectable error pattern: estimate differs from the received word in {detected} positions (correction capability {correctable})")]
    Uncorrectable {
        /// Number of positions where the best-effort estimate differs from the received word
        detected: usize,
        /// Guaranteed correction capability of the code
        correctable: usize,
    },

    /// The requested parameters have no construction in this crate
    #[error("Unsupported parameter: {0}")]
    UnsupportedParameter(String),

    /// Error during configuration serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns true for errors raised while constructing a code or field.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidParameter(_)
                | Error::InvalidField(_)
                | Error::InvalidGenerator(_)
                | Error::UnsupportedParameter(_)
        )
    }
}

/// Checks that every element of a bit sequence is 0 or 1.
pub(crate) fn check_bits(bits: &[u8]) -> Result<()> {
    match bits.iter().position(|&b| b > 1) {
        Some(i) => Err(Error::InvalidParameter(format!(
            "bit sequences may only contain 0 and 1 (found {} at index {})",
            bits[i], i
        ))),
        None => Ok(()),
    }
}

/// Checks that a bit sequence has exactly the expected length.
pub(crate) fn check_length(bits: &[u8], expected: usize) -> Result<()> {
    if bits.len() != expected {
        return Err(Error::Length {
            expected,
            actual: bits.len(),
        });
    }
    check_bits(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_bits() {
        assert!(check_bits(&[0, 1, 1, 0]).is_ok());
        assert!(matches!(check_bits(&[0, 2]), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_check_length() {
        assert!(check_length(&[0, 1, 1], 3).is_ok());
        assert!(matches!(
            check_length(&[0, 1], 3),
            Err(Error::Length { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_construction_classification() {
        assert!(Error::InvalidField("x".into()).is_construction_error());
        assert!(!Error::DivisionByZero("x".into()).is_construction_error());
        assert!(!Error::Uncorrectable { detected: 3, correctable: 1 }.is_construction_error());
    }
}
