//! # gf2code
//!
//! gf2code provides error-control coding over GF(2): finite field and
//! polynomial arithmetic, linear block codes with their classical decoders,
//! convolutional codes with Viterbi decoding, and cyclic redundancy checks.
//!
//! ## Modules
//!
//! - `galois`: arithmetic in GF(2^m) with shared log/antilog tables
//! - `polynomial`: polynomials and polynomial fractions over GF(2)
//! - `matrix`: GF(2) matrix helpers (row reduction, null space, inverse)
//! - `block`: linear block codes and their decoders, Slepian arrays
//! - `coder`: block encoder/decoder adapters for arbitrary-length streams
//! - `fsm`: finite-state machines and the Viterbi algorithm
//! - `convolutional`: convolutional codes, terminated codes and stream coders
//! - `crc`: cyclic redundancy checks
//! - `config`: serializable code construction parameters
//! - `error`: the crate error type
//!
//! ## Conventions
//!
//! Bit sequences are slices of `u8` holding 0 or 1. Converting a bit vector
//! to an integer gives bit i the weight 2^i, and the coefficient of x^i of a
//! polynomial is bit i of its bit vector.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

// Re-export error types
pub use crate::error::{Error, Result};

mod bits;

pub mod block;
pub mod coder;
pub mod config;
pub mod convolutional;
pub mod crc;
pub mod error;
pub mod fsm;
pub mod galois;
pub mod matrix;
pub mod polynomial;

pub mod prelude {
    //! Prelude module that re-exports commonly used types and functions.

    pub use crate::block::{
        BlockCode, CodeFamily, Decoded, DecodingMethod, InformationSet, LinearCode, SlepianArray,
    };
    pub use crate::coder::{BlockDecoded, BlockDecoder, BlockEncoder, Padding};
    pub use crate::config::{CodeConfig, FamilyConfig};
    pub use crate::convolutional::{
        ConvolutionalCode, ConvolutionalStreamDecoder, ConvolutionalStreamEncoder,
        TerminatedConvolutionalCode, TerminationMode,
    };
    pub use crate::crc::CyclicRedundancyCheck;
    pub use crate::error::{Error, Result};
    pub use crate::fsm::{FiniteStateMachine, MetricMemory, ViterbiSurvivors};
    pub use crate::galois::FiniteField;
    pub use crate::polynomial::{BinaryPolynomial, BinaryPolynomialFraction};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_block_pipeline() {
        let code = Arc::new(BlockCode::golay(true).unwrap());
        let encoder = BlockEncoder::new(Arc::clone(&code));
        let decoder = BlockDecoder::new(code);
        let message: Vec<u8> = (0..30).map(|i| ((i * 7 + 3) % 5 % 2) as u8).collect();
        let mut sent = encoder.encode(&message).unwrap();
        assert_eq!(sent.len(), 72);
        for i in [0, 5, 13, 30, 47, 50, 66, 70] {
            sent[i] ^= 1;
        }
        let received = decoder.decode(&sent).unwrap();
        assert!(!received.any_uncorrectable());
        assert_eq!(received.message[..30], message[..]);
        assert_eq!(received.message[30..], [0; 6]);
    }

    #[test]
    fn test_crc_over_convolutional_stream() {
        let crc = CyclicRedundancyCheck::crc8();
        let framed = crc.append(&[1, 0, 1, 1, 0, 0, 1, 0, 1, 1]).unwrap();
        let code = ConvolutionalCode::new(vec![vec![0o7, 0o5]]).unwrap();
        let terminated =
            TerminatedConvolutionalCode::new(code, framed.len(), TerminationMode::ZeroTermination).unwrap();
        let mut sent = terminated.encode(&framed).unwrap();
        sent[3] ^= 1;
        sent[20] ^= 1;
        let decoded = terminated.decode(&sent).unwrap();
        assert!(crc.verify(&decoded.message).unwrap());
    }
}
