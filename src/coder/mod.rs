//! Block encoder and decoder adapters.
//!
//! These split an arbitrary-length bit sequence into code-sized chunks and run
//! the code on each chunk independently. With the `parallel` feature the
//! chunks are processed on the rayon pool; output order is always the input
//! order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::block::{Decoded, DecodingMethod, LinearCode};
use crate::error::{check_bits, Error, Result};

/// What the encoder does with a final chunk shorter than k bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Fail with [`Error::Length`] unless the input is a multiple of k
    Reject,
    /// Fill with zeros
    #[default]
    Zero,
    /// Fill with the given bit
    Value(u8),
}

impl Padding {
    fn fill(self, bits: &[u8], block: usize) -> Result<Vec<u8>> {
        let remainder = bits.len() % block;
        if remainder == 0 {
            return Ok(bits.to_vec());
        }
        let value = match self {
            Padding::Reject => {
                return Err(Error::Length {
                    expected: bits.len() - remainder + block,
                    actual: bits.len(),
                })
            }
            Padding::Zero => 0,
            Padding::Value(v) if v <= 1 => v,
            Padding::Value(v) => {
                return Err(Error::InvalidParameter(format!(
                    "padding value must be 0 or 1 (got {})",
                    v
                )))
            }
        };
        let mut padded = bits.to_vec();
        padded.resize(bits.len() - remainder + block, value);
        Ok(padded)
    }
}

fn map_blocks<T, F>(bits: &[u8], size: usize, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&[u8]) -> Result<T> + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        bits.par_chunks(size).map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        bits.chunks(size).map(f).collect()
    }
}

/// Encodes a bit stream block by block.
#[derive(Debug, Clone)]
pub struct BlockEncoder<C: LinearCode> {
    code: Arc<C>,
    padding: Padding,
}

impl<C: LinearCode> BlockEncoder<C> {
    /// Creates an encoder that zero-pads the final block.
    pub fn new(code: Arc<C>) -> Self {
        Self {
            code,
            padding: Padding::default(),
        }
    }

    /// Sets the padding policy.
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    /// The wrapped code.
    pub fn code(&self) -> &C {
        &self.code
    }

    /// The padding policy.
    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Encodes the input; the output holds ceil(len / k) codewords.
    pub fn encode(&self, bits: &[u8]) -> Result<Vec<u8>> {
        check_bits(bits)?;
        let k = self.code.dimension();
        let padded = self.padding.fill(bits, k)?;
        let blocks = map_blocks(&padded, k, |chunk| self.code.encode(chunk))?;
        Ok(blocks.concat())
    }
}

/// Output of [`BlockDecoder::decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDecoded {
    /// Concatenated message estimates, padding included
    pub message: Vec<u8>,
    /// One flag per block, in block order
    pub uncorrectable: Vec<bool>,
}

impl BlockDecoded {
    /// Returns true if any block was flagged.
    pub fn any_uncorrectable(&self) -> bool {
        self.uncorrectable.iter().any(|&f| f)
    }

    /// Number of decoded blocks.
    pub fn blocks(&self) -> usize {
        self.uncorrectable.len()
    }
}

/// Decodes a bit stream block by block.
#[derive(Debug, Clone)]
pub struct BlockDecoder<C: LinearCode> {
    code: Arc<C>,
    method: Option<DecodingMethod>,
}

impl<C: LinearCode> BlockDecoder<C> {
    /// Creates a decoder using the code's default method.
    pub fn new(code: Arc<C>) -> Self {
        Self { code, method: None }
    }

    /// Uses a specific decoding method for every block.
    pub fn with_method(mut self, method: DecodingMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// The wrapped code.
    pub fn code(&self) -> &C {
        &self.code
    }

    /// Decodes the input, which must be a multiple of n bits long.
    pub fn decode(&self, bits: &[u8]) -> Result<BlockDecoded> {
        check_bits(bits)?;
        let n = self.code.length();
        if bits.len() % n != 0 {
            return Err(Error::Length {
                expected: bits.len().div_ceil(n) * n,
                actual: bits.len(),
            });
        }
        let blocks: Vec<Decoded> = map_blocks(bits, n, |chunk| match self.method {
            Some(method) => self.code.decode_with(method, chunk),
            None => self.code.decode(chunk),
        })?;
        let mut decoded = BlockDecoded {
            message: Vec::with_capacity(blocks.len() * self.code.dimension()),
            uncorrectable: Vec::with_capacity(blocks.len()),
        };
        for block in blocks {
            decoded.uncorrectable.push(block.uncorrectable);
            decoded.message.extend(block.message);
        }
        Ok(decoded)
    }
}
