//! Cyclic redundancy checks.
//!
//! The first bit of a message is its highest-order coefficient, as in the
//! usual shift-register description of CRCs; the checksum is likewise emitted
//! highest-order bit first. Detection only, no correction.

use crate::error::{check_bits, Error, Result};
use crate::polynomial::BinaryPolynomial;

/// Largest supported generator degree (register width).
pub const MAX_CRC_WIDTH: usize = 64;

/// A CRC with generator g(x) of degree w, initial register value and final XOR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicRedundancyCheck {
    generator: BinaryPolynomial,
    width: usize,
    /// g(x) without its x^w term
    taps: u64,
    initial_value: u64,
    final_xor: u64,
}

impl CyclicRedundancyCheck {
    /// CRC with the given generator, zero initial value and no final XOR.
    ///
    /// # Errors
    ///
    /// The generator needs degree 1..=64 and a constant term of 1, so that
    /// every single-bit error is detected.
    pub fn new(generator: BinaryPolynomial) -> Result<Self> {
        let degree = generator.degree();
        if degree < 1 {
            return Err(Error::InvalidParameter(format!(
                "CRC generator {} must have degree >= 1",
                generator
            )));
        }
        let width = degree as usize;
        if width > MAX_CRC_WIDTH {
            return Err(Error::UnsupportedParameter(format!(
                "CRC width {} exceeds {}",
                width, MAX_CRC_WIDTH
            )));
        }
        if generator.coefficient(0) == 0 {
            return Err(Error::InvalidParameter(format!(
                "CRC generator {} must have a constant term",
                generator
            )));
        }
        let taps = (0..width).fold(0u64, |acc, i| acc | (u64::from(generator.coefficient(i)) << i));
        Ok(Self {
            generator,
            width,
            taps,
            initial_value: 0,
            final_xor: 0,
        })
    }

    fn preset(generator: u64, width: usize, initial_value: u64, final_xor: u64) -> Self {
        Self {
            generator: BinaryPolynomial::from_u64(generator),
            width,
            taps: generator & ((1u64 << width) - 1),
            initial_value,
            final_xor,
        }
    }

    /// CRC-8 with g = x^8 + x^2 + x + 1.
    pub fn crc8() -> Self {
        Self::preset(0x107, 8, 0, 0)
    }

    /// CRC-16/CCITT-FALSE: g = x^16 + x^12 + x^5 + 1, initial value 0xFFFF.
    pub fn crc16_ccitt() -> Self {
        Self::preset(0x1_1021, 16, 0xFFFF, 0)
    }

    /// CRC-32 (BZIP2 bit order): g = 0x104C11DB7, initial value and final XOR all ones.
    pub fn crc32() -> Self {
        Self::preset(0x1_04C1_1DB7, 32, 0xFFFF_FFFF, 0xFFFF_FFFF)
    }

    fn check_register(&self, value: u64, what: &str) -> Result<()> {
        if self.width < 64 && value >> self.width != 0 {
            return Err(Error::InvalidParameter(format!(
                "{} {:#x} does not fit in {} bits",
                what, value, self.width
            )));
        }
        Ok(())
    }

    /// Sets the register value before the first message bit.
    pub fn with_initial_value(mut self, value: u64) -> Result<Self> {
        self.check_register(value, "initial value")?;
        self.initial_value = value;
        Ok(self)
    }

    /// Sets the value XORed into the register after the last message bit.
    pub fn with_final_xor(mut self, value: u64) -> Result<Self> {
        self.check_register(value, "final XOR")?;
        self.final_xor = value;
        Ok(self)
    }

    /// Generator polynomial.
    pub fn generator(&self) -> &BinaryPolynomial {
        &self.generator
    }

    /// Number of check bits w.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Checksum as an integer (bit w - 1 is the first check bit).
    pub fn checksum_value(&self, message: &[u8]) -> Result<u64> {
        check_bits(message)?;
        let top = 1u64 << (self.width - 1);
        let mask = if self.width == 64 { u64::MAX } else { (1u64 << self.width) - 1 };
        let mut register = self.initial_value;
        for &bit in message {
            let feedback = (register & top != 0) ^ (bit == 1);
            register = (register << 1) & mask;
            if feedback {
                register ^= self.taps;
            }
        }
        Ok(register ^ self.final_xor)
    }

    /// The w check bits of a message.
    pub fn checksum(&self, message: &[u8]) -> Result<Vec<u8>> {
        let value = self.checksum_value(message)?;
        Ok((0..self.width)
            .rev()
            .map(|i| ((value >> i) & 1) as u8)
            .collect())
    }

    /// Message followed by its check bits.
    pub fn append(&self, message: &[u8]) -> Result<Vec<u8>> {
        let mut framed = message.to_vec();
        framed.extend(self.checksum(message)?);
        Ok(framed)
    }

    /// Returns true if the trailing w bits are the checksum of the rest.
    pub fn verify(&self, received: &[u8]) -> Result<bool> {
        if received.len() < self.width {
            return Err(Error::Length {
                expected: self.width,
                actual: received.len(),
            });
        }
        let (message, check) = received.split_at(received.len() - self.width);
        check_bits(check)?;
        Ok(self.checksum(message)? == check)
    }
}
