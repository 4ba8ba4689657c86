//! Binary Golay codes.

use ndarray::{s, Array2};

use super::{BlockCode, CodeFamily, CyclicStructure};
use crate::error::Result;
use crate::matrix;
use crate::polynomial::BinaryPolynomial;

/// Generator polynomial x^11 + x^9 + x^7 + x^6 + x^5 + x + 1 of the (23, 12) code.
pub const GOLAY_GENERATOR: u64 = 0b101011100011;

impl BlockCode {
    /// Golay (23, 12, 7) code in systematic cyclic form, or the extended
    /// (24, 12, 8) code with an overall parity bit appended.
    ///
    /// Decoding defaults to the syndrome table (2^11 or 2^12 cosets).
    pub fn golay(extended: bool) -> Result<Self> {
        let structure = CyclicStructure::new(23, BinaryPolynomial::from_u64(GOLAY_GENERATOR), true)?;
        if !extended {
            return Ok(Self::from_cyclic(CodeFamily::Golay { extended }, structure).with_known_distance(7));
        }
        let base = structure.generator_matrix();
        let mut generator = Array2::zeros((12, 24));
        generator.slice_mut(s![.., ..23]).assign(&base);
        for (i, row) in base.rows().into_iter().enumerate() {
            generator[[i, 23]] = row.iter().fold(0, |acc, &b| acc ^ b);
        }
        let check = matrix::null_space(&generator);
        // Message lies in positions 11..23, as in the cyclic form.
        let recovery = Array2::from_shape_fn((24, 12), |(p, i)| u8::from(p == 11 + i));
        Ok(Self::from_parts(CodeFamily::Golay { extended }, generator, check, recovery).with_known_distance(8))
    }
}
