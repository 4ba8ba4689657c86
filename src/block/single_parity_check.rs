//! Single parity check codes.

use ndarray::{s, Array2};

use super::{BlockCode, CodeFamily};
use crate::error::{Error, Result};
use crate::matrix;

impl BlockCode {
    /// Single parity check code (n, n - 1, 2): the last bit makes the weight even.
    pub fn single_parity_check(length: usize) -> Result<Self> {
        if length < 2 {
            return Err(Error::InvalidParameter(format!(
                "single parity check code needs length >= 2 (got {})",
                length
            )));
        }
        let k = length - 1;
        let mut generator = Array2::zeros((k, length));
        generator.slice_mut(s![.., ..k]).assign(&matrix::identity(k));
        generator.slice_mut(s![.., k]).fill(1);
        let check = Array2::ones((1, length));
        let recovery = Array2::from_shape_fn((length, k), |(p, i)| u8::from(p == i));
        Ok(Self::from_parts(CodeFamily::SingleParityCheck, generator, check, recovery).with_known_distance(2))
    }
}
