//! Slepian arrays (standard arrays).
//!
//! Row i holds the coset whose syndrome integer is i, led by its coset leader;
//! column j holds the translates of the codeword for message integer j. Table
//! size is 2^n entries, so construction is limited to short codes.

use tracing::debug;

use super::{BlockCode, MAX_TABLE_REDUNDANCY};
use crate::bits;
use crate::error::{check_length, Error, Result};

/// Largest code length accepted by [`SlepianArray::new`].
pub const MAX_ARRAY_LENGTH: usize = MAX_TABLE_REDUNDANCY;

/// Standard array of a block code: 2^(n-k) rows by 2^k columns.
#[derive(Debug, Clone)]
pub struct SlepianArray {
    code: BlockCode,
    leaders: Vec<Vec<u8>>,
    codewords: Vec<Vec<u8>>,
}

impl SlepianArray {
    /// Builds the array for a code with n <= 24.
    pub fn new(code: &BlockCode) -> Result<Self> {
        if code.length() > MAX_ARRAY_LENGTH {
            return Err(Error::UnsupportedParameter(format!(
                "Slepian arrays need length <= {} (got {})",
                MAX_ARRAY_LENGTH,
                code.length()
            )));
        }
        let leaders = code.coset_leaders()?;
        let codewords = code.codewords()?;
        debug!(
            rows = leaders.len(),
            columns = codewords.len(),
            "built Slepian array"
        );
        Ok(Self {
            leaders,
            codewords,
            code: code.clone(),
        })
    }

    /// The underlying code.
    pub fn code(&self) -> &BlockCode {
        &self.code
    }

    /// Number of rows, 2^(n-k).
    pub fn rows(&self) -> usize {
        self.leaders.len()
    }

    /// Number of columns, 2^k.
    pub fn columns(&self) -> usize {
        self.codewords.len()
    }

    /// Entry (i, j): coset leader i plus codeword j.
    pub fn entry(&self, i: usize, j: usize) -> Result<Vec<u8>> {
        self.check_index(i, self.rows(), "row")?;
        self.check_index(j, self.columns(), "column")?;
        Ok(self.leaders[i]
            .iter()
            .zip(&self.codewords[j])
            .map(|(a, b)| a ^ b)
            .collect())
    }

    /// Row i, the coset with syndrome integer i.
    pub fn row(&self, i: usize) -> Result<Vec<Vec<u8>>> {
        (0..self.columns()).map(|j| self.entry(i, j)).collect()
    }

    /// Column j. Column 0 lists the coset leaders.
    pub fn col(&self, j: usize) -> Result<Vec<Vec<u8>>> {
        (0..self.rows()).map(|i| self.entry(i, j)).collect()
    }

    /// Position (row, column) of a received word in the array.
    pub fn locate(&self, received: &[u8]) -> Result<(usize, usize)> {
        check_length(received, self.code.length())?;
        let i = bits::bits_to_int(&self.code.syndrome(received)?) as usize;
        let codeword: Vec<u8> = received
            .iter()
            .zip(&self.leaders[i])
            .map(|(a, b)| a ^ b)
            .collect();
        let j = bits::bits_to_int(&self.code.extract_message(&codeword)) as usize;
        Ok((i, j))
    }

    /// Head of the column containing the received word.
    ///
    /// This is always a nearest codeword; no uncorrectable flag is produced.
    pub fn nearest_codeword(&self, received: &[u8]) -> Result<Vec<u8>> {
        let (_, j) = self.locate(received)?;
        Ok(self.codewords[j].clone())
    }

    /// Message of the nearest codeword.
    pub fn decode(&self, received: &[u8]) -> Result<Vec<u8>> {
        let (_, j) = self.locate(received)?;
        Ok(bits::int_to_bits(j as u64, self.code.dimension()))
    }

    fn check_index(&self, index: usize, bound: usize, what: &str) -> Result<()> {
        if index >= bound {
            return Err(Error::InvalidParameter(format!(
                "{} index {} out of range 0..{}",
                what, index, bound
            )));
        }
        Ok(())
    }
}
