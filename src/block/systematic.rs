//! Systematic block codes.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{BlockCode, CodeFamily};
use crate::error::{Error, Result};
use crate::matrix;

/// Where the message bits sit inside a systematic codeword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InformationSet {
    /// The first k positions, G = [I | P]
    Left,
    /// The last k positions, G = [P | I]
    Right,
    /// Explicit positions, in message order
    Positions(Vec<usize>),
}

impl InformationSet {
    fn positions(&self, length: usize, dimension: usize) -> Result<Vec<usize>> {
        let positions = match self {
            InformationSet::Left => (0..dimension).collect(),
            InformationSet::Right => (length - dimension..length).collect(),
            InformationSet::Positions(p) => p.clone(),
        };
        if positions.len() != dimension {
            return Err(Error::InvalidParameter(format!(
                "information set has {} positions, expected {}",
                positions.len(),
                dimension
            )));
        }
        let mut seen = vec![false; length];
        for &p in &positions {
            if p >= length || seen[p] {
                return Err(Error::InvalidParameter(format!(
                    "information set position {} is out of range or repeated",
                    p
                )));
            }
            seen[p] = true;
        }
        Ok(positions)
    }
}

impl BlockCode {
    /// Creates a systematic code from its k x (n - k) parity submatrix P.
    ///
    /// The message is copied to the information positions and the parity
    /// bits m P fill the remaining positions in increasing order.
    pub fn systematic(parity_submatrix: Array2<u8>, information_set: InformationSet) -> Result<Self> {
        let (k, r) = parity_submatrix.dim();
        if k == 0 {
            return Err(Error::InvalidParameter(
                "parity submatrix must have at least one row".into(),
            ));
        }
        if parity_submatrix.iter().any(|&b| b > 1) {
            return Err(Error::InvalidParameter(
                "parity submatrix entries must be 0 or 1".into(),
            ));
        }
        let n = k + r;
        let info = information_set.positions(n, k)?;
        let parity: Vec<usize> = (0..n).filter(|p| !info.contains(p)).collect();

        let mut generator = Array2::zeros((k, n));
        let mut check = Array2::zeros((r, n));
        let mut recovery = Array2::zeros((n, k));
        for (i, &p) in info.iter().enumerate() {
            generator[[i, p]] = 1;
            recovery[[p, i]] = 1;
            for j in 0..r {
                check[[j, p]] = parity_submatrix[[i, j]];
            }
        }
        for (j, &p) in parity.iter().enumerate() {
            check[[j, p]] = 1;
            for i in 0..k {
                generator[[i, p]] = parity_submatrix[[i, j]];
            }
        }
        Ok(BlockCode::from_parts(CodeFamily::Systematic, generator, check, recovery))
    }

    /// Parity submatrix of a left-systematic generator [I | P], if it has that form.
    pub fn parity_submatrix(&self) -> Option<Array2<u8>> {
        let k = self.dimension();
        let left = self.generator_matrix().slice(ndarray::s![.., ..k]).to_owned();
        if left != matrix::identity(k) {
            return None;
        }
        Some(self.generator_matrix().slice(ndarray::s![.., k..]).to_owned())
    }
}
