//! Dense GF(2) matrix helpers over `ndarray`.
//!
//! Matrices are `Array2<u8>` holding 0/1 entries. Products are computed with
//! AND/XOR so that no intermediate ever leaves {0, 1}.

use ndarray::{s, Array2, ArrayView1};

use crate::error::{check_bits, Error, Result};

/// Builds a matrix from rows, checking shape and entries.
pub fn from_rows(rows: &[Vec<u8>]) -> Result<Array2<u8>> {
    let cols = rows.first().map_or(0, Vec::len);
    let mut flat = Vec::with_capacity(rows.len() * cols);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != cols {
            return Err(Error::InvalidParameter(format!(
                "matrix row {} has {} entries, expected {}",
                i,
                row.len(),
                cols
            )));
        }
        check_bits(row)?;
        flat.extend_from_slice(row);
    }
    Array2::from_shape_vec((rows.len(), cols), flat)
        .map_err(|e| Error::InvalidParameter(format!("bad matrix shape: {}", e)))
}

/// Converts a matrix back into rows.
pub fn to_rows(m: &Array2<u8>) -> Vec<Vec<u8>> {
    m.rows().into_iter().map(|r| r.to_vec()).collect()
}

/// The k x k identity matrix.
pub fn identity(k: usize) -> Array2<u8> {
    Array2::from_shape_fn((k, k), |(i, j)| u8::from(i == j))
}

/// Matrix product over GF(2).
pub fn multiply(a: &Array2<u8>, b: &Array2<u8>) -> Array2<u8> {
    let mut out = Array2::zeros((a.nrows(), b.ncols()));
    for i in 0..a.nrows() {
        for l in 0..a.ncols() {
            if a[[i, l]] == 1 {
                for j in 0..b.ncols() {
                    out[[i, j]] ^= b[[l, j]];
                }
            }
        }
    }
    out
}

/// Row vector times matrix, v * M.
pub fn vector_matrix(v: &[u8], m: &Array2<u8>) -> Vec<u8> {
    let mut out = vec![0u8; m.ncols()];
    for (row, _) in m.rows().into_iter().zip(v).filter(|(_, &b)| b == 1) {
        for (o, &x) in out.iter_mut().zip(row.iter()) {
            *o ^= x;
        }
    }
    out
}

/// Matrix times column vector, M * v.
pub fn matrix_vector(m: &Array2<u8>, v: &[u8]) -> Vec<u8> {
    m.rows().into_iter().map(|row| dot(row, v)).collect()
}

fn dot(row: ArrayView1<'_, u8>, v: &[u8]) -> u8 {
    row.iter().zip(v).fold(0, |acc, (&a, &b)| acc ^ (a & b))
}

/// Reduced row echelon form.
///
/// Returns the reduced matrix (zero rows at the bottom) and the pivot column of
/// each nonzero row.
pub fn rref(m: &Array2<u8>) -> (Array2<u8>, Vec<usize>) {
    let mut a = m.clone();
    let (rows, cols) = a.dim();
    let mut pivots = Vec::new();
    let mut r = 0;
    for c in 0..cols {
        if r == rows {
            break;
        }
        let Some(p) = (r..rows).find(|&i| a[[i, c]] == 1) else {
            continue;
        };
        if p != r {
            for j in 0..cols {
                a.swap([p, j], [r, j]);
            }
        }
        for i in 0..rows {
            if i != r && a[[i, c]] == 1 {
                for j in c..cols {
                    let x = a[[r, j]];
                    a[[i, j]] ^= x;
                }
            }
        }
        pivots.push(c);
        r += 1;
    }
    (a, pivots)
}

/// Rank over GF(2).
pub fn rank(m: &Array2<u8>) -> usize {
    rref(m).1.len()
}

/// A basis of the null space {v : M v = 0}, one vector per row.
pub fn null_space(m: &Array2<u8>) -> Array2<u8> {
    let (reduced, pivots) = rref(m);
    let cols = m.ncols();
    let free: Vec<usize> = (0..cols).filter(|c| !pivots.contains(c)).collect();
    let mut basis = Array2::zeros((free.len(), cols));
    for (row, &f) in free.iter().enumerate() {
        basis[[row, f]] = 1;
        for (i, &p) in pivots.iter().enumerate() {
            basis[[row, p]] = reduced[[i, f]];
        }
    }
    basis
}

/// Inverse of a square matrix.
pub fn inverse(m: &Array2<u8>) -> Result<Array2<u8>> {
    let n = m.nrows();
    if m.ncols() != n {
        return Err(Error::InvalidParameter(format!(
            "cannot invert a {}x{} matrix",
            n,
            m.ncols()
        )));
    }
    right_inverse(m)
}

/// A right inverse R of a full-row-rank k x n matrix, so that M R = I.
///
/// R selects the pivot columns of the reduced form, so it only reads the
/// information positions of a codeword.
pub fn right_inverse(m: &Array2<u8>) -> Result<Array2<u8>> {
    let (k, n) = m.dim();
    let mut augmented = Array2::zeros((k, n + k));
    augmented.slice_mut(s![.., ..n]).assign(m);
    augmented.slice_mut(s![.., n..]).assign(&identity(k));
    let (reduced, pivots) = rref(&augmented);
    if pivots.len() < k || pivots.iter().any(|&p| p >= n) {
        return Err(Error::InvalidParameter(format!(
            "matrix rows are linearly dependent (rank {} < {})",
            pivots.iter().filter(|&&p| p < n).count(),
            k
        )));
    }
    // reduced = [E M | E] with E M restricted to the pivot columns being I.
    let transform = reduced.slice(s![.., n..]).to_owned();
    let mut selector = Array2::zeros((n, k));
    for (i, &p) in pivots.iter().enumerate() {
        selector[[p, i]] = 1;
    }
    Ok(multiply(&selector, &transform))
}

/// Returns true if every entry of the matrix is zero.
pub fn is_zero(m: &Array2<u8>) -> bool {
    m.iter().all(|&x| x == 0)
}
