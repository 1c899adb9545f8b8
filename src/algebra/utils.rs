#![allow(non_snake_case)]

use crate::algebra::{FloatT, MatrixView, SparseFormatError, VectorMath};

/// Reduce the stored entries of a symmetric matrix to one value per
/// unordered index pair.
///
/// Returns `(row, col, value)` with `row <= col`, sorted by `(row, col)`.
/// Repeated coordinates are summed.  When a pair has entries stored on both
/// sides of the diagonal, the upper triangle (`row <= col`) takes precedence
/// and the lower triangle entries for that pair are ignored.
pub fn symmetric_entries<T: FloatT>(
    A: &dyn MatrixView<T>,
) -> Result<Vec<(usize, usize, T)>, SparseFormatError> {
    let (m, n) = (A.nrows(), A.ncols());

    // (row, col, from_lower, value) in canonical upper coordinates
    let mut raw: Vec<(usize, usize, bool, T)> = Vec::with_capacity(A.nnz());
    let mut bad = None;
    A.for_each_entry(&mut |r, c, v| {
        if r >= m || c >= n {
            bad.get_or_insert(SparseFormatError::BadTriplet { row: r, col: c, m, n });
            return;
        }
        if r <= c {
            raw.push((r, c, false, v));
        } else {
            raw.push((c, r, true, v));
        }
    });
    if let Some(err) = bad {
        return Err(err);
    }

    // upper entries sort ahead of lower entries for the same pair
    raw.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

    let mut out: Vec<(usize, usize, T)> = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let (r, c, from_lower, _) = raw[i];
        let mut sum = T::zero();
        let mut j = i;
        while j < raw.len() && raw[j].0 == r && raw[j].1 == c {
            if raw[j].2 == from_lower {
                sum += raw[j].3;
            }
            j += 1;
        }
        out.push((r, c, sum));
        i = j;
    }
    Ok(out)
}

/// Compute `‖A*x - b‖∞` for a symmetric matrix given through any view,
/// using the same canonical reading of the stored entries as the solvers.
pub fn residual_norm_inf<T: FloatT>(
    A: &dyn MatrixView<T>,
    x: &[T],
    b: &[T],
) -> Result<T, SparseFormatError> {
    let n = A.ncols();
    if A.nrows() != n || x.len() != n || b.len() != n {
        return Err(SparseFormatError::IncompatibleDimension);
    }

    let mut r = vec![T::zero(); n];
    for (i, j, v) in symmetric_entries(A)? {
        r[i] += v * x[j];
        if i != j {
            r[j] += v * x[i];
        }
    }
    r.axpby(-T::one(), b, T::one());
    Ok(r.norm_inf())
}
