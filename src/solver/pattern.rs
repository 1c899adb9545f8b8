#![allow(non_snake_case)]

use crate::algebra::*;
use crate::solver::SolverError;

/// Check that a view describes a nonempty square matrix.
pub(crate) fn check_dimensions<T: FloatT>(A: &dyn MatrixView<T>) -> Result<usize, SolverError> {
    let (nrows, ncols) = (A.nrows(), A.ncols());
    if nrows == 0 || ncols == 0 {
        return Err(SolverError::Dimension { nrows, ncols });
    }
    if nrows != ncols {
        return Err(SolverError::NotSquare { nrows, ncols });
    }
    Ok(nrows)
}

fn canonical_entries<T: FloatT>(
    A: &dyn MatrixView<T>,
    n: usize,
) -> Result<Vec<(usize, usize, T)>, SolverError> {
    symmetric_entries(A).map_err(|e| match e {
        SparseFormatError::BadTriplet { row, col, .. } => {
            SolverError::EntryOutOfBounds { row, col, n }
        }
        _ => SolverError::DimensionMismatch {
            expected: n,
            found: A.nrows(),
        },
    })
}

/// Sparsity pattern of a symmetric matrix, one entry per unordered index pair.
///
/// Entries are stored as `(row, col)` with `row <= col` in the caller's
/// original indexing, sorted.  The position of an entry in this list is
/// the index used for its value everywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetricPattern {
    n: usize,
    entries: Vec<(usize, usize)>,
}

impl SymmetricPattern {
    /// Canonicalize a matrix, returning its pattern and the values of the
    /// pattern entries.
    pub fn canonicalize<T: FloatT>(A: &dyn MatrixView<T>) -> Result<(Self, Vec<T>), SolverError> {
        let n = check_dimensions(A)?;
        let triplets = canonical_entries(A, n)?;

        let entries = triplets.iter().map(|&(r, c, _)| (r, c)).collect();
        let values = triplets.into_iter().map(|(_, _, v)| v).collect();
        Ok((Self { n, entries }, values))
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[(usize, usize)] {
        &self.entries
    }

    /// Read the values of a matrix with the same (or a smaller) pattern.
    /// Pattern entries absent from `A` are zero.
    pub fn gather_values<T: FloatT>(&self, A: &dyn MatrixView<T>) -> Result<Vec<T>, SolverError> {
        if A.nrows() != self.n || A.ncols() != self.n {
            return Err(SolverError::DimensionMismatch {
                expected: self.n,
                found: if A.nrows() != self.n {
                    A.nrows()
                } else {
                    A.ncols()
                },
            });
        }

        let mut values = vec![T::zero(); self.entries.len()];
        for (row, col, v) in canonical_entries(A, self.n)? {
            match self.entries.binary_search(&(row, col)) {
                Ok(pos) => values[pos] = v,
                Err(_) => return Err(SolverError::PatternMismatch { row, col }),
            }
        }
        Ok(values)
    }

    /// Off-diagonal neighbours of every variable, ascending.  `iperm` maps
    /// original indices to positions and the result is indexed by position.
    pub fn adjacency(&self, iperm: Option<&[usize]>) -> Vec<Vec<usize>> {
        let map = |i: usize| iperm.map_or(i, |ip| ip[i]);

        let mut adj = vec![Vec::new(); self.n];
        for &(r, c) in self.entries.iter().filter(|(r, c)| r != c) {
            let (pr, pc) = (map(r), map(c));
            adj[pr].push(pc);
            adj[pc].push(pr);
        }
        for list in adj.iter_mut() {
            list.sort_unstable();
            list.dedup();
        }
        adj
    }
}
