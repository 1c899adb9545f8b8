#![allow(non_snake_case)]

use crate::algebra::{FloatT, MatrixView, SparseFormatError};

/// Sparse matrix in standard Compressed Sparse Column (CSC) format
///
/// __Example usage__ : To construct the symmetric 3 x 3 matrix
/// ```text
/// A = [4. -1.  0.]
///     [-1. 4. -1.]
///     [0. -1.  4.]
/// ```
/// storing only its upper triangle
///
/// ```no_run
/// use multifrontal::algebra::CscMatrix;
///
/// let A : CscMatrix<f64> = CscMatrix::new(
///    3,                              // m
///    3,                              // n
///    vec![0, 1, 3, 5],               // colptr
///    vec![0, 0, 1, 1, 2],            // rowval
///    vec![4., -1., 4., -1., 4.],     // nzval
///  );
///
/// // optional correctness check
/// assert!(A.check_format().is_ok());
///
/// ```
///
/// A symmetric matrix held in compressed sparse row form has the same
/// arrays as the CSC form of its transpose, so CSR data for a symmetric
/// matrix can be passed here unchanged.

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CscMatrix<T = f64> {
    /// number of rows
    pub m: usize,
    /// number of columns
    pub n: usize,
    /// CSC format column pointer.
    ///
    /// Ths field should have length `n+1`. The last entry corresponds
    /// to the the number of nonzeros and should agree with the lengths
    /// of the `rowval` and `nzval` fields.
    pub colptr: Vec<usize>,
    /// vector of row indices
    pub rowval: Vec<usize>,
    /// vector of non-zero matrix elements
    pub nzval: Vec<T>,
}

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    /// `CscMatrix` constructor.
    ///
    /// # Panics
    /// Makes rudimentary dimensional compatibility checks and panics on
    /// failure.   This constructor does __not__
    /// ensure that rows indices are all in bounds or that data is arranged
    /// such that entries within each column appear in order of increasing
    /// row index.   Responsibility for ensuring these conditions hold
    /// is left to the caller.
    ///

    pub fn new(m: usize, n: usize, colptr: Vec<usize>, rowval: Vec<usize>, nzval: Vec<T>) -> Self {
        assert_eq!(rowval.len(), nzval.len());
        assert_eq!(colptr.len(), n + 1);
        assert_eq!(colptr[n], rowval.len());
        CscMatrix {
            m,
            n,
            colptr,
            rowval,
            nzval,
        }
    }

    /// allocate space for a sparse matrix with `nnz` elements
    ///
    /// To make an m x n matrix of zeros, use
    /// ```no_run
    /// use multifrontal::algebra::CscMatrix;
    /// let m = 3;
    /// let n = 4;
    /// let A : CscMatrix<f64> = CscMatrix::spalloc(m,n,0);
    /// ```

    pub fn spalloc(m: usize, n: usize, nnz: usize) -> Self {
        let mut colptr = vec![0; n + 1];
        let rowval = vec![0; nnz];
        let nzval = vec![T::zero(); nnz];
        colptr[n] = nnz;

        CscMatrix::new(m, n, colptr, rowval, nzval)
    }

    /// Identity matrix of size `n`
    pub fn identity(n: usize) -> Self {
        let colptr = (0usize..=n).collect();
        let rowval = (0usize..n).collect();
        let nzval = vec![T::one(); n];

        CscMatrix::new(n, n, colptr, rowval, nzval)
    }

    /// Build from `(row, col, value)` triplets.  Repeated coordinates are
    /// summed and each column is sorted by row index.
    pub fn from_triplets(
        m: usize,
        n: usize,
        rows: &[usize],
        cols: &[usize],
        vals: &[T],
    ) -> Result<Self, SparseFormatError> {
        if rows.len() != cols.len() || rows.len() != vals.len() {
            return Err(SparseFormatError::IncompatibleDimension);
        }
        if let Some((&row, &col)) = rows.iter().zip(cols).find(|&(&r, &c)| r >= m || c >= n) {
            return Err(SparseFormatError::BadTriplet { row, col, m, n });
        }

        // bucket the triplets by column, then sort and merge each column
        let mut colptr = vec![0usize; n + 1];
        for &c in cols {
            colptr[c + 1] += 1;
        }
        for c in 0..n {
            colptr[c + 1] += colptr[c];
        }
        let mut next = colptr.clone();
        let mut entries = vec![(0usize, T::zero()); rows.len()];
        for ((&r, &c), &v) in rows.iter().zip(cols).zip(vals) {
            entries[next[c]] = (r, v);
            next[c] += 1;
        }

        let mut rowval = Vec::with_capacity(rows.len());
        let mut nzval = Vec::with_capacity(rows.len());
        let mut newptr = vec![0usize; n + 1];
        for col in 0..n {
            let bucket = &mut entries[colptr[col]..colptr[col + 1]];
            bucket.sort_by_key(|&(r, _)| r);
            let start = rowval.len();
            for &(r, v) in bucket.iter() {
                if rowval.len() > start && rowval[rowval.len() - 1] == r {
                    let last = nzval.len() - 1;
                    nzval[last] += v;
                } else {
                    rowval.push(r);
                    nzval.push(v);
                }
            }
            newptr[col + 1] = rowval.len();
        }

        Ok(CscMatrix::new(m, n, newptr, rowval, nzval))
    }

    /// number of nonzeros
    pub fn nnz(&self) -> usize {
        self.colptr[self.n]
    }

    /// Check that matrix data is correctly formatted.
    pub fn check_format(&self) -> Result<(), SparseFormatError> {
        if self.rowval.len() != self.nzval.len() {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        if self.colptr.is_empty()
            || (self.colptr.len() - 1) != self.n
            || self.colptr[self.n] != self.rowval.len()
        {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        //check for colptr monotonicity
        if self.colptr.windows(2).any(|c| c[0] > c[1]) {
            return Err(SparseFormatError::BadColptr);
        }

        //check for rowval monotonicity within each column
        for col in 0..self.n {
            let rng = self.colptr[col]..self.colptr[col + 1];
            if self.rowval[rng].windows(2).any(|c| c[0] >= c[1]) {
                return Err(SparseFormatError::BadRowOrdering);
            }
        }
        //check for row values out of bounds
        if !self.rowval.iter().all(|r| r < &self.m) {
            return Err(SparseFormatError::BadRowval);
        }

        Ok(())
    }

}

impl<T: FloatT> MatrixView<T> for CscMatrix<T> {
    fn nrows(&self) -> usize {
        self.m
    }
    fn ncols(&self) -> usize {
        self.n
    }
    fn nnz(&self) -> usize {
        self.rowval.len()
    }
    fn for_each_entry(&self, f: &mut dyn FnMut(usize, usize, T)) {
        for col in 0..self.n {
            for ptr in self.colptr[col]..self.colptr[col + 1] {
                f(self.rowval[ptr], col, self.nzval[ptr]);
            }
        }
    }
}

#[test]
fn test_csc_from_triplets_sums_duplicates() {
    let A = CscMatrix::<f64>::from_triplets(
        3,
        3,
        &[2, 0, 0, 1, 0],
        &[2, 0, 0, 2, 2],
        &[5., 1., 2., -1., 3.],
    )
    .unwrap();

    assert!(A.check_format().is_ok());
    assert_eq!(A.colptr, vec![0, 1, 1, 4]);
    assert_eq!(A.rowval, vec![0, 0, 1, 2]);
    assert_eq!(A.nzval, vec![3., 3., -1., 5.]);
}

#[test]
fn test_csc_from_triplets_out_of_bounds() {
    let err = CscMatrix::<f64>::from_triplets(2, 2, &[0, 2], &[0, 1], &[1., 1.]).unwrap_err();
    assert_eq!(
        err,
        SparseFormatError::BadTriplet {
            row: 2,
            col: 1,
            m: 2,
            n: 2
        }
    );
}
