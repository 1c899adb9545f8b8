#![allow(non_snake_case)]

use crate::algebra::{CscMatrix, FloatT, MatrixView, SparseFormatError};

/// Sparse matrix in coordinate (triplet) format.
///
/// Entries may appear in any order and the same coordinate may appear more
/// than once, in which case the values are summed when the matrix is read.
///
/// ```no_run
/// use multifrontal::algebra::CooMatrix;
///
/// let mut A = CooMatrix::<f64>::new(2, 2);
/// A.push(0, 0, 4.).unwrap();
/// A.push(0, 1, -1.).unwrap();
/// A.push(1, 1, 4.).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooMatrix<T = f64> {
    /// number of rows
    pub m: usize,
    /// number of columns
    pub n: usize,
    /// row index of each entry
    pub rows: Vec<usize>,
    /// column index of each entry
    pub cols: Vec<usize>,
    /// value of each entry
    pub vals: Vec<T>,
}

impl<T> CooMatrix<T>
where
    T: FloatT,
{
    /// An empty `m x n` matrix
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            m,
            n,
            rows: Vec::new(),
            cols: Vec::new(),
            vals: Vec::new(),
        }
    }

    /// Build from parallel triplet arrays.
    pub fn from_triplets(
        m: usize,
        n: usize,
        rows: Vec<usize>,
        cols: Vec<usize>,
        vals: Vec<T>,
    ) -> Result<Self, SparseFormatError> {
        if rows.len() != cols.len() || rows.len() != vals.len() {
            return Err(SparseFormatError::IncompatibleDimension);
        }
        let A = Self {
            m,
            n,
            rows,
            cols,
            vals,
        };
        A.check_format()?;
        Ok(A)
    }

    /// Append one entry.
    pub fn push(&mut self, row: usize, col: usize, val: T) -> Result<(), SparseFormatError> {
        if row >= self.m || col >= self.n {
            return Err(SparseFormatError::BadTriplet {
                row,
                col,
                m: self.m,
                n: self.n,
            });
        }
        self.rows.push(row);
        self.cols.push(col);
        self.vals.push(val);
        Ok(())
    }

    /// Check that every entry lies inside the matrix dimensions.
    pub fn check_format(&self) -> Result<(), SparseFormatError> {
        if self.rows.len() != self.cols.len() || self.rows.len() != self.vals.len() {
            return Err(SparseFormatError::IncompatibleDimension);
        }
        for (&row, &col) in self.rows.iter().zip(&self.cols) {
            if row >= self.m || col >= self.n {
                return Err(SparseFormatError::BadTriplet {
                    row,
                    col,
                    m: self.m,
                    n: self.n,
                });
            }
        }
        Ok(())
    }

    /// Convert to compressed sparse column format, summing duplicates.
    pub fn to_csc(&self) -> Result<CscMatrix<T>, SparseFormatError> {
        CscMatrix::from_triplets(self.m, self.n, &self.rows, &self.cols, &self.vals)
    }
}

impl<T: FloatT> MatrixView<T> for CooMatrix<T> {
    fn nrows(&self) -> usize {
        self.m
    }
    fn ncols(&self) -> usize {
        self.n
    }
    fn nnz(&self) -> usize {
        self.vals.len()
    }
    fn for_each_entry(&self, f: &mut dyn FnMut(usize, usize, T)) {
        for ((&r, &c), &v) in self.rows.iter().zip(&self.cols).zip(&self.vals) {
            f(r, c, v);
        }
    }
}

#[test]
fn test_coo_push_and_convert() {
    let mut A = CooMatrix::<f64>::new(3, 3);
    A.push(2, 2, 1.).unwrap();
    A.push(0, 1, -1.).unwrap();
    A.push(0, 1, -2.).unwrap();
    A.push(0, 0, 4.).unwrap();
    assert!(A.push(3, 0, 1.).is_err());
    assert_eq!(MatrixView::nnz(&A), 4);

    let B = A.to_csc().unwrap();
    assert!(B.check_format().is_ok());
    assert_eq!(B.colptr, vec![0, 1, 2, 3]);
    assert_eq!(B.rowval, vec![0, 0, 2]);
    assert_eq!(B.nzval, vec![4., -3., 1.]);
}
