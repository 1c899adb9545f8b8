#![allow(non_snake_case)]

use crate::algebra::*;
use std::iter::zip;

impl<T: FloatT> CscMatrix<T> {
    /// Symmetric matrix-vector product `y = a*A*x + b*y`, where `A` holds
    /// one triangle of a symmetric matrix.  Entries stored on both sides of
    /// the diagonal are each applied once as given, so full storage must
    /// not be passed here.
    ///
    /// # Panics
    /// Panics if the matrix is not square or the vectors do not match it.
    pub fn symv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        _csc_symv(self, y, x, a, b);
    }

}

fn _csc_symv<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    y.scale(b);

    assert!(x.len() == A.n);
    assert!(y.len() == A.n);
    assert!(A.n == A.m);

    for (col, &xcol) in x.iter().enumerate() {
        let first = A.colptr[col];
        let last = A.colptr[col + 1];
        let rows = &A.rowval[first..last];
        let nzvals = &A.nzval[first..last];

        for (&row, &Aij) in zip(rows, nzvals) {
            y[row] += a * Aij * xcol;

            if row != col {
                //don't double up on the diagonal
                y[col] += a * Aij * x[row];
            }
        }
    }
}

#[test]
fn test_csc_symv() {
    // upper triangle of
    // [4 1 0]
    // [1 3 2]
    // [0 2 5]
    let A = CscMatrix::<f64>::new(
        3,
        3,
        vec![0, 1, 3, 5],
        vec![0, 0, 1, 1, 2],
        vec![4., 1., 3., 2., 5.],
    );
    let x = [1., 2., 3.];
    let mut y = [1., 1., 1.];
    A.symv(&mut y, &x, 1., -1.);
    assert_eq!(y, [5., 12., 18.]);
}
