#![allow(non_snake_case)]
#![allow(dead_code)]

use multifrontal::{algebra::*, solver::*};

/// Build a symmetric matrix from its upper triangle entries.
pub fn upper(n: usize, entries: &[(usize, usize, f64)]) -> CscMatrix<f64> {
    let mut A = CooMatrix::new(n, n);
    for &(r, c, v) in entries {
        assert!(r <= c);
        A.push(r, c, v).unwrap();
    }
    A.to_csc().unwrap()
}

/// 5x5, diagonal [4,5,4,5,4], -1 between consecutive indices
pub fn tridiagonal_5x5() -> CscMatrix<f64> {
    let diag = [4., 5., 4., 5., 4.];
    let mut entries = vec![];
    for (i, &d) in diag.iter().enumerate() {
        entries.push((i, i, d));
        if i + 1 < diag.len() {
            entries.push((i, i + 1, -1.));
        }
    }
    upper(5, &entries)
}

/// [2 1; 1 3] and [4 -1; -1 5] on the diagonal
pub fn block_diag_2x2() -> CscMatrix<f64> {
    upper(
        4,
        &[
            (0, 0, 2.),
            (0, 1, 1.),
            (1, 1, 3.),
            (2, 2, 4.),
            (2, 3, -1.),
            (3, 3, 5.),
        ],
    )
}

/// 5-point Laplacian on a k x k grid
pub fn grid_laplacian(k: usize) -> CscMatrix<f64> {
    let idx = |i: usize, j: usize| i * k + j;
    let mut entries = vec![];
    for i in 0..k {
        for j in 0..k {
            entries.push((idx(i, j), idx(i, j), 4.));
            if j + 1 < k {
                entries.push((idx(i, j), idx(i, j + 1), -1.));
            }
            if i + 1 < k {
                entries.push((idx(i, j), idx(i + 1, j), -1.));
            }
        }
    }
    upper(k * k, &entries)
}

/// dense last row and column
pub fn arrow(n: usize) -> CscMatrix<f64> {
    let mut entries = vec![];
    for i in 0..n - 1 {
        entries.push((i, i, 2.));
        entries.push((i, n - 1, 1.));
    }
    entries.push((n - 1, n - 1, n as f64 + 1.));
    upper(n, &entries)
}

/// variable 0 coupled to every other one, so natural order fills in completely
pub fn star(n: usize) -> CscMatrix<f64> {
    let mut entries = vec![(0, 0, n as f64 + 1.)];
    for j in 1..n {
        entries.push((0, j, -1.));
        entries.push((j, j, 3. + j as f64 / n as f64));
    }
    upper(n, &entries)
}

/// quasidefinite: two positive pivots and one negative
pub fn indefinite_3x3() -> CscMatrix<f64> {
    upper(
        3,
        &[(0, 0, 2.), (0, 2, 1.), (1, 1, 2.), (1, 2, 1.), (2, 2, -1.)],
    )
}

pub fn test_matrices() -> Vec<(&'static str, CscMatrix<f64>)> {
    vec![
        ("tridiagonal", tridiagonal_5x5()),
        ("block diagonal", block_diag_2x2()),
        ("grid", grid_laplacian(5)),
        ("arrow", arrow(9)),
        ("star", star(9)),
        ("indefinite", indefinite_3x3()),
    ]
}

pub fn rhs(n: usize) -> Vec<f64> {
    (1..=n).map(|i| i as f64).collect()
}

/// Settings for every ordering and a few thread counts.
pub fn settings_grid(n: usize) -> Vec<SolverSettings<f64>> {
    let mut all = vec![];
    for threads in [1u32, 2, 4] {
        for ordering in ["natural", "degree"] {
            all.push(
                SolverSettingsBuilder::<f64>::default()
                    .ordering(ordering.to_string())
                    .max_threads(threads)
                    .scheduler_wait_ms(1)
                    .build()
                    .unwrap(),
            );
        }
        all.push(
            SolverSettingsBuilder::<f64>::default()
                .perm((0..n).rev().collect())
                .max_threads(threads)
                .scheduler_wait_ms(1)
                .build()
                .unwrap(),
        );
    }
    all
}

/// Gaussian elimination with partial pivoting on the dense symmetric matrix.
pub fn dense_solve(A: &dyn MatrixView<f64>, b: &[f64]) -> Vec<f64> {
    let n = b.len();
    let mut M = vec![vec![0.0; n]; n];
    for (i, j, v) in symmetric_entries(A).unwrap() {
        M[i][j] = v;
        M[j][i] = v;
    }
    let mut x = b.to_vec();

    for k in 0..n {
        let p = (k..n)
            .max_by(|&i, &j| M[i][k].abs().total_cmp(&M[j][k].abs()))
            .unwrap();
        M.swap(k, p);
        x.swap(k, p);
        let rowk = M[k].clone();
        let xk = x[k];
        for i in k + 1..n {
            let f = M[i][k] / rowk[k];
            for j in k..n {
                M[i][j] -= f * rowk[j];
            }
            x[i] -= f * xk;
        }
    }
    for k in (0..n).rev() {
        let s: f64 = (k + 1..n).map(|j| M[k][j] * x[j]).sum();
        x[k] = (x[k] - s) / M[k][k];
    }
    x
}

pub fn solve_multifrontal(
    A: &dyn MatrixView<f64>,
    b: &[f64],
    settings: SolverSettings<f64>,
) -> Result<Vec<f64>, SolverError> {
    let mut solver = MultifrontalSolver::new(settings);
    solver.analyze_pattern(A)?;
    solver.factorize(A)?;
    solver.solve(b)
}

pub fn inf_norm_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .fold(0.0, |acc, (x, y)| f64::max(acc, (x - y).abs()))
}
