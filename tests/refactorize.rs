#![allow(non_snake_case)]

mod common;
use common::*;
use multifrontal::{algebra::*, solver::*};

// same pattern as the 5x5 tridiagonal, scaled values
fn scaled_tridiagonal(s: f64) -> CscMatrix<f64> {
    let mut A = tridiagonal_5x5();
    A.nzval.iter_mut().for_each(|v| *v *= s);
    A
}

#[test]
fn test_new_values_same_pattern() {
    let A = tridiagonal_5x5();
    let b = rhs(5);
    let mut solver = MultifrontalSolver::new(SolverSettings::<f64>::default());
    solver.analyze_pattern(&A).unwrap();
    solver.factorize(&A).unwrap();
    let x1 = solver.solve(&b).unwrap();

    // A scaled by 2 has solution x / 2
    let B = scaled_tridiagonal(2.);
    solver.factorize(&B).unwrap();
    let x2 = solver.solve(&b).unwrap();
    for (u, v) in x1.iter().zip(&x2) {
        assert!((u - 2. * v).abs() < 1e-12);
    }
    assert_eq!(solver.info().factor_count, 2);
    assert!(residual_norm_inf(&B, &x2, &b).unwrap() < 1e-12);
}

#[test]
fn test_refactorize_matches_fresh_solver() {
    let A = grid_laplacian(5);
    let b = rhs(25);
    let mut B = A.clone();
    for (k, v) in B.nzval.iter_mut().enumerate() {
        if *v > 0. {
            *v += (k % 3) as f64;
        }
    }

    let mut reused = MultifrontalSolver::new(SolverSettings::<f64>::default());
    reused.analyze_pattern(&A).unwrap();
    reused.factorize(&A).unwrap();
    reused.factorize(&B).unwrap();

    let mut fresh = MultifrontalSolver::new(SolverSettings::<f64>::default());
    fresh.analyze_pattern(&B).unwrap();
    fresh.factorize(&B).unwrap();

    assert_eq!(reused.solve(&b).unwrap(), fresh.solve(&b).unwrap());
}

#[test]
fn test_analysis_is_deterministic() {
    let A = grid_laplacian(6);
    let settings = SolverSettingsBuilder::<f64>::default()
        .ordering("degree".to_string())
        .build()
        .unwrap();

    let mut s1 = MultifrontalSolver::new(settings.clone());
    let mut s2 = MultifrontalSolver::new(settings);
    s1.analyze_pattern(&A).unwrap();
    s2.analyze_pattern(&A).unwrap();
    assert_eq!(s1.perm(), s2.perm());
    assert_eq!(s1.forest(), s2.forest());
    assert_eq!(s1.assembly_tree(), s2.assembly_tree());

    // analyzing again discards the factorization and the count
    s1.factorize(&A).unwrap();
    assert_eq!(s1.info().factor_count, 1);
    s1.analyze_pattern(&A).unwrap();
    assert!(!s1.is_factorized());
    assert_eq!(s1.info().factor_count, 0);
    assert_eq!(s1.forest(), s2.forest());
}

#[test]
fn test_subset_pattern_reads_zeros() {
    // analyze with the off-diagonal couplings, factor without them
    let A = tridiagonal_5x5();
    let D = upper(5, &[(0, 0, 2.), (1, 1, 4.), (2, 2, 8.), (3, 3, 1.), (4, 4, 5.)]);
    let b = vec![2., 4., 8., 1., 5.];

    let mut solver = MultifrontalSolver::new(SolverSettings::<f64>::default());
    solver.analyze_pattern(&A).unwrap();
    solver.factorize(&D).unwrap();
    let x = solver.solve(&b).unwrap();
    assert_eq!(x, vec![1.; 5]);
}

#[test]
fn test_new_pattern_needs_new_analysis() {
    let A = tridiagonal_5x5();
    let B = arrow(5);
    let mut solver = MultifrontalSolver::new(SolverSettings::<f64>::default());
    solver.analyze_pattern(&A).unwrap();
    solver.factorize(&A).unwrap();

    assert!(matches!(
        solver.factorize(&B),
        Err(SolverError::PatternMismatch { .. })
    ));
    assert!(!solver.is_factorized());

    solver.analyze_pattern(&B).unwrap();
    solver.factorize(&B).unwrap();
    let b = rhs(5);
    let x = solver.solve(&b).unwrap();
    assert!(residual_norm_inf(&B, &x, &b).unwrap() < 1e-12);
}

#[test]
fn test_simplicial_refactorize() {
    let A = tridiagonal_5x5();
    let b = rhs(5);
    let mut solver = SimplicialSolver::new(SolverSettings::<f64>::default());
    solver.analyze_pattern(&A).unwrap();
    solver.factorize(&A).unwrap();
    let x1 = solver.solve(&b).unwrap();

    solver.factorize(&scaled_tridiagonal(4.)).unwrap();
    let x2 = solver.solve(&b).unwrap();
    for (u, v) in x1.iter().zip(&x2) {
        assert!((u - 4. * v).abs() < 1e-12);
    }
    assert_eq!(solver.info().factor_count, 2);
}
