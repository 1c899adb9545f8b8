#![allow(non_snake_case)]

mod common;
use common::*;
use multifrontal::{algebra::*, solver::*};

fn factor_with(A: &CscMatrix<f64>, threads: u32, parallel_solve: bool) -> MultifrontalSolver<f64> {
    let settings = SolverSettingsBuilder::<f64>::default()
        .ordering("degree".to_string())
        .max_threads(threads)
        .parallel_solve(parallel_solve)
        .trace_scheduling(true)
        .scheduler_wait_ms(1)
        .build()
        .unwrap();
    let mut solver = MultifrontalSolver::new(settings);
    solver.analyze_pattern(A).unwrap();
    solver.factorize(A).unwrap();
    solver
}

#[test]
fn test_trace_respects_dependencies() {
    let A = grid_laplacian(6);
    for threads in [1, 2, 3, 8] {
        let solver = factor_with(&A, threads, true);
        let tree = solver.assembly_tree().unwrap();
        let trace = solver.last_trace().unwrap();
        assert!(trace.respects_dependencies(tree));
        assert_eq!(trace.events().len(), 2 * tree.len());
        assert_eq!(solver.info().workers, threads as usize);
    }
}

#[test]
fn test_sequential_and_parallel_are_bit_identical() {
    let A = grid_laplacian(7);
    let b = rhs(49);

    let mut reference = factor_with(&A, 1, false);
    let xref = reference.solve(&b).unwrap();
    assert!(residual_norm_inf(&A, &xref, &b).unwrap() < 1e-10);

    for threads in [1, 2, 4] {
        for parallel_solve in [false, true] {
            let mut solver = factor_with(&A, threads, parallel_solve);

            // same factors, whatever the processing order
            for (f, g) in solver.factors().unwrap().iter().zip(reference.factors().unwrap()) {
                assert_eq!(f.d(), g.d());
                assert_eq!(f.l(), g.l());
            }
            let x = solver.solve(&b).unwrap();
            assert_eq!(x, xref, "threads {threads}, parallel solve {parallel_solve}");
        }
    }
}

#[test]
fn test_repeated_parallel_runs_agree() {
    let A = arrow(40);
    let b = rhs(40);
    let mut first: Option<Vec<f64>> = None;
    for _ in 0..10 {
        let mut solver = factor_with(&A, 4, true);
        let x = solver.solve(&b).unwrap();
        match &first {
            None => first = Some(x),
            Some(f) => assert_eq!(&x, f),
        }
    }
}

#[test]
fn test_leaves_claimed_before_root() {
    // star under the degree ordering: every leaf feeds the centre
    let A = star(12);
    let solver = factor_with(&A, 4, true);
    let tree = solver.assembly_tree().unwrap();
    let root = tree.roots()[0];
    assert_eq!(tree.front(root).dependencies.len(), 11);

    let events = solver.last_trace().unwrap().events();
    let root_claim = events
        .iter()
        .position(|e| *e == TraceEvent::Claimed(root))
        .unwrap();
    let completed_before = events[..root_claim]
        .iter()
        .filter(|e| matches!(e, TraceEvent::Completed(_)))
        .count();
    assert_eq!(completed_before, 11);
}

#[test]
fn test_worker_count_limited_by_fronts() {
    let A = block_diag_2x2();
    let solver = factor_with(&A, 16, true);
    assert_eq!(solver.info().workers, 4);

    // zero asks for the hardware concurrency
    let settings = SolverSettingsBuilder::<f64>::default()
        .max_threads(0u32)
        .build()
        .unwrap();
    let A = grid_laplacian(3);
    let mut solver = MultifrontalSolver::new(settings);
    solver.analyze_pattern(&A).unwrap();
    solver.factorize(&A).unwrap();
    assert!(solver.info().workers >= 1);
    assert!(solver.info().workers <= 9);
    assert!(solver.last_trace().is_none());
}

#[test]
fn test_scheduler_directly() {
    // the scheduler is usable on its own over an analyzed tree
    let A = grid_laplacian(4);
    let mut solver = MultifrontalSolver::new(SolverSettings::<f64>::default());
    solver.analyze_pattern(&A).unwrap();
    let tree = solver.assembly_tree().unwrap();

    struct Depth<'a>(&'a AssemblyTree);
    impl FrontTask for Depth<'_> {
        type Output = usize;
        fn run(
            &self,
            id: usize,
            completed: &CompletedFronts<'_, usize>,
        ) -> Result<usize, SolverError> {
            let mut depth = 0;
            for &d in &self.0.front(id).dependencies {
                depth = depth.max(*completed.get(d).ok_or(SolverError::NotFactorized)? + 1);
            }
            Ok(depth)
        }
    }

    let outcome = ParallelFrontScheduler::new(3, 1, true)
        .run(tree, &Depth(tree))
        .unwrap();
    assert_eq!(outcome.outputs.len(), 16);
    assert_eq!(outcome.order.len(), 16);
    // the last variable closes every chain
    assert_eq!(outcome.outputs[15], *outcome.outputs.iter().max().unwrap());
}
