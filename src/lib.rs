//! __multifrontal__ is a direct solver for sparse symmetric linear systems
//!
//! $$ A x = b, \qquad A = A^\top \in \mathbb{R}^{n \times n}, $$
//!
//! based on a parallel multifrontal $LDL^\top$ factorization.
//!
//! Solving a system is split into three phases:
//!
//! 1. __Analysis__ orders the variables and derives from the sparsity
//!    pattern of $A$ an elimination forest and one dense *front* per
//!    eliminated variable, together with the dependencies between fronts.
//! 2. __Factorization__ assembles each front from the entries of $A$ and the
//!    contributions of the fronts it depends on, and eliminates its pivot.
//!    Independent fronts are processed concurrently by a pool of worker
//!    threads, and repeated factorizations with new values reuse the analysis.
//! 3. __Solution__ runs forward and backward substitution over the stored
//!    front factors.
//!
//! ```
//! use multifrontal::algebra::CscMatrix;
//! use multifrontal::solver::{MultifrontalSolver, SolverSettingsBuilder};
//!
//! // A = [4 -1  0]
//! //     [-1 4 -1]
//! //     [0 -1  4], upper triangle
//! let A = CscMatrix::new(
//!     3,
//!     3,
//!     vec![0, 1, 3, 5],
//!     vec![0, 0, 1, 1, 2],
//!     vec![4., -1., 4., -1., 4.],
//! );
//!
//! let settings = SolverSettingsBuilder::<f64>::default()
//!     .max_threads(2u32)
//!     .build()
//!     .unwrap();
//!
//! let mut solver = MultifrontalSolver::new(settings);
//! solver.analyze_pattern(&A).unwrap();
//! solver.factorize(&A).unwrap();
//! let x = solver.solve(&[3., 2., 3.]).unwrap();
//! assert!(x.iter().all(|xi| (xi - 1.).abs() < 1e-12));
//! ```
//!
//! Matrices are read through the [`MatrixView`](crate::algebra::MatrixView)
//! trait.  Either triangle, or both, may be stored.  A sequential
//! [`SimplicialSolver`](crate::solver::SimplicialSolver) with the same
//! interface is provided as an alternative backend.
//!
//! # License
//!
//! Licensed under Apache License, Version 2.0.

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// crate version
pub fn version() -> &'static str {
    VERSION
}

pub mod algebra;
pub mod solver;
pub mod timers;
