//! Multifrontal `LDLᵀ` factorization.
//!
//! A symmetric matrix is analyzed once into an [`EliminationForest`] and an
//! [`AssemblyTree`] of fronts, one front per eliminated variable.  Fronts
//! are then assembled and factored by [`FrontalFactorizer`] on the worker
//! pool of [`ParallelFrontScheduler`], and [`TriangularSolver`] runs the
//! forward and backward sweeps over the stored factors.  The
//! [`MultifrontalSolver`] type drives all of these.

mod assembly;
mod etree;
mod frontal;
mod scheduler;
mod solver;
mod triangular;

pub use assembly::*;
pub use etree::*;
pub use frontal::*;
pub use scheduler::*;
pub use solver::*;
pub use triangular::*;
