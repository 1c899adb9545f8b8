//! Direct solvers for sparse symmetric linear systems.
//!
//! The main entry point is [`MultifrontalSolver`], which factors a matrix
//! front by front on a pool of worker threads.  [`SimplicialSolver`] is a
//! sequential column by column alternative.  Both implement
//! [`DirectSolver`] and can be chosen at run time through
//! [`SolverBackend`] and the `direct_solve_method` setting.

mod backend;
mod error;
mod info;
mod multifrontal;
mod ordering;
pub mod pattern;
mod settings;
mod simplicial;

#[cfg(feature = "serde")]
mod json;

pub use backend::*;
pub use error::*;
pub use info::*;
pub use multifrontal::*;
pub use ordering::*;
pub use settings::*;
pub use simplicial::*;

#[cfg(feature = "serde")]
pub use json::*;
