//! Sparse matrix containers and the vector math used by the solvers.
//!
//! The solvers consume matrices through the object safe [`MatrixView`]
//! trait, implemented here for [`CscMatrix`] and [`CooMatrix`].  All numeric
//! code is generic over [`FloatT`].

mod coo;
mod csc;
mod error_types;
mod floats;
mod math_traits;
mod matrix_traits;
mod utils;
mod vecmath;

pub use coo::*;
pub use csc::*;
pub use error_types::*;
pub use floats::*;
pub use math_traits::*;
pub use matrix_traits::*;
pub use utils::*;
