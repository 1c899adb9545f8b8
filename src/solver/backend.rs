#![allow(non_snake_case)]

use crate::algebra::*;
use crate::solver::{
    FactorInfo, MultifrontalSolver, SettingsError, SimplicialSolver, SolverError, SolverSettings,
};
use crate::timers::Timers;
use enum_dispatch::*;

/// Operations shared by every direct solver backend.
#[enum_dispatch]
pub trait DirectSolver<T>
where
    T: FloatT,
{
    /// Symbolic analysis of the sparsity pattern of `A`.
    fn analyze_pattern(&mut self, A: &dyn MatrixView<T>) -> Result<(), SolverError>;

    /// Numeric factorization of `A` over the analyzed pattern.
    fn factorize(&mut self, A: &dyn MatrixView<T>) -> Result<(), SolverError>;

    fn solve(&mut self, b: &[T]) -> Result<Vec<T>, SolverError>;

    fn solve_in_place(&mut self, b: &mut [T]) -> Result<(), SolverError>;

    fn is_analyzed(&self) -> bool;

    fn is_factorized(&self) -> bool;

    fn info(&self) -> &FactorInfo;

    fn timers(&self) -> &Timers;
}

/// A direct solver selected at run time by `direct_solve_method`.
///
/// ```
/// use multifrontal::algebra::CscMatrix;
/// use multifrontal::solver::{DirectSolver, SolverBackend, SolverSettingsBuilder};
///
/// let settings = SolverSettingsBuilder::<f64>::default()
///     .direct_solve_method("simplicial".to_string())
///     .build()
///     .unwrap();
/// let mut solver = SolverBackend::new(settings).unwrap();
///
/// let A = CscMatrix::<f64>::identity(3);
/// solver.analyze_pattern(&A).unwrap();
/// solver.factorize(&A).unwrap();
/// assert_eq!(solver.solve(&[1., 2., 3.]).unwrap(), vec![1., 2., 3.]);
/// ```
#[enum_dispatch(DirectSolver<T>)]
pub enum SolverBackend<T>
where
    T: FloatT,
{
    MultifrontalSolver(MultifrontalSolver<T>),
    SimplicialSolver(SimplicialSolver<T>),
}

impl<T> SolverBackend<T>
where
    T: FloatT,
{
    pub fn new(settings: SolverSettings<T>) -> Result<Self, SolverError> {
        settings.validate()?;
        let solver: Self = match settings.direct_solve_method.as_str() {
            "multifrontal" => MultifrontalSolver::new(settings).into(),
            "simplicial" => SimplicialSolver::new(settings).into(),
            _ => return Err(SettingsError::BadFieldValue("direct_solve_method").into()),
        };
        Ok(solver)
    }

    /// name of the selected backend
    pub fn method(&self) -> &'static str {
        match self {
            SolverBackend::MultifrontalSolver(_) => "multifrontal",
            SolverBackend::SimplicialSolver(_) => "simplicial",
        }
    }
}

macro_rules! impl_direct_solver {
    ($solver:ident) => {
        impl<T> DirectSolver<T> for $solver<T>
        where
            T: FloatT,
        {
            fn analyze_pattern(&mut self, A: &dyn MatrixView<T>) -> Result<(), SolverError> {
                $solver::analyze_pattern(self, A)
            }
            fn factorize(&mut self, A: &dyn MatrixView<T>) -> Result<(), SolverError> {
                $solver::factorize(self, A)
            }
            fn solve(&mut self, b: &[T]) -> Result<Vec<T>, SolverError> {
                $solver::solve(self, b)
            }
            fn solve_in_place(&mut self, b: &mut [T]) -> Result<(), SolverError> {
                $solver::solve_in_place(self, b)
            }
            fn is_analyzed(&self) -> bool {
                $solver::is_analyzed(self)
            }
            fn is_factorized(&self) -> bool {
                $solver::is_factorized(self)
            }
            fn info(&self) -> &FactorInfo {
                $solver::info(self)
            }
            fn timers(&self) -> &Timers {
                $solver::timers(self)
            }
        }
    };
}

impl_direct_solver!(MultifrontalSolver);
impl_direct_solver!(SimplicialSolver);

#[test]
fn test_backend_selection() {
    let settings = SolverSettings::<f64>::default();
    let solver = SolverBackend::new(settings.clone()).unwrap();
    assert_eq!(solver.method(), "multifrontal");

    let mut simplicial = settings.clone();
    simplicial.direct_solve_method = "simplicial".to_string();
    let solver = SolverBackend::new(simplicial).unwrap();
    assert_eq!(solver.method(), "simplicial");
    assert!(!solver.is_analyzed());

    let mut bogus = settings;
    bogus.direct_solve_method = "dense".to_string();
    assert!(matches!(
        SolverBackend::new(bogus),
        Err(SolverError::Settings(_))
    ));
}
