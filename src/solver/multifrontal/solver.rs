#![allow(non_snake_case)]

use super::assembly::{AssemblyTree, AssemblyTreeBuilder};
use super::etree::{EliminationForest, EliminationTreeBuilder};
use super::frontal::{FrontFactor, FrontalFactorizer};
use super::scheduler::{ParallelFrontScheduler, ScheduleOutcome, SchedulerTrace};
use super::triangular::TriangularSolver;
use crate::algebra::*;
use crate::solver::ordering::elimination_order;
use crate::solver::pattern::SymmetricPattern;
use crate::solver::{FactorInfo, SolverError, SolverSettings};
use crate::timers::*;
use itertools::Itertools;

// Everything derived from the sparsity pattern alone.
struct Symbolic {
    pattern: SymmetricPattern,
    perm: Vec<usize>,
    forest: EliminationForest,
    tree: AssemblyTree,
}

/// Parallel multifrontal `LDLᵀ` solver for sparse symmetric systems.
///
/// The solver is used in three phases:
///
/// ```
/// use multifrontal::algebra::CscMatrix;
/// use multifrontal::solver::{MultifrontalSolver, SolverSettings};
///
/// // [4 1; 1 3], upper triangle
/// let A = CscMatrix::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![4., 1., 3.]);
///
/// let mut solver = MultifrontalSolver::<f64>::new(SolverSettings::default());
/// solver.analyze_pattern(&A).unwrap();
/// solver.factorize(&A).unwrap();
/// let x = solver.solve(&[5., 4.]).unwrap();
/// assert!((x[0] - 1.).abs() < 1e-12 && (x[1] - 1.).abs() < 1e-12);
/// ```
///
/// `analyze_pattern` runs once per sparsity pattern, `factorize` may be
/// repeated with new values over that pattern and `solve` may be repeated
/// against the last successful factorization.
pub struct MultifrontalSolver<T: FloatT> {
    settings: SolverSettings<T>,
    symbolic: Option<Symbolic>,
    factors: Option<Vec<FrontFactor<T>>>,
    // front completion order of the last factorization
    order: Vec<usize>,
    info: FactorInfo,
    timers: Timers,
    last_trace: Option<SchedulerTrace>,
}

impl<T: FloatT> MultifrontalSolver<T> {
    pub fn new(settings: SolverSettings<T>) -> Self {
        Self {
            settings,
            symbolic: None,
            factors: None,
            order: Vec::new(),
            info: FactorInfo::default(),
            timers: Timers::default(),
            last_trace: None,
        }
    }

    /// Order the variables, then build the elimination forest and the
    /// fronts of `A`.  Only the sparsity pattern of `A` is used.
    ///
    /// Any previous analysis and factorization is discarded, also when the
    /// analysis fails.
    pub fn analyze_pattern(&mut self, A: &dyn MatrixView<T>) -> Result<(), SolverError> {
        self.symbolic = None;
        self.factors = None;
        self.last_trace = None;
        self.order.clear();

        self.timers.reset_timer("analyze");
        self.timers.start_as_current("analyze");
        let symbolic = analyze(&self.settings, A, &mut self.timers);
        self.timers.stop_current();
        let symbolic = symbolic?;

        self.info = FactorInfo {
            n: symbolic.pattern.n(),
            nnz: symbolic.pattern.nnz(),
            fronts: symbolic.tree.len(),
            roots: symbolic.tree.roots().len(),
            tree_height: symbolic.forest.height(),
            max_front_order: symbolic.tree.max_front_order(),
            nnz_l: symbolic.tree.nnz_l(),
            ..FactorInfo::default()
        };
        self.info.update_times(&self.timers);
        self.info.log_analysis();

        self.symbolic = Some(symbolic);
        Ok(())
    }

    /// Numerically factor `A`, whose pattern must be contained in the
    /// analyzed one.  On failure the solver is left not factorized.
    pub fn factorize(&mut self, A: &dyn MatrixView<T>) -> Result<(), SolverError> {
        let symbolic = self
            .symbolic
            .as_ref()
            .ok_or(SolverError::PatternNotAnalyzed)?;
        self.factors = None;
        self.last_trace = None;
        self.order.clear();

        self.timers.reset_timer("factorize");
        self.timers.start_as_current("factorize");
        let outcome = factor_numeric(symbolic, &self.settings, A, &mut self.timers);
        self.timers.stop_current();
        self.info.update_times(&self.timers);
        let mut outcome = outcome?;

        for factor in outcome.outputs.iter_mut() {
            factor.release_update();
        }
        self.info.workers = outcome.workers;
        self.info.set_inertia(outcome.outputs.iter().map(FrontFactor::d));
        self.info.factor_count += 1;
        self.info.log_factorization();
        self.timers.log();

        self.order = outcome.order;
        self.last_trace = outcome.trace;
        self.factors = Some(outcome.outputs);
        Ok(())
    }

    /// Solve `A·x = b` with the current factorization.
    pub fn solve(&mut self, b: &[T]) -> Result<Vec<T>, SolverError> {
        let mut x = b.to_vec();
        self.solve_in_place(&mut x)?;
        Ok(x)
    }

    /// Solve `A·x = b`, overwriting `b` with `x`.  `b` is unchanged on error.
    pub fn solve_in_place(&mut self, b: &mut [T]) -> Result<(), SolverError> {
        let (symbolic, factors) = match (&self.symbolic, &self.factors) {
            (Some(symbolic), Some(factors)) => (symbolic, factors),
            _ => return Err(SolverError::NotFactorized),
        };
        let n = symbolic.pattern.n();
        if b.len() != n {
            return Err(SolverError::DimensionMismatch {
                expected: n,
                found: b.len(),
            });
        }

        self.timers.reset_timer("solve");
        self.timers.start_as_current("solve");
        let result = solve_permuted(
            symbolic,
            factors,
            &self.order,
            &self.settings,
            b,
            &mut self.timers,
        );
        self.timers.stop_current();
        self.info.update_times(&self.timers);
        result
    }

    pub fn settings(&self) -> &SolverSettings<T> {
        &self.settings
    }

    pub fn is_analyzed(&self) -> bool {
        self.symbolic.is_some()
    }

    pub fn is_factorized(&self) -> bool {
        self.factors.is_some()
    }

    /// Elimination forest of the analyzed pattern, over elimination positions.
    pub fn forest(&self) -> Option<&EliminationForest> {
        self.symbolic.as_ref().map(|s| &s.forest)
    }

    pub fn assembly_tree(&self) -> Option<&AssemblyTree> {
        self.symbolic.as_ref().map(|s| &s.tree)
    }

    /// Elimination order: `perm()[k]` is the variable eliminated at step `k`.
    pub fn perm(&self) -> Option<&[usize]> {
        self.symbolic.as_ref().map(|s| s.perm.as_slice())
    }

    /// Front factors of the last successful factorization.
    pub fn factors(&self) -> Option<&[FrontFactor<T>]> {
        self.factors.as_deref()
    }

    pub fn info(&self) -> &FactorInfo {
        &self.info
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Claim / completion trace of the last factorization, when
    /// `trace_scheduling` is set.
    pub fn last_trace(&self) -> Option<&SchedulerTrace> {
        self.last_trace.as_ref()
    }
}

fn analyze<T: FloatT>(
    settings: &SolverSettings<T>,
    A: &dyn MatrixView<T>,
    timers: &mut Timers,
) -> Result<Symbolic, SolverError> {
    let (pattern, _) = SymmetricPattern::canonicalize(A)?;

    let ordering;
    timeit! {timers => "ordering"; {
        ordering = elimination_order(settings, &pattern);
    }}
    let (perm, iperm) = ordering?;
    let adjacency = pattern.adjacency(Some(&iperm));

    let forest;
    timeit! {timers => "forest"; {
        forest = EliminationTreeBuilder::build_from_adjacency(&adjacency);
    }}

    let mut tree;
    timeit! {timers => "fronts"; {
        tree = AssemblyTreeBuilder::build(&forest, &adjacency);
        let entries = pattern
            .entries()
            .iter()
            .map(|&(r, c)| (iperm[r], iperm[c]))
            .collect_vec();
        AssemblyTreeBuilder::assign_entries(&mut tree, &entries);
    }}

    Ok(Symbolic {
        pattern,
        perm,
        forest,
        tree,
    })
}

fn factor_numeric<T: FloatT>(
    symbolic: &Symbolic,
    settings: &SolverSettings<T>,
    A: &dyn MatrixView<T>,
    timers: &mut Timers,
) -> Result<ScheduleOutcome<FrontFactor<T>>, SolverError> {
    let values;
    timeit! {timers => "gather"; {
        values = symbolic.pattern.gather_values(A);
    }}
    let values = values?;

    let factorizer = FrontalFactorizer::new(
        &symbolic.tree,
        &values,
        &symbolic.perm,
        settings.pivot_tolerance,
    );
    let scheduler = ParallelFrontScheduler::from_settings(settings);

    let outcome;
    timeit! {timers => "fronts"; {
        outcome = scheduler.run(&symbolic.tree, &factorizer);
    }}
    outcome
}

fn solve_permuted<T: FloatT>(
    symbolic: &Symbolic,
    factors: &[FrontFactor<T>],
    order: &[usize],
    settings: &SolverSettings<T>,
    b: &mut [T],
    timers: &mut Timers,
) -> Result<(), SolverError> {
    let mut x = vec![T::zero(); b.len()];
    x.permute_from(b, &symbolic.perm);

    let trisolve = TriangularSolver::new(&symbolic.tree, factors, settings.solve_tolerance);

    if settings.parallel_solve {
        let scheduler =
            ParallelFrontScheduler::new(settings.max_threads, settings.scheduler_wait_ms, false);
        let forward;
        timeit! {timers => "forward"; {
            forward = trisolve.forward_scheduled(&scheduler, &mut x);
        }}
        forward?;
        let backward;
        timeit! {timers => "backward"; {
            backward = trisolve.backward_scheduled(&scheduler, &mut x);
        }}
        backward?;
    } else {
        timeit! {timers => "forward"; {
            trisolve.forward(order, &mut x);
        }}
        timeit! {timers => "backward"; {
            trisolve.backward(order, &mut x);
        }}
    }

    b.ipermute_from(&x, &symbolic.perm);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SolverSettingsBuilder;

    // [4 1 0; 1 4 1; 0 1 4], upper triangle
    fn tridiagonal() -> CscMatrix<f64> {
        CscMatrix::new(
            3,
            3,
            vec![0, 1, 3, 5],
            vec![0, 0, 1, 1, 2],
            vec![4., 1., 4., 1., 4.],
        )
    }

    #[test]
    fn test_three_phases() {
        let A = tridiagonal();
        let mut solver = MultifrontalSolver::<f64>::new(SolverSettings::default());
        assert!(!solver.is_analyzed());

        solver.analyze_pattern(&A).unwrap();
        assert!(solver.is_analyzed());
        assert!(!solver.is_factorized());
        assert_eq!(solver.info().fronts, 3);
        assert_eq!(solver.info().roots, 1);
        assert_eq!(solver.info().nnz_l, 2);

        solver.factorize(&A).unwrap();
        assert!(solver.is_factorized());
        assert_eq!(solver.info().positive_pivots, 3);
        assert_eq!(solver.info().factor_count, 1);

        // A * [1, 2, 3] = [6, 12, 14]
        let x = solver.solve(&[6., 12., 14.]).unwrap();
        for (xi, ei) in x.iter().zip([1., 2., 3.]) {
            assert!((xi - ei).abs() < 1e-12);
        }
        assert!(solver.timers().elapsed(&["solve", "forward"]).is_some());
    }

    #[test]
    fn test_state_errors() {
        let A = tridiagonal();
        let mut solver = MultifrontalSolver::<f64>::new(SolverSettings::default());
        assert_eq!(solver.factorize(&A), Err(SolverError::PatternNotAnalyzed));
        assert_eq!(solver.solve(&[1., 2., 3.]), Err(SolverError::NotFactorized));

        solver.analyze_pattern(&A).unwrap();
        assert_eq!(solver.solve(&[1., 2., 3.]), Err(SolverError::NotFactorized));

        solver.factorize(&A).unwrap();
        assert_eq!(
            solver.solve(&[1., 2.]),
            Err(SolverError::DimensionMismatch {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_failed_factorization_clears_factors() {
        let A = tridiagonal();
        let mut solver = MultifrontalSolver::<f64>::new(SolverSettings::default());
        solver.analyze_pattern(&A).unwrap();
        solver.factorize(&A).unwrap();

        // zero first pivot over the same pattern
        let B = CscMatrix::<f64>::new(
            3,
            3,
            vec![0, 1, 3, 5],
            vec![0, 0, 1, 1, 2],
            vec![0., 1., 4., 1., 4.],
        );
        let err = solver.factorize(&B).unwrap_err();
        assert_eq!(
            err,
            SolverError::SingularPivot {
                variable: 0,
                value: 0.0
            }
        );
        assert!(!solver.is_factorized());
        assert!(solver.is_analyzed());
    }

    #[test]
    fn test_trace_and_perm() {
        let settings = SolverSettingsBuilder::<f64>::default()
            .perm(vec![2, 1, 0])
            .trace_scheduling(true)
            .max_threads(2u32)
            .build()
            .unwrap();
        let A = tridiagonal();
        let mut solver = MultifrontalSolver::new(settings);
        solver.analyze_pattern(&A).unwrap();
        assert_eq!(solver.perm(), Some(&[2, 1, 0][..]));

        solver.factorize(&A).unwrap();
        let trace = solver.last_trace().unwrap();
        assert!(trace.respects_dependencies(solver.assembly_tree().unwrap()));

        let x = solver.solve(&[6., 12., 14.]).unwrap();
        assert!((x[2] - 3.).abs() < 1e-12);
    }
}
