use super::assembly::AssemblyTree;
use super::frontal::FrontFactor;
use super::scheduler::{CompletedFronts, FrontTask, ParallelFrontScheduler, Reversed};
use crate::algebra::FloatT;
use crate::solver::SolverError;
use std::iter::zip;

/// Forward and backward substitution over the stored front factors.
///
/// Both sweeps are written in pull form: front `v` writes only entry `v`
/// and reads entries of fronts it depends on, summing in ascending front
/// order.  Sequential and scheduled sweeps therefore give identical bits.
pub struct TriangularSolver<'a, T> {
    tree: &'a AssemblyTree,
    factors: &'a [FrontFactor<T>],
    solve_tolerance: T,
}

impl<'a, T: FloatT> TriangularSolver<'a, T> {
    pub fn new(tree: &'a AssemblyTree, factors: &'a [FrontFactor<T>], solve_tolerance: T) -> Self {
        assert_eq!(tree.len(), factors.len());
        Self {
            tree,
            factors,
            solve_tolerance,
        }
    }

    /// `y[v] = x[v] - Σ_{c ∈ dependencies(v)} L[v][c]·y[c]`
    fn forward_value(&self, v: usize, xv: T, y: impl Fn(usize) -> T) -> T {
        let front = self.tree.front(v);
        let mut s = xv;
        for ea in &front.extend_add {
            let lvc = self.factors[ea.source].l()[ea.offset - 1];
            s -= lvc * y(ea.source);
        }
        s
    }

    /// `x[v] = y[v]/D[v] - Σ_{r ∈ remaining(v)} L[r][v]·x[r]`, leaving
    /// `y[v]` unscaled when the pivot is below the solve tolerance.
    fn backward_value(&self, v: usize, yv: T, x: impl Fn(usize) -> T) -> T {
        let front = self.tree.front(v);
        let factor = &self.factors[v];
        let d = factor.d();

        let mut s = if d.abs() < self.solve_tolerance {
            log::warn!(
                "front {}: pivot {:e} below solve tolerance, entry left unscaled",
                v,
                d
            );
            yv
        } else {
            yv / d
        };
        for (&r, &lrv) in zip(front.remaining_vars(), factor.l()) {
            s -= lrv * x(r);
        }
        s
    }

    /// Solve `L·y = x` in place, visiting fronts in `order`, which must
    /// list every front after all of its dependencies.
    pub fn forward(&self, order: &[usize], x: &mut [T]) {
        for &v in order {
            let yv = self.forward_value(v, x[v], |c| x[c]);
            x[v] = yv;
        }
    }

    /// Solve `D·Lᵀ·x = y` in place, visiting fronts in reverse `order`.
    pub fn backward(&self, order: &[usize], x: &mut [T]) {
        for &v in order.iter().rev() {
            let xv = self.backward_value(v, x[v], |r| x[r]);
            x[v] = xv;
        }
    }

    /// Forward sweep through the scheduler on the front graph.
    pub fn forward_scheduled(
        &self,
        scheduler: &ParallelFrontScheduler,
        x: &mut [T],
    ) -> Result<(), SolverError> {
        let task = ForwardSweep { solver: self, rhs: x };
        let outcome = scheduler.run(self.tree, &task)?;
        x.copy_from_slice(&outcome.outputs);
        Ok(())
    }

    /// Backward sweep through the scheduler on the reversed front graph.
    pub fn backward_scheduled(
        &self,
        scheduler: &ParallelFrontScheduler,
        x: &mut [T],
    ) -> Result<(), SolverError> {
        let task = BackwardSweep { solver: self, rhs: x };
        let outcome = scheduler.run(&Reversed(self.tree), &task)?;
        x.copy_from_slice(&outcome.outputs);
        Ok(())
    }
}

struct ForwardSweep<'s, 'a, T> {
    solver: &'s TriangularSolver<'a, T>,
    rhs: &'s [T],
}

impl<T: FloatT> FrontTask for ForwardSweep<'_, '_, T> {
    type Output = T;

    fn run(&self, id: usize, completed: &CompletedFronts<'_, T>) -> Result<T, SolverError> {
        let missing = std::cell::Cell::new(None);
        let yv = self.solver.forward_value(id, self.rhs[id], |c| {
            completed.get(c).copied().unwrap_or_else(|| {
                missing.set(Some(c));
                T::nan()
            })
        });
        match missing.get() {
            None => Ok(yv),
            Some(c) => Err(unpublished(id, c)),
        }
    }
}

struct BackwardSweep<'s, 'a, T> {
    solver: &'s TriangularSolver<'a, T>,
    rhs: &'s [T],
}

impl<T: FloatT> FrontTask for BackwardSweep<'_, '_, T> {
    type Output = T;

    fn run(&self, id: usize, completed: &CompletedFronts<'_, T>) -> Result<T, SolverError> {
        let missing = std::cell::Cell::new(None);
        let xv = self.solver.backward_value(id, self.rhs[id], |r| {
            completed.get(r).copied().unwrap_or_else(|| {
                missing.set(Some(r));
                T::nan()
            })
        });
        match missing.get() {
            None => Ok(xv),
            Some(r) => Err(unpublished(id, r)),
        }
    }
}

fn unpublished(front: usize, dependency: usize) -> SolverError {
    SolverError::ConcurrencyAbort {
        front,
        reason: format!("value of front {} read before it was published", dependency),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::multifrontal::{
        AssemblyTreeBuilder, EliminationTreeBuilder, FrontalFactorizer,
    };

    // [4 1 1; 1 4 0; 1 0 4] in natural order, entries as (p, q) pairs
    fn factor() -> (AssemblyTree, Vec<FrontFactor<f64>>, Vec<usize>) {
        let adjacency = vec![vec![1, 2], vec![0], vec![0]];
        let forest = EliminationTreeBuilder::build_from_adjacency(&adjacency);
        let mut tree = AssemblyTreeBuilder::build(&forest, &adjacency);
        let entries = [(0, 0), (0, 1), (0, 2), (1, 1), (2, 2)];
        AssemblyTreeBuilder::assign_entries(&mut tree, &entries);
        let values = [4., 1., 1., 4., 4.];
        let perm = [0, 1, 2];

        let factorizer = FrontalFactorizer::new(&tree, &values, &perm, 1e-12);
        let outcome = ParallelFrontScheduler::new(1, 1, false)
            .run(&tree, &factorizer)
            .unwrap();
        (tree, outcome.outputs, outcome.order)
    }

    #[test]
    fn test_sequential_solve() {
        let (tree, factors, order) = factor();
        let solver = TriangularSolver::new(&tree, &factors, 1e-12);

        // A * [1, 1, 1] = [6, 5, 5]
        let mut x = vec![6., 5., 5.];
        solver.forward(&order, &mut x);
        solver.backward(&order, &mut x);
        for xi in x {
            assert!((xi - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_scheduled_matches_sequential() {
        let (tree, factors, order) = factor();
        let solver = TriangularSolver::new(&tree, &factors, 1e-12);

        let b = vec![1., -2., 3.];
        let mut seq = b.clone();
        solver.forward(&order, &mut seq);
        solver.backward(&order, &mut seq);

        let scheduler = ParallelFrontScheduler::new(3, 1, false);
        let mut par = b.clone();
        solver.forward_scheduled(&scheduler, &mut par).unwrap();
        solver.backward_scheduled(&scheduler, &mut par).unwrap();

        assert_eq!(seq, par);
    }
}
