#![allow(non_snake_case)]

use super::assembly::AssemblyTree;
use super::scheduler::{CompletedFronts, FrontTask};
use crate::algebra::FloatT;
use crate::solver::SolverError;
use std::iter::zip;

/// Dense factor of one front.
///
/// The frontal matrix of order `m` is held column-major and only its lower
/// triangle is meaningful.  After factorization, entry `(0,0)` is the pivot
/// `D`, rows `1..m` of column 0 are the column of `L` below the pivot, and
/// the trailing block is the Schur complement passed on to dependents.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontFactor<T> {
    order: usize,
    data: Vec<T>,
}

impl<T: FloatT> FrontFactor<T> {
    pub fn order(&self) -> usize {
        self.order
    }

    /// pivot
    pub fn d(&self) -> T {
        self.data[0]
    }

    /// column of `L` below the pivot, matching the front's remaining variables
    pub fn l(&self) -> &[T] {
        &self.data[1..self.order]
    }

    /// Column `offset` of the trailing block from the diagonal down.
    ///
    /// # Panics
    /// Panics once the update block has been released.
    pub fn contribution(&self, offset: usize) -> &[T] {
        let start = offset * self.order;
        &self.data[start + offset..start + self.order]
    }

    /// Drop the Schur complement once every dependent has consumed it.
    pub fn release_update(&mut self) {
        self.data.truncate(self.order);
        self.data.shrink_to_fit();
    }
}

/// Partial `LDLᵀ` factorization of a dense symmetric matrix, in place.
///
/// `F` is column-major of order `m` and only its lower triangle is read.
/// The first `npiv` columns are eliminated:
/// `D[i] = F[i][i] - Σ_{k<i} L[i][k]² D[k]` and
/// `L[j][i] = (F[j][i] - Σ_{k<i} L[j][k] L[i][k] D[k]) / D[i]` for `j > i`,
/// after which the trailing block is replaced by the Schur complement
/// `F[j][k] - Σ_{p<npiv} L[j][p] L[k][p] D[p]`.
///
/// Fails with the local index and value of the first pivot smaller than
/// `tol` in magnitude.  Zero and non-finite pivots fail for any `tol`.
pub(crate) fn ldl_partial_in_place<T: FloatT>(
    F: &mut [T],
    m: usize,
    npiv: usize,
    tol: T,
) -> Result<(), (usize, T)> {
    assert_eq!(F.len(), m * m);
    assert!(npiv <= m);

    for i in 0..npiv {
        let mut d = F[i * m + i];
        for k in 0..i {
            let lik = F[k * m + i];
            d -= lik * lik * F[k * m + k];
        }
        if !(d.abs() >= tol) || d == T::zero() || !d.is_finite() {
            return Err((i, d));
        }
        F[i * m + i] = d;

        for j in (i + 1)..m {
            let mut s = F[i * m + j];
            for k in 0..i {
                s -= F[k * m + j] * F[k * m + i] * F[k * m + k];
            }
            F[i * m + j] = s / d;
        }
    }

    for k in npiv..m {
        for j in k..m {
            let mut s = F[k * m + j];
            for p in 0..npiv {
                s -= F[p * m + j] * F[p * m + k] * F[p * m + p];
            }
            F[k * m + j] = s;
        }
    }
    Ok(())
}

/// Assembles and factors fronts of an [`AssemblyTree`].
pub struct FrontalFactorizer<'a, T> {
    tree: &'a AssemblyTree,
    values: &'a [T],
    perm: &'a [usize],
    pivot_tolerance: T,
}

impl<'a, T: FloatT> FrontalFactorizer<'a, T> {
    /// `values` are the matrix values indexed as the tree's assigned
    /// entries and `perm` maps positions back to original variables for
    /// error reporting.
    pub fn new(tree: &'a AssemblyTree, values: &'a [T], perm: &'a [usize], pivot_tolerance: T) -> Self {
        Self {
            tree,
            values,
            perm,
            pivot_tolerance,
        }
    }

    /// Assemble front `id` from its matrix entries and the contributions of
    /// its dependencies, then eliminate its pivot.
    pub fn process(
        &self,
        id: usize,
        completed: &CompletedFronts<'_, FrontFactor<T>>,
    ) -> Result<FrontFactor<T>, SolverError> {
        let front = self.tree.front(id);
        let m = front.order();
        let mut data = vec![T::zero(); m * m];

        for &(idx, row) in &front.entries {
            data[row] += self.values[idx];
        }

        // dependencies in ascending order, so sums are reproducible
        for ea in &front.extend_add {
            let source = completed
                .get(ea.source)
                .ok_or_else(|| SolverError::ConcurrencyAbort {
                    front: id,
                    reason: format!("dependency {} has no published factor", ea.source),
                })?;
            for (&row, &x) in zip(&ea.rows, source.contribution(ea.offset)) {
                data[row] += x;
            }
        }

        ldl_partial_in_place(&mut data, m, 1, self.pivot_tolerance).map_err(|(i, value)| {
            let variable = self.perm[front.variables[i]];
            log::warn!(
                "front {}: pivot {:e} below tolerance {:e} at variable {}",
                id,
                value,
                self.pivot_tolerance,
                variable
            );
            SolverError::SingularPivot {
                variable,
                value: value.to_f64().unwrap_or(f64::NAN),
            }
        })?;

        Ok(FrontFactor { order: m, data })
    }
}

impl<T: FloatT> FrontTask for FrontalFactorizer<'_, T> {
    type Output = FrontFactor<T>;

    fn run(
        &self,
        id: usize,
        completed: &CompletedFronts<'_, FrontFactor<T>>,
    ) -> Result<FrontFactor<T>, SolverError> {
        self.process(id, completed)
    }
}
