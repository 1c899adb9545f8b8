#![allow(non_snake_case)]

use crate::algebra::*;
use crate::solver::multifrontal::{EliminationForest, NO_PARENT};
use crate::solver::ordering::elimination_order;
use crate::solver::pattern::SymmetricPattern;
use crate::solver::{FactorInfo, SolverError, SolverSettings};
use crate::timers::*;
use core::cmp::{max, min};
use std::iter::zip;

// Everything derived from the sparsity pattern alone.
struct Symbolic<T> {
    pattern: SymmetricPattern,
    perm: Vec<usize>,
    // upper triangle of the permuted matrix. Values are refreshed by
    // every factorization through `value_map`
    triuA: CscMatrix<T>,
    // pattern entry -> position in triuA
    value_map: Vec<usize>,
    // true elimination tree of the permuted matrix
    etree: EliminationForest,
    // nonzeros in each column of L
    Lnz: Vec<usize>,
}

struct Factors<T> {
    L: CscMatrix<T>,
    D: Vec<T>,
}

/// Sequential up-looking `LDLᵀ` solver.
///
/// Works column by column on the elimination tree of the permuted matrix,
/// without fronts or threads.  It accepts the same settings and matrices as
/// [`MultifrontalSolver`](crate::solver::MultifrontalSolver) and, for the
/// same ordering, produces the same pivots.
pub struct SimplicialSolver<T: FloatT> {
    settings: SolverSettings<T>,
    symbolic: Option<Symbolic<T>>,
    factors: Option<Factors<T>>,
    info: FactorInfo,
    timers: Timers,
}

impl<T: FloatT> SimplicialSolver<T> {
    pub fn new(settings: SolverSettings<T>) -> Self {
        Self {
            settings,
            symbolic: None,
            factors: None,
            info: FactorInfo::default(),
            timers: Timers::default(),
        }
    }

    /// Order the variables and compute the elimination tree and column
    /// counts of `L`.  Only the sparsity pattern of `A` is used.
    pub fn analyze_pattern(&mut self, A: &dyn MatrixView<T>) -> Result<(), SolverError> {
        self.symbolic = None;
        self.factors = None;

        self.timers.reset_timer("analyze");
        self.timers.start_as_current("analyze");
        let symbolic = analyze(&self.settings, A, &mut self.timers);
        self.timers.stop_current();
        let symbolic = symbolic?;

        let n = symbolic.pattern.n();
        self.info = FactorInfo {
            n,
            nnz: symbolic.pattern.nnz(),
            fronts: n,
            roots: symbolic.etree.roots().len(),
            tree_height: symbolic.etree.height(),
            max_front_order: symbolic.Lnz.iter().max().map_or(0, |m| m + 1),
            nnz_l: symbolic.Lnz.iter().sum(),
            ..FactorInfo::default()
        };
        self.info.update_times(&self.timers);
        self.info.log_analysis();

        self.symbolic = Some(symbolic);
        Ok(())
    }

    /// Numerically factor `A` over the analyzed pattern.
    pub fn factorize(&mut self, A: &dyn MatrixView<T>) -> Result<(), SolverError> {
        let symbolic = self
            .symbolic
            .as_mut()
            .ok_or(SolverError::PatternNotAnalyzed)?;
        self.factors = None;

        self.timers.reset_timer("factorize");
        self.timers.start_as_current("factorize");
        let factors = factor_numeric(symbolic, self.settings.pivot_tolerance, A, &mut self.timers);
        self.timers.stop_current();
        self.info.update_times(&self.timers);
        let factors = factors?;

        self.info.workers = 1;
        self.info.set_inertia(factors.D.iter().copied());
        self.info.factor_count += 1;
        self.info.log_factorization();

        self.factors = Some(factors);
        Ok(())
    }

    /// Solve `A·x = b` with the current factorization.
    pub fn solve(&mut self, b: &[T]) -> Result<Vec<T>, SolverError> {
        let mut x = b.to_vec();
        self.solve_in_place(&mut x)?;
        Ok(x)
    }

    /// Solve `A·x = b`, overwriting `b` with `x`.
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
        let timers = &mut self.timers;
        let L = &factors.L;
        let tol = self.settings.solve_tolerance;

        timeit! {timers => "solve"; {
            let mut x = vec![T::zero(); n];
            x.permute_from(b, &symbolic.perm);

            timeit! {timers => "forward"; {
                _lsolve(&L.colptr, &L.rowval, &L.nzval, &mut x);
            }}
            timeit! {timers => "backward"; {
                _dsolve(&factors.D, tol, &mut x);
                _ltsolve(&L.colptr, &L.rowval, &L.nzval, &mut x);
            }}

            b.ipermute_from(&x, &symbolic.perm);
        }}
        self.info.update_times(&self.timers);
        Ok(())
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

    /// Elimination tree of the permuted matrix: the parent of column `j` is
    /// the row of the first subdiagonal nonzero in column `j` of `L`.
    pub fn elimination_tree(&self) -> Option<&EliminationForest> {
        self.symbolic.as_ref().map(|s| &s.etree)
    }

    pub fn perm(&self) -> Option<&[usize]> {
        self.symbolic.as_ref().map(|s| s.perm.as_slice())
    }

    /// Strictly lower factor `L` of the permuted matrix.
    pub fn factor_l(&self) -> Option<&CscMatrix<T>> {
        self.factors.as_ref().map(|f| &f.L)
    }

    /// Pivots of the permuted matrix.
    pub fn factor_d(&self) -> Option<&[T]> {
        self.factors.as_ref().map(|f| f.D.as_slice())
    }

    pub fn info(&self) -> &FactorInfo {
        &self.info
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }
}

fn analyze<T: FloatT>(
    settings: &SolverSettings<T>,
    A: &dyn MatrixView<T>,
    timers: &mut Timers,
) -> Result<Symbolic<T>, SolverError> {
    let (pattern, _) = SymmetricPattern::canonicalize(A)?;

    let ordering;
    timeit! {timers => "ordering"; {
        ordering = elimination_order(settings, &pattern);
    }}
    let (perm, iperm) = ordering?;

    let n = pattern.n();
    let (triuA, value_map) = _permute_pattern(&pattern, &iperm);
    let mut etree = vec![NO_PARENT; n];
    let mut Lnz = vec![0; n];

    timeit! {timers => "forest"; {
        _etree(n, &triuA.colptr, &triuA.rowval, &mut Lnz, &mut etree);
    }}

    Ok(Symbolic {
        pattern,
        perm,
        triuA,
        value_map,
        etree: EliminationForest::from_parent(etree),
        Lnz,
    })
}

fn factor_numeric<T: FloatT>(
    symbolic: &mut Symbolic<T>,
    pivot_tolerance: T,
    A: &dyn MatrixView<T>,
    timers: &mut Timers,
) -> Result<Factors<T>, SolverError> {
    let values;
    timeit! {timers => "gather"; {
        values = symbolic.pattern.gather_values(A);
    }}
    for (&slot, v) in zip(&symbolic.value_map, values?) {
        symbolic.triuA.nzval[slot] = v;
    }

    let n = symbolic.pattern.n();
    let mut L = CscMatrix::spalloc(n, n, symbolic.Lnz.iter().sum());
    let mut D = vec![T::zero(); n];

    let result;
    timeit! {timers => "numeric"; {
        let A = &symbolic.triuA;
        result = _factor_inner(
            n,
            &A.colptr,
            &A.rowval,
            &A.nzval,
            &mut L.colptr,
            &mut L.rowval,
            &mut L.nzval,
            &mut D,
            &symbolic.Lnz,
            symbolic.etree.parents(),
            pivot_tolerance,
        );
    }}

    result.map_err(|(k, value)| {
        let variable = symbolic.perm[k];
        log::warn!(
            "column {}: pivot {:e} below tolerance {:e} at variable {}",
            k,
            value,
            pivot_tolerance,
            variable
        );
        SolverError::SingularPivot {
            variable,
            value: value.to_f64().unwrap_or(f64::NAN),
        }
    })?;

    Ok(Factors { L, D })
}

// Upper triangle of the symmetrically permuted pattern, with the slot each
// pattern entry lands in.  Rows within a column are left unordered.
fn _permute_pattern<T: FloatT>(
    pattern: &SymmetricPattern,
    iperm: &[usize],
) -> (CscMatrix<T>, Vec<usize>) {
    let n = pattern.n();
    let mut P = CscMatrix::<T>::spalloc(n, n, pattern.nnz());
    let mut value_map = vec![0; pattern.nnz()];

    // 1. count the entries of each column of P
    let mut num_entries = vec![0; n];
    for &(r, c) in pattern.entries() {
        num_entries[max(iperm[r], iperm[c])] += 1;
    }

    // 2. cumulative sum into the column pointer
    P.colptr[0] = 0;
    let mut acc = 0;
    for (Pckp1, ne) in zip(&mut P.colptr[1..], &num_entries) {
        *Pckp1 = acc + ne;
        acc = *Pckp1;
    }
    let mut row_starts = num_entries;
    row_starts.copy_from_slice(&P.colptr[0..n]);

    // 3. place every entry in the next free slot of its column
    for (idx, &(r, c)) in pattern.entries().iter().enumerate() {
        let (rowP, colP) = (iperm[r], iperm[c]);
        let col_idx = max(rowP, colP);
        let slot = row_starts[col_idx];
        P.rowval[slot] = min(rowP, colP);
        value_map[idx] = slot;
        row_starts[col_idx] += 1;
    }
    (P, value_map)
}

// Elimination tree and column counts of L for an upper triangular pattern.
fn _etree(n: usize, Ap: &[usize], Ai: &[usize], Lnz: &mut [usize], etree: &mut [usize]) {
    let mut work = vec![0; n];
    Lnz.fill(0);
    etree.fill(NO_PARENT);

    for j in 0..n {
        work[j] = j;
        for &istart in &Ai[Ap[j]..Ap[j + 1]] {
            let mut i = istart;
            while work[i] != j {
                if etree[i] == NO_PARENT {
                    etree[i] = j;
                }
                Lnz[i] += 1;
                work[i] = j;
                i = etree[i];
            }
        }
    }
}

// Up-looking factorization.  Row k of L solves a triangular system with
// the already computed rows, whose nonzeros follow the elimination tree.
// Fails with the column and value of the first pivot below tolerance.
#[allow(clippy::too_many_arguments)]
fn _factor_inner<T: FloatT>(
    n: usize,
    Ap: &[usize],
    Ai: &[usize],
    Ax: &[T],
    Lp: &mut [usize],
    Li: &mut [usize],
    Lx: &mut [T],
    D: &mut [T],
    Lnz: &[usize],
    etree: &[usize],
    pivot_tolerance: T,
) -> Result<(), (usize, T)> {
    let mut y_markers = vec![false; n];
    let mut y_idx = vec![0; n];
    let mut elim_buffer = vec![0; n];
    let mut y_vals = vec![T::zero(); n];

    //set Lp to cumsum(Lnz), starting from zero
    Lp[0] = 0;
    let mut acc = 0;
    for (Lp, Lnz) in zip(&mut Lp[1..], Lnz) {
        *Lp = acc + Lnz;
        acc = *Lp;
    }
    let mut next_colspace = Lp[0..n].to_vec();
    D.fill(T::zero());

    for k in 0..n {
        let mut nnz_y = 0;

        // nonzero positions of row k of L, in topological order
        for i in Ap[k]..Ap[k + 1] {
            let bidx = Ai[i];
            if bidx == k {
                D[k] = Ax[i];
                continue;
            }
            y_vals[bidx] = Ax[i];

            if !y_markers[bidx] {
                y_markers[bidx] = true;
                elim_buffer[0] = bidx;
                let mut nnz_e = 1;

                let mut next_idx = etree[bidx];
                while next_idx != NO_PARENT && next_idx < k {
                    if y_markers[next_idx] {
                        break;
                    }
                    y_markers[next_idx] = true;
                    elim_buffer[nnz_e] = next_idx;
                    next_idx = etree[next_idx];
                    nnz_e += 1;
                }

                while nnz_e != 0 {
                    nnz_e -= 1;
                    y_idx[nnz_y] = elim_buffer[nnz_e];
                    nnz_y += 1;
                }
            }
        }

        // values of row k of L
        for i in (0..nnz_y).rev() {
            let cidx = y_idx[i];
            let tmp_idx = next_colspace[cidx];
            let y_vals_cidx = y_vals[cidx];

            for j in Lp[cidx]..tmp_idx {
                y_vals[Li[j]] -= Lx[j] * y_vals_cidx;
            }

            Lx[tmp_idx] = y_vals_cidx / D[cidx];
            D[k] -= y_vals_cidx * Lx[tmp_idx];

            Li[tmp_idx] = k;
            next_colspace[cidx] += 1;

            y_vals[cidx] = T::zero();
            y_markers[cidx] = false;
        }

        if !(D[k].abs() >= pivot_tolerance) || D[k] == T::zero() || !D[k].is_finite() {
            return Err((k, D[k]));
        }
    }
    Ok(())
}

// Solves (L+I)x = b, with x replacing b
fn _lsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in 0..x.len() {
        let xi = x[i];
        let (f, l) = (Lp[i], Lp[i + 1]);
        for (&Lij, &Lxj) in zip(&Li[f..l], &Lx[f..l]) {
            x[Lij] -= Lxj * xi;
        }
    }
}

// Solves (L+I)'x = b, with x replacing b
fn _ltsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in (0..x.len()).rev() {
        let mut s = T::zero();
        let (f, l) = (Lp[i], Lp[i + 1]);
        for (&Lij, &Lxj) in zip(&Li[f..l], &Lx[f..l]) {
            s += Lxj * x[Lij];
        }
        x[i] -= s;
    }
}

// Divides by the pivots, skipping those below the solve tolerance
fn _dsolve<T: FloatT>(D: &[T], tol: T, x: &mut [T]) {
    let mut skipped = 0;
    for (xi, &d) in zip(x.iter_mut(), D) {
        if d.abs() < tol {
            skipped += 1;
        } else {
            *xi /= d;
        }
    }
    if skipped > 0 {
        log::warn!("{} pivot(s) below solve tolerance, entries left unscaled", skipped);
    }
}
