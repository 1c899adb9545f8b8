use crate::algebra::FloatT;
use crate::timers::Timers;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Statistics of the last analysis and factorization.
#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactorInfo {
    /// matrix dimension
    pub n: usize,
    /// entries of the symmetric pattern, one per unordered pair
    pub nnz: usize,
    /// number of fronts (or columns, for the simplicial backend)
    pub fronts: usize,
    /// roots of the elimination forest
    pub roots: usize,
    /// longest root to leaf path of the elimination forest
    pub tree_height: usize,
    /// order of the largest dense front
    pub max_front_order: usize,
    /// strictly lower nonzeros of `L`
    pub nnz_l: usize,
    /// workers used by the last factorization
    pub workers: usize,
    /// positive pivots of the last factorization
    pub positive_pivots: usize,
    /// negative pivots of the last factorization
    pub negative_pivots: usize,
    /// successful factorizations over the current pattern
    pub factor_count: u32,
    /// seconds spent in the last analysis
    pub analyze_time: f64,
    /// seconds spent in the last factorization
    pub factor_time: f64,
    /// seconds spent in the last solve
    pub solve_time: f64,
}

impl FactorInfo {
    /// Count pivot signs.
    pub(crate) fn set_inertia<T: FloatT>(&mut self, d: impl Iterator<Item = T>) {
        let (mut pos, mut neg) = (0, 0);
        for di in d {
            if di > T::zero() {
                pos += 1;
            } else if di < T::zero() {
                neg += 1;
            }
        }
        self.positive_pivots = pos;
        self.negative_pivots = neg;
    }

    pub(crate) fn update_times(&mut self, timers: &Timers) {
        let secs = |key| timers.elapsed(&[key]).map_or(0.0, |d| d.as_secs_f64());
        self.analyze_time = secs("analyze");
        self.factor_time = secs("factorize");
        self.solve_time = secs("solve");
    }

    /// Write a one line summary of the symbolic analysis to the log.
    pub fn log_analysis(&self) {
        log::debug!(
            "analyzed n = {}, nnz = {}: {} fronts, {} roots, height {}, nnz(L) = {}, largest front {}",
            self.n,
            self.nnz,
            self.fronts,
            self.roots,
            self.tree_height,
            self.nnz_l,
            self.max_front_order
        );
    }

    /// Write a one line summary of the last factorization to the log.
    pub fn log_factorization(&self) {
        log::info!(
            "factorized n = {} on {} worker(s) in {:.3e}s, inertia (+{}, -{})",
            self.n,
            self.workers,
            self.factor_time,
            self.positive_pivots,
            self.negative_pivots
        );
    }
}

#[test]
fn test_inertia() {
    let mut info = FactorInfo::default();
    info.set_inertia([1.0, -2.0, 3.0, 0.0].into_iter());
    assert_eq!(info.positive_pivots, 2);
    assert_eq!(info.negative_pivots, 1);
}
