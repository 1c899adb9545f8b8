use crate::algebra::FloatT;
use crate::solver::pattern::SymmetricPattern;
use crate::solver::{SettingsError, SolverError, SolverSettings};
use enum_dispatch::enum_dispatch;

/// Strategy choosing the order in which variables are eliminated.
///
/// An ordering returns `perm` with `perm[k]` the original variable
/// eliminated at step `k`.  The adjacency given is in original indexing.
#[enum_dispatch]
pub trait Ordering {
    fn order(&self, adjacency: &[Vec<usize>]) -> Result<Vec<usize>, SolverError>;
}

/// Identity ordering.
#[derive(Debug, Clone, Default)]
pub struct NaturalOrdering;

impl Ordering for NaturalOrdering {
    fn order(&self, adjacency: &[Vec<usize>]) -> Result<Vec<usize>, SolverError> {
        Ok((0..adjacency.len()).collect())
    }
}

/// Static ascending-degree ordering.  Ties keep the original index order.
#[derive(Debug, Clone, Default)]
pub struct DegreeOrdering;

impl Ordering for DegreeOrdering {
    fn order(&self, adjacency: &[Vec<usize>]) -> Result<Vec<usize>, SolverError> {
        let mut perm: Vec<usize> = (0..adjacency.len()).collect();
        perm.sort_by_key(|&v| (adjacency[v].len(), v));
        Ok(perm)
    }
}

/// A caller supplied ordering, checked to be a permutation of the right size.
#[derive(Debug, Clone)]
pub struct GivenOrdering {
    pub perm: Vec<usize>,
}

impl Ordering for GivenOrdering {
    fn order(&self, adjacency: &[Vec<usize>]) -> Result<Vec<usize>, SolverError> {
        if self.perm.len() != adjacency.len() {
            return Err(SolverError::InvalidPermutation);
        }
        invperm(&self.perm)?;
        Ok(self.perm.clone())
    }
}

#[enum_dispatch(Ordering)]
#[derive(Debug, Clone)]
pub enum OrderingMethod {
    NaturalOrdering,
    DegreeOrdering,
    GivenOrdering,
}

impl OrderingMethod {
    /// Select the ordering named by the settings.  A user permutation
    /// takes precedence over the `ordering` string.
    pub fn from_settings<T: FloatT>(settings: &SolverSettings<T>) -> Result<Self, SolverError> {
        if let Some(perm) = &settings.perm {
            return Ok(GivenOrdering { perm: perm.clone() }.into());
        }
        match settings.ordering.as_str() {
            "natural" => Ok(NaturalOrdering.into()),
            "degree" => Ok(DegreeOrdering.into()),
            _ => Err(SettingsError::BadFieldValue("ordering").into()),
        }
    }
}

/// Elimination order of `pattern` chosen by the settings, and its inverse.
pub(crate) fn elimination_order<T: FloatT>(
    settings: &SolverSettings<T>,
    pattern: &SymmetricPattern,
) -> Result<(Vec<usize>, Vec<usize>), SolverError> {
    let method = OrderingMethod::from_settings(settings)?;
    let perm = method.order(&pattern.adjacency(None))?;
    let iperm = invperm(&perm)?;
    Ok((perm, iperm))
}

/// Construct an inverse permutation from a permutation
pub fn invperm(p: &[usize]) -> Result<Vec<usize>, SolverError> {
    let mut b = vec![0; p.len()];
    let mut seen = vec![false; p.len()];

    for (i, &j) in p.iter().enumerate() {
        if j < p.len() && !seen[j] {
            seen[j] = true;
            b[j] = i;
        } else {
            return Err(SolverError::InvalidPermutation);
        }
    }
    Ok(b)
}
