#![allow(non_snake_case)]

use crate::algebra::*;
use crate::solver::pattern::SymmetricPattern;
use crate::solver::SolverError;

/// Parent marker for a root of the elimination forest.
pub const NO_PARENT: usize = usize::MAX;

/// Elimination dependency forest over elimination positions.
///
/// Node `v` is the variable eliminated at step `v`.  Whenever a parent is
/// defined it has a strictly larger position than the child, so the forest
/// is acyclic and every position below `n` is a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EliminationForest {
    parent: Vec<usize>,
    children: Vec<Vec<usize>>,
}

impl EliminationForest {
    /// Build a forest from a parent array, using [`NO_PARENT`] for roots.
    pub(crate) fn from_parent(parent: Vec<usize>) -> Self {
        let children = children_from_parent(&parent);
        Self { parent, children }
    }

    /// number of nodes
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn parent(&self, v: usize) -> Option<usize> {
        match self.parent[v] {
            NO_PARENT => None,
            p => Some(p),
        }
    }

    /// The raw parent array, [`NO_PARENT`] marking roots.
    pub fn parents(&self) -> &[usize] {
        &self.parent
    }

    /// children of `v` in ascending order
    pub fn children(&self, v: usize) -> &[usize] {
        &self.children[v]
    }

    pub fn is_root(&self, v: usize) -> bool {
        self.parent[v] == NO_PARENT
    }

    /// All roots, ascending.  A disconnected pattern gives several.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.len()).filter(|&v| self.is_root(v)).collect()
    }

    /// Children-before-parents ordering of every node.  Roots are visited
    /// in ascending order and the children of a node in ascending order.
    pub fn postorder(&self) -> Vec<usize> {
        let mut post = Vec::with_capacity(self.len());
        let mut stack: Vec<(usize, bool)> = Vec::with_capacity(self.len());

        for root in self.roots() {
            stack.push((root, false));
            while let Some((v, expanded)) = stack.pop() {
                if expanded {
                    post.push(v);
                } else {
                    stack.push((v, true));
                    stack.extend(self.children[v].iter().rev().map(|&c| (c, false)));
                }
            }
        }
        post
    }

    /// Number of edges on the longest root to leaf path.
    pub fn height(&self) -> usize {
        // parents follow their children in position order
        let mut depth_below = vec![0usize; self.len()];
        for v in 0..self.len() {
            if let Some(p) = self.parent(v) {
                depth_below[p] = depth_below[p].max(depth_below[v] + 1);
            }
        }
        depth_below.into_iter().max().unwrap_or(0)
    }
}

fn children_from_parent(parent: &[usize]) -> Vec<Vec<usize>> {
    let mut children = vec![Vec::new(); parent.len()];
    // ascending by construction
    for (i, &pi) in parent.iter().enumerate() {
        if pi != NO_PARENT {
            children[pi].push(i);
        }
    }
    children
}

/// Derives the elimination forest from the adjacency graph of a pattern.
///
/// Variables are processed in ascending position.  Each variable is marked
/// visited and takes as parent its not yet visited neighbour of largest
/// position, or becomes a root if every neighbour was visited before it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EliminationTreeBuilder;

impl EliminationTreeBuilder {
    /// Build the forest of a matrix in its natural ordering.
    pub fn build<T: FloatT>(A: &dyn MatrixView<T>) -> Result<EliminationForest, SolverError> {
        let (pattern, _) = SymmetricPattern::canonicalize(A)?;
        Ok(Self::build_from_adjacency(&pattern.adjacency(None)))
    }

    /// Build from an adjacency list already expressed in elimination
    /// positions.  The diagonal is ignored if present.
    pub fn build_from_adjacency(adjacency: &[Vec<usize>]) -> EliminationForest {
        let n = adjacency.len();
        let mut visited = vec![false; n];
        let mut parent = vec![NO_PARENT; n];

        for v in 0..n {
            visited[v] = true;
            parent[v] = adjacency[v]
                .iter()
                .copied()
                .filter(|&u| !visited[u])
                .max()
                .unwrap_or(NO_PARENT);
        }

        let forest = EliminationForest::from_parent(parent);
        log::debug!(
            "elimination forest: {} nodes, {} roots, height {}",
            n,
            forest.roots().len(),
            forest.height()
        );
        forest
    }
}
