use super::etree::EliminationForest;
use itertools::Itertools;

/// Lifecycle of a front during one scheduled run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontStatus {
    /// waiting for at least one dependency
    Pending,
    /// every dependency is done, front sits in the ready queue
    Ready,
    /// claimed by a worker
    Running,
    /// result published
    Done,
}

/// Placement of one dependency's contribution inside a front.
///
/// The contribution is the part of the dependency's Schur complement on
/// the row of this front's pivot, restricted to variables not earlier than
/// the pivot.  In the dependency's column-major buffer of order `m` that is
/// column `offset`, rows `offset..m`, and its `k`th entry is added to local
/// row `rows[k]` of this front's pivot column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendAdd {
    pub source: usize,
    pub offset: usize,
    pub rows: Vec<usize>,
}

/// One elimination step: the pivot variable and the variables it couples to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Front {
    /// front identifier, equal to the elimination position of its pivot
    pub id: usize,
    /// pivot followed by its coupling variables, ascending
    pub variables: Vec<usize>,
    /// fronts that must be done before this one, ascending
    pub dependencies: Vec<usize>,
    /// fronts consuming this front's contribution, ascending
    pub dependents: Vec<usize>,
    /// extend-add maps, one per dependency and in the same order
    pub extend_add: Vec<ExtendAdd>,
    /// `(value index, local row)` of the matrix entries assembled here
    pub entries: Vec<(usize, usize)>,
}

impl Front {
    /// order of the dense frontal matrix
    pub fn order(&self) -> usize {
        self.variables.len()
    }

    /// variables eliminated by this front
    pub fn eliminated_vars(&self) -> &[usize] {
        &self.variables[..1]
    }

    /// coupling variables left for later fronts
    pub fn remaining_vars(&self) -> &[usize] {
        &self.variables[1..]
    }

    /// local row of variable `u`, if present
    pub fn local_index(&self, u: usize) -> Option<usize> {
        self.variables.binary_search(&u).ok()
    }
}

/// Flat arena of fronts, indexed by elimination position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyTree {
    fronts: Vec<Front>,
    roots: Vec<usize>,
}

impl AssemblyTree {
    pub fn len(&self) -> usize {
        self.fronts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fronts.is_empty()
    }

    pub fn front(&self, id: usize) -> &Front {
        &self.fronts[id]
    }

    pub fn fronts(&self) -> &[Front] {
        &self.fronts
    }

    /// roots of the underlying elimination forest
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// strictly lower nonzeros of the factor `L`
    pub fn nnz_l(&self) -> usize {
        self.fronts.iter().map(|f| f.order() - 1).sum()
    }

    pub fn max_front_order(&self) -> usize {
        self.fronts.iter().map(Front::order).max().unwrap_or(0)
    }
}

/// Maps forest nodes to fronts and records the dependency graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssemblyTreeBuilder;

impl AssemblyTreeBuilder {
    /// Build the fronts of a forest.  `adjacency` is indexed by elimination
    /// position, as used to build the forest.
    pub fn build(forest: &EliminationForest, adjacency: &[Vec<usize>]) -> AssemblyTree {
        let n = forest.len();
        assert_eq!(adjacency.len(), n);

        const UNMARKED: usize = usize::MAX;
        let mut mark = vec![UNMARKED; n];
        let mut coupling: Vec<Vec<usize>> = Vec::with_capacity(n);
        let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); n];

        // column structure of L, one pivot at a time.  Every dependency
        // of v is lower than v, so its coupling set is already known.
        for v in 0..n {
            mark[v] = v;
            let mut cols = Vec::new();
            let inherited = dependencies[v].iter().flat_map(|&c| coupling[c].iter());
            for &u in adjacency[v].iter().chain(inherited) {
                if u > v && mark[u] != v {
                    mark[u] = v;
                    cols.push(u);
                }
            }
            cols.sort_unstable();
            for &u in &cols {
                dependencies[u].push(v);
            }
            coupling.push(cols);
        }

        let mut fronts: Vec<Front> = coupling
            .into_iter()
            .zip(dependencies)
            .enumerate()
            .map(|(id, (cols, deps))| {
                let variables: Vec<usize> = std::iter::once(id).chain(cols).collect();
                Front {
                    id,
                    dependents: variables[1..].to_vec(),
                    variables,
                    dependencies: deps,
                    extend_add: Vec::new(),
                    entries: Vec::new(),
                }
            })
            .collect();

        for v in 0..n {
            debug_assert!(forest
                .children(v)
                .iter()
                .all(|c| fronts[v].dependencies.binary_search(c).is_ok()));

            let maps = fronts[v]
                .dependencies
                .iter()
                .map(|&c| extend_add_map(&fronts[c], &fronts[v]))
                .collect_vec();
            fronts[v].extend_add = maps;
        }

        let tree = AssemblyTree {
            fronts,
            roots: forest.roots(),
        };
        log::debug!(
            "assembly tree: {} fronts, nnz(L) = {}, largest front {}",
            tree.len(),
            tree.nnz_l(),
            tree.max_front_order()
        );
        tree
    }

    /// Assign every matrix entry, given as `(p, q)` in elimination
    /// positions, to the front eliminating `min(p, q)`.  The value index of
    /// an entry is its position in `entries`.
    pub fn assign_entries(tree: &mut AssemblyTree, entries: &[(usize, usize)]) {
        for front in tree.fronts.iter_mut() {
            front.entries.clear();
        }
        for (idx, &(p, q)) in entries.iter().enumerate() {
            let (lo, hi) = if p <= q { (p, q) } else { (q, p) };
            let front = &mut tree.fronts[lo];
            // hi is lo itself or one of its later neighbours
            if let Some(row) = front.local_index(hi) {
                front.entries.push((idx, row));
            }
        }
    }
}

fn extend_add_map(source: &Front, target: &Front) -> ExtendAdd {
    let offset = source
        .local_index(target.id)
        .unwrap_or(source.variables.len());
    let rows = source.variables[offset..]
        .iter()
        .filter_map(|&u| target.local_index(u))
        .collect_vec();
    debug_assert_eq!(rows.len(), source.variables.len() - offset);
    ExtendAdd {
        source: source.id,
        offset,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::multifrontal::EliminationTreeBuilder;

    fn build(adjacency: &[Vec<usize>]) -> AssemblyTree {
        let forest = EliminationTreeBuilder::build_from_adjacency(adjacency);
        AssemblyTreeBuilder::build(&forest, adjacency)
    }

    #[test]
    fn test_chain_fronts() {
        let adjacency = vec![vec![1], vec![0, 2], vec![1, 3], vec![2]];
        let tree = build(&adjacency);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.roots(), &[3]);
        assert_eq!(tree.front(0).variables, vec![0, 1]);
        assert_eq!(tree.front(1).dependencies, vec![0]);
        assert_eq!(tree.front(1).dependents, vec![2]);
        assert_eq!(tree.front(3).variables, vec![3]);
        assert!(tree.front(3).dependents.is_empty());
        assert_eq!(tree.nnz_l(), 3);
        assert_eq!(tree.max_front_order(), 2);

        let ea = &tree.front(2).extend_add[0];
        assert_eq!(ea.source, 1);
        assert_eq!(ea.offset, 1);
        assert_eq!(ea.rows, vec![0]);
    }

    #[test]
    fn test_fill_in_is_represented() {
        // star centred on 0: eliminating 0 first couples every leaf
        let adjacency = vec![vec![1, 2, 3], vec![0], vec![0], vec![0]];
        let tree = build(&adjacency);

        assert_eq!(tree.front(0).variables, vec![0, 1, 2, 3]);
        assert_eq!(tree.front(1).variables, vec![1, 2, 3]);
        assert_eq!(tree.front(2).variables, vec![2, 3]);
        assert_eq!(tree.front(2).dependencies, vec![0, 1]);
        assert_eq!(tree.front(3).dependencies, vec![0, 1, 2]);
        assert_eq!(tree.nnz_l(), 6);

        // forest children are always dependencies, and parents are dependents
        assert_eq!(tree.roots(), &[1, 2, 3]);
        assert!(tree.front(0).dependents.contains(&3));

        // contribution of front 0 into front 2: rows {2,3} of front 0
        let ea = &tree.front(2).extend_add[0];
        assert_eq!(ea.source, 0);
        assert_eq!(ea.offset, 2);
        assert_eq!(ea.rows, vec![0, 1]);
    }

    #[test]
    fn test_disconnected_fronts_share_no_edges() {
        let adjacency = vec![vec![1], vec![0], vec![3], vec![2]];
        let tree = build(&adjacency);
        assert_eq!(tree.roots(), &[1, 3]);
        assert_eq!(tree.front(1).dependencies, vec![0]);
        assert_eq!(tree.front(3).dependencies, vec![2]);
        assert!(tree.front(2).dependencies.is_empty());
        assert!(tree.front(1).dependents.is_empty());
    }

    #[test]
    fn test_assign_entries() {
        let adjacency = vec![vec![1], vec![0, 2], vec![1]];
        let mut tree = build(&adjacency);
        // (0,0) (0,1) (1,1) (2,1) (2,2)
        let entries = [(0, 0), (0, 1), (1, 1), (2, 1), (2, 2)];
        AssemblyTreeBuilder::assign_entries(&mut tree, &entries);
        assert_eq!(tree.front(0).entries, vec![(0, 0), (1, 1)]);
        assert_eq!(tree.front(1).entries, vec![(2, 0), (3, 1)]);
        assert_eq!(tree.front(2).entries, vec![(4, 0)]);
    }
}
