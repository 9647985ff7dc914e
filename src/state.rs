//! The solver's graph state: adjacency, assignment vector, restore journal
//! and the scratch buffers every reduction rule borrows from.
//!
//! This plays the role the spec calls "Graph state" (`SolverState`): rather
//! than wrapping it in a separate struct, its fields live directly on
//! [`Solver`], the same way the reference implementation keeps everything as
//! fields of one class. Behaviour is split across `impl Solver` blocks in
//! sibling modules (`reduce.rs`, `bounds.rs`, `branch.rs`, `decompose.rs`,
//! `solver.rs`) purely for file-size hygiene; there is exactly one `Solver`
//! type.

use crate::adapters::{DinicMaxFlow, MaxFlowEngine, MinCutEngine};
use crate::bitset::FastSet;
use crate::config::Config;
use crate::modification::{AltMod, FoldMod, Modification};

/// Vertex has not yet been decided.
pub(crate) const UNDECIDED: i8 = -1;
/// Vertex is in the independent set (out of the cover).
pub(crate) const OUT_OF_COVER: i8 = 0;
/// Vertex is in the cover.
pub(crate) const IN_COVER: i8 = 1;
/// Vertex is temporarily absent, folded away by a modification.
pub(crate) const REMOVED: i8 = 2;

/// Marker written into the restore journal where a modification, rather
/// than a single `set`, happened.
pub(crate) const MOD_SENTINEL: i64 = -1;

/// `(limit; vertices)`: at most `limit` of `vertices` may end up in the
/// independent set in any completion of the current partial solution.
#[derive(Debug, Clone)]
pub(crate) struct PackingConstraint {
    pub limit: usize,
    pub vertices: Vec<usize>,
}

/// Exact branch-and-reduce solver for Minimum Vertex Cover / Maximum
/// Independent Set.
pub struct Solver {
    pub(crate) config: Config,
    pub(crate) max_flow: Box<dyn MaxFlowEngine>,
    pub(crate) min_cut: Box<dyn MinCutEngine>,

    pub(crate) adj: Vec<Vec<usize>>,
    /// Number of vertices.
    pub(crate) n: usize,
    /// Always equal to `n`. Kept as a distinct field (rather than reusing
    /// `n` directly for buffer sizing) because the reference implementation
    /// distinguishes a solver's vertex count from a reserved buffer capacity
    /// for its own sub-solvers; this crate's decomposition instead builds an
    /// independent child `Solver` per component (see `decompose.rs`), so
    /// that distinction currently never manifests as `capacity > n`.
    pub(crate) capacity: usize,

    pub(crate) x: Vec<i8>,
    pub(crate) y: Vec<i8>,
    pub(crate) crt: usize,
    pub(crate) rn: usize,
    pub(crate) opt: usize,

    pub(crate) restore_journal: Vec<i64>,
    pub(crate) modifications: Vec<Modification>,
    pub(crate) packing: Vec<PackingConstraint>,

    /// LP matching links: `lp_in[u]` is u's matched left partner (or -1),
    /// `lp_out[v]` is v's matched right partner (or -1). Both indexed over
    /// `[0, n)`.
    pub(crate) lp_in: Vec<i64>,
    pub(crate) lp_out: Vec<i64>,

    // Scratch buffers, reused across unrelated rules; see module docs on
    // `reduce.rs` for the aliasing discipline.
    pub(crate) que: Vec<i64>,
    pub(crate) level: Vec<i64>,
    pub(crate) iter_: Vec<i64>,
    pub(crate) mod_tmp: Vec<i64>,
    pub(crate) used: FastSet,

    /// Cached lower bound; -1 means invalid and must be recomputed.
    pub(crate) lb: i64,
    pub(crate) depth: usize,
    pub(crate) root_depth: i64,
    pub(crate) starting_solution_is_best: bool,

    pub(crate) snapshot_x: Option<Vec<i8>>,
    pub(crate) snapshot_modifications_len: usize,

    pub(crate) rng: rand::rngs::StdRng,
    /// Remaining candidate vertices for `BranchingStrategy::StCut`, refined
    /// across successive branches.
    pub(crate) cut_stack: Vec<usize>,
}

impl Solver {
    /// Builds a solver over `adj` (symmetric, 0-indexed, no self-loops).
    /// `capacity` must equal `adj.len()` (see the field doc on
    /// [`Solver::capacity`]); panics (debug builds) if adjacency is not
    /// loop-free and symmetric.
    pub(crate) fn new_raw(adj: Vec<Vec<usize>>, capacity: usize) -> Solver {
        let n = adj.len();
        debug_assert!(capacity >= n);
        debug_assert!(adj.iter().enumerate().all(|(v, nbrs)| !nbrs.contains(&v)));
        debug_assert!(adj.iter().enumerate().all(|(v, nbrs)| nbrs
            .iter()
            .all(|&u| adj[u].contains(&v))));

        let mut x = vec![REMOVED; capacity];
        let mut y = vec![REMOVED; capacity];
        for v in 0..n {
            x[v] = UNDECIDED;
            y[v] = IN_COVER;
        }

        let scratch_len = 2 * n.max(1);
        Solver {
            config: Config::default(),
            max_flow: Box::new(DinicMaxFlow),
            min_cut: Box::new(DinicMaxFlow),

            adj,
            n,
            capacity,

            x,
            y,
            crt: 0,
            rn: n,
            opt: n,

            restore_journal: vec![0; n.max(1)],
            modifications: Vec::new(),
            packing: Vec::new(),

            lp_in: vec![-1; n],
            lp_out: vec![-1; n],

            que: vec![0; scratch_len],
            level: vec![0; scratch_len],
            iter_: vec![0; scratch_len],
            mod_tmp: vec![0; n.max(1)],
            used: FastSet::new(scratch_len),

            lb: -1,
            depth: 0,
            root_depth: -1,
            starting_solution_is_best: false,

            snapshot_x: None,
            snapshot_modifications_len: 0,

            rng: rand::SeedableRng::seed_from_u64(0x5eed),
            cut_stack: Vec::new(),
        }
    }

    /// Builds a solver over a symmetric, 0-indexed, loop-free adjacency
    /// list, validating every neighbour id is in range.
    pub fn new(adj: Vec<Vec<usize>>, config: crate::config::Config) -> Result<Solver, crate::error::Error> {
        let n = adj.len();
        for nbrs in &adj {
            for &u in nbrs {
                if u >= n {
                    return Err(crate::error::Error::InvalidAdjacency(u, n));
                }
            }
        }
        let mut solver = Solver::new_raw(adj, n);
        solver.config = config;
        Ok(solver)
    }

    /// Swaps in a custom max-flow/min-cut engine pair, used by
    /// [`crate::config::BranchingStrategy::GlobalMincut`]/`StCut`.
    pub fn with_engines(
        mut self,
        max_flow: Box<dyn crate::adapters::MaxFlowEngine>,
        min_cut: Box<dyn crate::adapters::MinCutEngine>,
    ) -> Solver {
        self.max_flow = max_flow;
        self.min_cut = min_cut;
        self
    }

    /// Count of undecided neighbours of `v`. Requires `v` to be undecided.
    pub(crate) fn deg(&self, v: usize) -> usize {
        debug_assert!(self.x[v] < 0);
        self.adj[v].iter().filter(|&&u| self.x[u] < 0).count()
    }

    /// Decides `v`; if `a == OUT_OF_COVER`, also forces every undecided
    /// neighbour of `v` into the cover (domination propagation). Journals
    /// every change so `restore` can undo it.
    pub(crate) fn set(&mut self, v: usize, a: i8) {
        debug_assert!(self.x[v] < 0, "set() called on an already-decided vertex");
        self.crt += a as usize;
        self.x[v] = a;
        self.rn -= 1;
        self.restore_journal[self.rn] = v as i64;
        if a == OUT_OF_COVER {
            for i in 0..self.adj[v].len() {
                let u = self.adj[v][i];
                if self.x[u] < 0 {
                    self.x[u] = IN_COVER;
                    self.crt += 1;
                    self.rn -= 1;
                    self.restore_journal[self.rn] = u as i64;
                }
            }
        }
    }

    /// `Fold(S, NS)`: preconditions `|NS| = |S| + 1`, `S` and `NS` disjoint,
    /// every vertex undecided.
    pub(crate) fn compute_fold(&mut self, s_set: &[usize], ns_set: &[usize]) {
        debug_assert_eq!(ns_set.len(), s_set.len() + 1);
        let k = s_set.len();
        let mut removed = Vec::with_capacity(2 * k);
        removed.extend_from_slice(s_set);
        removed.extend_from_slice(&ns_set[1..]);
        let proxy = ns_set[0];

        self.used.clear();
        for &v in s_set {
            self.used.insert(v);
        }
        let mut p = 0usize;
        for &v in ns_set {
            debug_assert!(!self.used.contains(v));
            for i in 0..self.adj[v].len() {
                let u = self.adj[v][i];
                if self.x[u] < 0 && self.used.insert(u) {
                    self.mod_tmp[p] = u as i64;
                    p += 1;
                }
            }
        }
        let mut proxy_adj: Vec<usize> = self.mod_tmp[..p].iter().map(|&u| u as usize).collect();
        proxy_adj.sort_unstable();

        let mut vs = Vec::with_capacity(proxy_adj.len() + 1);
        vs.push(proxy);
        let mut new_adj: Vec<Vec<usize>> = Vec::with_capacity(proxy_adj.len() + 1);
        new_adj.push(proxy_adj.clone());

        self.used.clear();
        for &v in s_set {
            self.used.insert(v);
        }
        for &v in ns_set {
            self.used.insert(v);
        }

        for v in proxy_adj {
            let mut q = 0usize;
            let mut added_proxy = false;
            for i in 0..self.adj[v].len() {
                let u = self.adj[v][i];
                if self.x[u] < 0 && !self.used.contains(u) {
                    if !added_proxy && proxy < u {
                        self.mod_tmp[q] = proxy as i64;
                        q += 1;
                        added_proxy = true;
                    }
                    self.mod_tmp[q] = u as i64;
                    q += 1;
                }
            }
            if !added_proxy {
                self.mod_tmp[q] = proxy as i64;
                q += 1;
            }
            vs.push(v);
            new_adj.push(self.mod_tmp[..q].iter().map(|&u| u as usize).collect());
        }

        self.splice_and_record(removed, vs, new_adj, |k, removed, vs, saved_adj| {
            Modification::Fold(FoldMod {
                k,
                removed,
                vs,
                saved_adj,
            })
        }, k);
    }

    /// `Alternative(A, B)`: preconditions `|A| = |B|`, both independent, all
    /// vertices undecided.
    pub(crate) fn compute_alternative(&mut self, a_set: &[usize], b_set: &[usize]) {
        debug_assert_eq!(a_set.len(), b_set.len());

        self.used.clear();
        for &b in b_set {
            for &u in &self.adj[b] {
                if self.x[u] < 0 {
                    self.used.insert(u);
                }
            }
        }
        let mut to_force = Vec::new();
        for &a in a_set {
            for &u in &self.adj[a] {
                if self.x[u] < 0 && self.used.contains(u) {
                    to_force.push(u);
                }
            }
        }
        for u in to_force {
            if self.x[u] < 0 {
                self.set(u, IN_COVER);
            }
        }

        let a2 = self.external_neighbours(a_set, b_set);
        let b2 = self.external_neighbours(b_set, a_set);

        let mut removed = Vec::with_capacity(a_set.len() + b_set.len());
        removed.extend_from_slice(a_set);
        removed.extend_from_slice(b_set);

        let mut vs = Vec::with_capacity(a2.len() + b2.len());
        vs.extend_from_slice(&a2);
        vs.extend_from_slice(&b2);
        let a_len = a2.len();

        self.used.clear();
        for &a in a_set {
            self.used.insert(a);
        }
        for &b in b_set {
            self.used.insert(b);
        }

        let mut new_adj: Vec<Vec<usize>> = Vec::with_capacity(vs.len());
        for (i, &v) in vs.iter().enumerate() {
            let other: &[usize] = if i < a_len { &b2 } else { &a2 };
            let mut q = 0usize;
            let mut oi = 0usize;
            for i2 in 0..self.adj[v].len() {
                let u = self.adj[v][i2];
                if self.x[u] < 0 && !self.used.contains(u) {
                    while oi < other.len() && other[oi] <= u {
                        if !self.used.contains(other[oi]) {
                            self.mod_tmp[q] = other[oi] as i64;
                            q += 1;
                        }
                        oi += 1;
                    }
                    if q == 0 || self.mod_tmp[q - 1] != u as i64 {
                        self.mod_tmp[q] = u as i64;
                        q += 1;
                    }
                }
            }
            while oi < other.len() {
                if !self.used.contains(other[oi]) {
                    self.mod_tmp[q] = other[oi] as i64;
                    q += 1;
                }
                oi += 1;
            }
            new_adj.push(self.mod_tmp[..q].iter().map(|&u| u as usize).collect());
        }

        self.splice_and_record(removed, vs, new_adj, |a_len, removed, vs, saved_adj| {
            Modification::Alternative(AltMod {
                a_len,
                removed,
                vs,
                saved_adj,
            })
        }, a_len);
    }

    /// Builds the sorted, deduplicated external undecided neighbourhood of
    /// `set_a` excluding anything undecided-adjacent-marked via `used` at
    /// call time (mirrors `A2`/`B2` construction in `compute_alternative`).
    fn external_neighbours(&mut self, set_a: &[usize], set_b: &[usize]) -> Vec<usize> {
        self.used.clear();
        for &b in set_b {
            self.used.insert(b);
        }
        let mut p = 0usize;
        for &a in set_a {
            for i in 0..self.adj[a].len() {
                let u = self.adj[a][i];
                if self.x[u] < 0 && self.used.insert(u) {
                    self.mod_tmp[p] = u as i64;
                    p += 1;
                }
            }
        }
        let mut out: Vec<usize> = self.mod_tmp[..p].iter().map(|&u| u as usize).collect();
        out.sort_unstable();
        out
    }

    /// Shared tail of `compute_fold`/`compute_alternative`: splices the new
    /// adjacency into `vs`, saving the old adjacency for restore; marks
    /// `removed` vertices absent; pushes the modification and journal
    /// sentinel.
    fn splice_and_record<F>(
        &mut self,
        removed: Vec<usize>,
        vs: Vec<usize>,
        mut new_adj: Vec<Vec<usize>>,
        build: F,
        extra: usize,
    ) where
        F: FnOnce(usize, Vec<usize>, Vec<usize>, Vec<(usize, Vec<usize>)>) -> Modification,
    {
        let mut saved_adj = Vec::with_capacity(vs.len());
        for (i, &v) in vs.iter().enumerate() {
            let old = std::mem::replace(&mut self.adj[v], std::mem::take(&mut new_adj[i]));
            saved_adj.push((v, old));
        }
        for &v in &removed {
            self.x[v] = REMOVED;
        }
        self.rn -= removed.len();
        self.restore_journal[self.rn] = MOD_SENTINEL;
        self.modifications.push(build(extra, removed, vs, saved_adj));
    }

    /// Pops the restore journal down to `target_rn`, inverting every `set`
    /// and every modification it encounters, in LIFO order.
    pub(crate) fn restore(&mut self, target_rn: usize) {
        while self.rn < target_rn {
            let entry = self.restore_journal[self.rn];
            if entry >= 0 {
                let v = entry as usize;
                self.crt -= self.x[v] as usize;
                self.x[v] = UNDECIDED;
                self.rn += 1;
            } else {
                let m = self.modifications.pop().expect("restore past a valid journal position");
                m.restore(self);
            }
        }
    }

    /// Projects `y` (a full-length assignment) through every live
    /// modification, most-recent first, turning a cover on the reduced
    /// graph into a cover on the original graph.
    pub(crate) fn reverse(&mut self) {
        let mut y = std::mem::take(&mut self.y);
        for m in self.modifications.iter().rev() {
            m.reverse(&mut y);
        }
        self.y = y;
    }

    /// Same projection as `reverse`, but applied to an arbitrary buffer
    /// (used by the packing reduction and by decomposition, which both need
    /// to peek at a cover projected through modifications without touching
    /// `self.y`).
    pub(crate) fn reverse_into(&self, buf: &mut [i8]) {
        for m in self.modifications.iter().rev() {
            m.reverse(buf);
        }
    }

    /// Count of vertices with no decided assignment yet.
    pub fn number_of_nodes_remaining(&self) -> usize {
        self.x[..self.n].iter().filter(|&&a| a < 0).count()
    }

    /// Count of edges with both endpoints still undecided.
    pub fn number_of_edges_remaining(&self) -> usize {
        let mut count = 0usize;
        for v in 0..self.n {
            if self.x[v] < 0 {
                count += self.adj[v].iter().filter(|&&u| self.x[u] < 0).count();
            }
        }
        count / 2
    }

    /// Whether any vertex is currently absent due to an in-flight fold or
    /// alternative modification.
    pub fn folded_vertices_exist(&self) -> bool {
        let mut buf = self.x.clone();
        self.reverse_into(&mut buf);
        buf.iter().any(|&a| a == REMOVED)
    }

    /// Size of the independent set the current (projected) assignment
    /// represents.
    pub fn get_current_is_size(&self) -> usize {
        let mut buf = self.x.clone();
        self.reverse_into(&mut buf);
        buf[..self.n].iter().filter(|&&a| a == OUT_OF_COVER).count()
    }

    /// Same as [`Solver::get_current_is_size`], but counts folded vertices
    /// (half of each fold's proxy pair) without materializing a projection.
    pub fn get_current_is_size_with_folds(&self) -> usize {
        let is_count = self.x.iter().filter(|&&a| a == OUT_OF_COVER).count();
        let folded = self.x.iter().filter(|&&a| a == REMOVED).count();
        is_count + folded / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path4() -> Solver {
        // 0 - 1 - 2 - 3
        let adj = vec![vec![1], vec![0, 2], vec![1, 3], vec![2]];
        Solver::new_raw(adj, 4)
    }

    #[test]
    fn deg_counts_only_undecided_neighbours() {
        let mut s = path4();
        assert_eq!(s.deg(1), 2);
        s.set(0, OUT_OF_COVER);
        assert_eq!(s.deg(1), 1);
    }

    #[test]
    fn set_zero_forces_neighbours_into_cover() {
        let mut s = path4();
        s.set(1, OUT_OF_COVER);
        assert_eq!(s.x[0], IN_COVER);
        assert_eq!(s.x[2], IN_COVER);
        assert_eq!(s.crt, 2);
        assert_eq!(s.rn, 2);
    }

    #[test]
    fn restore_after_set_is_a_no_op() {
        let mut s = path4();
        let rn0 = s.rn;
        s.set(1, OUT_OF_COVER);
        s.restore(rn0);
        assert_eq!(s.rn, rn0);
        assert_eq!(s.crt, 0);
        assert!(s.x.iter().all(|&a| a == UNDECIDED));
    }

    #[test]
    fn fold_push_pop_restores_adjacency() {
        let mut s = path4();
        let rn0 = s.rn;
        let adj_before = s.adj.clone();
        s.compute_fold(&[1], &[0, 2]);
        assert_eq!(s.x[0], REMOVED);
        assert_eq!(s.x[2], REMOVED);
        s.restore(rn0);
        assert_eq!(s.rn, rn0);
        assert_eq!(s.adj, adj_before);
        assert!(s.x[..s.n].iter().all(|&a| a == UNDECIDED));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// A random tree on `n` vertices: vertex `i` picks some `j < i` as its
    /// parent, so the result is always connected and loop-free.
    fn random_tree(n: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
        proptest::collection::vec(0usize..(n.max(2)), n.saturating_sub(1)).prop_map(move |picks| {
            let mut adj = vec![Vec::new(); n];
            for child in 1..n {
                let parent = picks[child - 1] % child;
                adj[child].push(parent);
                adj[parent].push(child);
            }
            adj
        })
    }

    proptest! {
        /// `compute_fold` followed by `restore(rn0)` must leave adjacency,
        /// assignment and `rn` exactly as they were, for any tree and any
        /// degree-2 vertex folded away.
        #[test]
        fn fold_push_then_pop_is_identity(
            (n, adj) in (4usize..20).prop_flat_map(|n| (Just(n), random_tree(n)))
        ) {
            let mut s = Solver::new_raw(adj.clone(), n);
            let v = match (0..n).find(|&v| s.adj[v].len() == 2) {
                Some(v) => v,
                None => return Ok(()),
            };
            let rn0 = s.rn;
            let adj_before = s.adj.clone();
            let mut ns = s.adj[v].clone();
            ns.sort_unstable();

            s.compute_fold(&[v], &ns);
            prop_assert_eq!(s.x[v], REMOVED);
            s.restore(rn0);

            prop_assert_eq!(s.rn, rn0);
            prop_assert_eq!(&s.adj, &adj_before);
            prop_assert!(s.x[..s.n].iter().all(|&a| a == UNDECIDED));
        }

        /// Any sequence of `set` calls (each respecting the "still
        /// undecided" precondition), followed by `restore(rn0)`, must undo
        /// itself completely: `rn`, `crt`, `x` and `adj` all return to their
        /// pre-sequence values.
        #[test]
        fn restore_to_rn0_undoes_arbitrary_sets(
            (n, adj, choices) in (3usize..20).prop_flat_map(|n| {
                (Just(n), random_tree(n), proptest::collection::vec(any::<bool>(), n))
            })
        ) {
            let mut s = Solver::new_raw(adj.clone(), n);
            let rn0 = s.rn;
            let adj_before = s.adj.clone();

            for (v, &out) in choices.iter().enumerate() {
                if s.x[v] < 0 {
                    s.set(v, if out { OUT_OF_COVER } else { IN_COVER });
                }
            }
            s.restore(rn0);

            prop_assert_eq!(s.rn, rn0);
            prop_assert_eq!(s.crt, 0);
            prop_assert!(s.x[..s.n].iter().all(|&a| a == UNDECIDED));
            prop_assert_eq!(&s.adj, &adj_before);
        }
    }
}
