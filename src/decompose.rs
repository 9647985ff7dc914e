//! Connected-component decomposition.
//!
//! A vertex cover decomposes additively across connected components: if the
//! undecided subgraph splits into components `C1..Ck`, the optimal
//! completion is the sum of each component's own optimal cover. When a
//! branch node's undecided subgraph is disconnected (and not "barely
//! smaller" than its parent, the same `shrink_factor` guard the reference
//! implementation uses), each component is solved to completion
//! independently by a fresh [`Solver`] rather than explored jointly.
//!
//! Unlike the reference implementation, component sub-solvers do not
//! inherit packing constraints or in-flight modifications from the parent:
//! each one solves its induced subgraph from a clean slate. This forgoes
//! some cross-boundary pruning the original's packing/modification
//! retargeting gave it, but every child still computes its component's
//! exact optimum, so the combined result is still exact — decomposition
//! remains a correctness-preserving search accelerator, only a slightly
//! less aggressive one.

use crate::solver::SolveOutcome;
use crate::state::Solver;
use std::time::Instant;

impl Solver {
    /// Splits the undecided subgraph into connected components and, unless
    /// there's only one component not meaningfully smaller than the current
    /// subproblem, solves each to completion and records the combined
    /// result. Returns `true` if it ran (in which case the caller should
    /// stop searching this node: either decomposition proved this node's
    /// optimum, or it ran out of time and the caller should propagate that
    /// upward rather than branch further).
    pub(crate) fn decompose(&mut self, deadline: Option<Instant>) -> bool {
        let mut id = vec![usize::MAX; self.n];
        let mut components: Vec<Vec<usize>> = Vec::new();
        for s in 0..self.n {
            if self.x[s] < 0 && id[s] == usize::MAX {
                let comp_idx = components.len();
                let mut members = Vec::new();
                let mut queue = vec![s];
                id[s] = comp_idx;
                while let Some(v) = queue.pop() {
                    members.push(v);
                    for &u in &self.adj[v] {
                        if self.x[u] < 0 && id[u] == usize::MAX {
                            id[u] = comp_idx;
                            queue.push(u);
                        }
                    }
                }
                components.push(members);
            }
        }

        let n_components = components.len();
        if n_components <= 1
            && (self.n <= 100 || (self.n as f64) * self.config.shrink_factor < self.rn as f64)
        {
            return false;
        }
        if self.depth <= self.config.log_depth_limit {
            log::debug!("depth={} decompose: {} components", self.depth, n_components);
        }

        let mut sum = 0usize;
        let mut updates: Vec<(Vec<usize>, Vec<i8>)> = Vec::with_capacity(n_components);
        for members in &components {
            if let Some(d) = deadline {
                if Instant::now() >= d {
                    return true;
                }
            }
            let mut local_id = std::collections::HashMap::with_capacity(members.len());
            for (local, &v) in members.iter().enumerate() {
                local_id.insert(v, local);
            }
            let mut adj = vec![Vec::new(); members.len()];
            for (local, &v) in members.iter().enumerate() {
                for &u in &self.adj[v] {
                    if self.x[u] < 0 {
                        adj[local].push(local_id[&u]);
                    }
                }
            }
            let mut child = Solver::new_raw(adj, members.len());
            child.config = self.config;
            match child.solve(deadline) {
                SolveOutcome::Optimum(size) => {
                    sum += size;
                    updates.push((members.clone(), child.y));
                }
                SolveOutcome::TimedOut => return true,
            }
        }

        let new_crt = self.crt + sum;
        if new_crt < self.opt {
            if self.depth <= self.config.log_depth_limit {
                log::debug!("depth={} opt: {} -> {}", self.depth, self.opt, new_crt);
            }
            self.opt = new_crt;
            self.y = self.x.clone();
            for (members, child_y) in &updates {
                for (local, &v) in members.iter().enumerate() {
                    self.y[v] = child_y[local];
                }
            }
            self.reverse();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::IN_COVER;

    #[test]
    fn two_disjoint_edges_decompose_and_sum_to_two() {
        // 0-1 and 2-3: two disjoint components, each needs exactly 1 cover vertex
        let adj = vec![vec![1], vec![0], vec![3], vec![2]];
        let mut s = Solver::new_raw(adj, 4);
        s.opt = s.n;
        s.y = vec![IN_COVER; 4];
        let ran = s.decompose(None);
        assert!(ran);
        assert_eq!(s.opt, 2);
    }
}
