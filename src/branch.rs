//! Vertex selection, mirror detection and the two-child branch step.

use crate::adapters::{articulation_points, AdjGraph, MaxFlowEngine, MinCutEngine};
use crate::config::BranchingStrategy;
use crate::state::{PackingConstraint, Solver, IN_COVER, OUT_OF_COVER};
use rand::Rng;

impl Solver {
    /// Undecided vertex with the most undecided neighbours, ties broken by
    /// fewest edges among that neighbourhood (prefers a vertex whose
    /// neighbourhood is closer to independent, which tends to fold well).
    pub(crate) fn get_max_deg_vtx(&mut self) -> usize {
        let mut v = usize::MAX;
        let mut degree = 0usize;
        let mut min_e = usize::MAX;
        for u in 0..self.n {
            if self.x[u] < 0 {
                let dv = self.deg(u);
                if v != usize::MAX && dv < degree {
                    continue;
                }
                self.used.clear();
                for &w in &self.adj[u] {
                    if self.x[w] < 0 {
                        self.used.insert(w);
                    }
                }
                let e = {
                    let mut count = 0usize;
                    for &w in &self.adj[u] {
                        if self.x[w] < 0 {
                            count += self.adj[w].iter().filter(|&&z| self.x[z] < 0 && self.used.contains(z)).count();
                        }
                    }
                    count / 2
                };
                if v == usize::MAX || dv > degree || (dv == degree && e < min_e) {
                    v = u;
                    degree = dv;
                    min_e = e;
                }
            }
        }
        v
    }

    /// Builds an adjacency list over the undecided vertices only, with
    /// vertex ids compacted to `0..k`. Returns `(compact -> original, adj)`.
    fn undecided_subgraph(&self) -> (Vec<usize>, Vec<Vec<usize>>) {
        let mut id = vec![usize::MAX; self.n];
        let mut compact_to_orig = Vec::new();
        for v in 0..self.n {
            if self.x[v] < 0 {
                id[v] = compact_to_orig.len();
                compact_to_orig.push(v);
            }
        }
        let mut adj = vec![Vec::new(); compact_to_orig.len()];
        for (c, &v) in compact_to_orig.iter().enumerate() {
            for &u in &self.adj[v] {
                if self.x[u] < 0 {
                    adj[c].push(id[u]);
                }
            }
        }
        (compact_to_orig, adj)
    }

    fn get_articulation_point(&mut self) -> Option<usize> {
        let (compact_to_orig, adj) = self.undecided_subgraph();
        if compact_to_orig.is_empty() {
            return None;
        }
        let graph = AdjGraph { adj: &adj };
        articulation_points(&graph).first().map(|&c| compact_to_orig[c])
    }

    fn get_mincut_vertex(&mut self) -> Option<usize> {
        let (compact_to_orig, adj) = self.undecided_subgraph();
        if compact_to_orig.is_empty() {
            return None;
        }
        let graph = AdjGraph { adj: &adj };
        let (_, side) = self.min_cut.global_min_cut(&graph);
        side.first().map(|&c| compact_to_orig[c])
    }

    fn get_stcut_vertices(&mut self) -> Vec<usize> {
        let (compact_to_orig, adj) = self.undecided_subgraph();
        if compact_to_orig.is_empty() {
            return Vec::new();
        }
        let graph = AdjGraph { adj: &adj };
        let (_, side) = self.min_cut.global_min_cut(&graph);
        side.into_iter().map(|c| compact_to_orig[c]).collect()
    }

    fn select_branch_vertex(&mut self) -> usize {
        match self.config.branching {
            BranchingStrategy::Random => {
                let p = self.rng.gen_range(0..self.rn.max(1));
                let mut remaining = p;
                let mut chosen = usize::MAX;
                for i in 0..self.n {
                    if self.x[i] < 0 {
                        if remaining == 0 {
                            chosen = i;
                            break;
                        }
                        remaining -= 1;
                    }
                }
                chosen
            }
            BranchingStrategy::MinDegree => {
                let mut v = usize::MAX;
                let mut best = usize::MAX;
                for u in 0..self.n {
                    if self.x[u] < 0 {
                        let d = self.deg(u);
                        if d < best {
                            best = d;
                            v = u;
                        }
                    }
                }
                v
            }
            BranchingStrategy::MaxDegreeMinEdges => self.get_max_deg_vtx(),
            BranchingStrategy::ArticulationPoint => self
                .get_articulation_point()
                .unwrap_or_else(|| self.get_max_deg_vtx()),
            BranchingStrategy::GlobalMincut => self
                .get_mincut_vertex()
                .unwrap_or_else(|| self.get_max_deg_vtx()),
            BranchingStrategy::StCut => {
                while let Some(&last) = self.cut_stack.last() {
                    if self.x[last] != -1 {
                        self.cut_stack.pop();
                    } else {
                        break;
                    }
                }
                if self.cut_stack.is_empty() {
                    let refill = self.get_stcut_vertices();
                    if refill.is_empty() {
                        self.cut_stack.push(self.get_max_deg_vtx());
                    } else {
                        self.cut_stack.extend(refill);
                    }
                }
                self.cut_stack.pop().unwrap_or_else(|| self.get_max_deg_vtx())
            }
        }
    }

    /// Selects a branch vertex `v`, finds its mirrors, emits a unit (or
    /// binary, if mirrors exist) packing constraint, then recurses on
    /// `v in cover` and (unless pruned) `v in independent set`.
    pub(crate) fn branching(&mut self, deadline: Option<std::time::Instant>) {
        let old_lb = self.lb;
        let v = self.select_branch_vertex();
        let dv = self.deg(v);

        self.used.clear();
        self.used.insert(v);
        let mut ps = vec![-2i64; self.n];
        for &u in &self.adj[v] {
            if self.x[u] < 0 {
                self.used.insert(u);
                ps[u] = -1;
            }
        }
        let mut mirrors: Vec<usize> = Vec::new();
        for &u in self.adj[v].clone().iter() {
            if self.x[u] < 0 {
                for &w in self.adj[u].clone().iter() {
                    if self.x[w] < 0 && self.used.insert(w) {
                        let mut c1 = dv as i64;
                        for &z in &self.adj[w] {
                            if self.x[z] < 0 && ps[z] != -2 {
                                ps[z] = w as i64;
                                c1 -= 1;
                            }
                        }
                        let mut ok = true;
                        for &u2 in &self.adj[v] {
                            if self.x[u2] < 0 && ps[u2] != w as i64 {
                                let c2 = self.adj[u2]
                                    .iter()
                                    .filter(|&&w2| self.x[w2] < 0 && ps[w2] == w as i64)
                                    .count() as i64;
                                if c2 != c1 - 1 {
                                    ok = false;
                                    break;
                                }
                            }
                        }
                        if ok {
                            mirrors.push(w);
                        }
                    }
                }
            }
        }

        let pn = self.rn;
        let old_p = self.packing.len();
        if self.config.reduction_level() >= 3 {
            let limit = if !mirrors.is_empty() { 2 } else { 1 };
            let mut members = Vec::new();
            for &u in &self.adj[v] {
                if self.x[u] < 0 {
                    members.push(u);
                }
            }
            self.packing.push(PackingConstraint { limit, vertices: members });
        }

        if self.depth <= self.config.log_depth_limit {
            if mirrors.is_empty() {
                log::trace!("depth={} branch ({}): 1", self.depth, v);
            } else {
                log::trace!("depth={} branchMirror ({}, {}): 1", self.depth, v, mirrors.len());
            }
        }
        self.set(v, IN_COVER);
        for &m in &mirrors {
            self.set(m, IN_COVER);
        }
        self.depth += 1;
        self.rec(deadline);
        self.packing.truncate(old_p);
        self.lb = old_lb;
        self.depth -= 1;
        self.restore(pn);

        if self.lb >= self.opt as i64 {
            return;
        }

        if mirrors.is_empty() {
            self.used.clear();
            self.used.insert(v);
            for &u in &self.adj[v] {
                if self.x[u] < 0 {
                    self.used.insert(u);
                }
            }
            if self.config.reduction_level() >= 3 {
                let mut ws = vec![-1i64; self.n];
                for &u in self.adj[v].clone().iter() {
                    if self.x[u] < 0 {
                        let mut tmp: Vec<usize> = Vec::new();
                        for &w in &self.adj[u] {
                            if self.x[w] < 0 && !self.used.contains(w) {
                                tmp.push(w);
                                ws[w] = u as i64;
                            }
                        }
                        debug_assert!(tmp.len() >= 1);
                        let mut limit = 1usize;
                        if tmp.len() >= 1 {
                            for &u2 in &self.adj[tmp[0]] {
                                if self.x[u2] < 0 && self.used.contains(u2) && u2 != u {
                                    let mut c: i64 = 0;
                                    let mut bad = false;
                                    for &w in &self.adj[u2] {
                                        if self.x[w] < 0 {
                                            if ws[w] == u as i64 {
                                                c += 1;
                                            } else if w == u || !self.used.contains(w) {
                                                bad = true;
                                                break;
                                            }
                                        }
                                    }
                                    if !bad && c == tmp.len() as i64 {
                                        limit = 2;
                                        break;
                                    }
                                }
                            }
                        }
                        let mut members = vec![u];
                        members.extend_from_slice(&tmp);
                        self.packing.push(PackingConstraint { limit, vertices: members });
                    }
                }
            }
        }

        if self.depth <= self.config.log_depth_limit {
            log::trace!("depth={} branch ({}): 0", self.depth, v);
        }
        self.set(v, OUT_OF_COVER);
        self.depth += 1;
        self.rec(deadline);
        self.packing.truncate(old_p);
        self.lb = old_lb;
        self.depth -= 1;
        self.restore(pn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn max_deg_vtx_on_star_is_center() {
        let mut adj = vec![Vec::new(); 4];
        for leaf in 1..4 {
            adj[0].push(leaf);
            adj[leaf].push(0);
        }
        let mut s = Solver::new_raw(adj, 4);
        assert_eq!(s.get_max_deg_vtx(), 0);
    }

    #[test]
    fn branching_on_triangle_reaches_size_two_cover() {
        let adj = vec![vec![1, 2], vec![0, 2], vec![0, 1]];
        let mut s = Solver::new_raw(adj, 3);
        s.config = Config::default();
        s.opt = s.n;
        s.branching(None);
        assert!(s.opt <= 2);
    }
}
