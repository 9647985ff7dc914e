//! Lower-bound estimators combined by [`Solver::lower_bound`].

impl crate::state::Solver {
    /// `crt + ceil(rn / 2)`: every undecided vertex is in at least one edge
    /// of the (near-)perfect LP matching, so at least half of them must be
    /// in any cover.
    pub(crate) fn lp_lower_bound(&self) -> usize {
        self.crt + (self.rn + 1) / 2
    }

    /// Partitions the undecided vertices into cycles of the LP matching's
    /// functional graph (`lp_out`), adding `size - 1` per clique-shaped
    /// cycle or `ceil(size / 2)` per odd cycle after splicing out any even
    /// chords that would otherwise make the bound non-tight.
    pub(crate) fn cycle_lower_bound(&mut self) -> usize {
        let n = self.n;
        let mut lb = self.crt;
        let mut id = vec![-1i64; n];
        let mut pos = vec![0usize; n];

        for i in 0..n {
            if self.x[i] < 0 && id[i] < 0 {
                let mut s: Vec<usize> = Vec::new();
                let mut v = i;
                loop {
                    debug_assert!(id[v] < 0);
                    id[v] = i as i64;
                    v = if self.lp_out[v] >= 0 { self.lp_out[v] as usize } else { v };
                    pos[v] = s.len();
                    s.push(v);
                    if v == i {
                        break;
                    }
                }
                let mut size = s.len();
                let mut clique = true;
                for &v in &s {
                    let num = self.adj[v]
                        .iter()
                        .filter(|&&u| self.x[u] < 0 && id[u] == i as i64)
                        .count();
                    if num != size - 1 {
                        clique = false;
                        break;
                    }
                }
                if clique {
                    lb += size - 1;
                    continue;
                }
                while size >= 6 {
                    let mut min_size = size;
                    let mut split_s = 0usize;
                    let mut split_t = size;
                    for j in 0..size {
                        self.used.clear();
                        let v = s[j];
                        for &u in &self.adj[v] {
                            if self.x[u] < 0 && id[u] == i as i64 {
                                self.used.insert(u);
                            }
                        }
                        let v2 = s[(j + 1) % size];
                        for &u in &self.adj[v2] {
                            if self.x[u] < 0 && id[u] == i as i64 {
                                let next = s[(pos[u] + 1) % size];
                                if self.used.contains(next) {
                                    let size2 = (pos[u] + size - j) % size;
                                    if min_size > size2 && size2 % 2 != 0 {
                                        min_size = size2;
                                        split_s = (j + 1) % size;
                                        split_t = (pos[u] + 1) % size;
                                    }
                                }
                            }
                        }
                    }
                    if min_size == size {
                        break;
                    }
                    let mut s2 = Vec::with_capacity(size - min_size);
                    let mut j = split_t;
                    while j != split_s {
                        s2.push(s[j]);
                        j = (j + 1) % size;
                    }
                    let mut j = split_s;
                    while j != split_t {
                        id[s[j]] = n as i64;
                        j = (j + 1) % size;
                    }
                    s = s2;
                    size -= min_size;
                    debug_assert_eq!(size, s.len());
                    debug_assert!(min_size > 1);
                    lb += (min_size + 1) / 2;
                    for (j, &v) in s.iter().enumerate() {
                        pos[v] = j;
                    }
                }
                debug_assert!(size > 1 || s.len() == 1);
                lb += (size + 1) / 2;
            }
        }
        lb
    }

    /// Greedy clique cover over undecided vertices, ascending-degree order,
    /// assigning each vertex to the largest already-placed clique it
    /// completes; the number of cliques (vertices that start a new one)
    /// plus `crt` lower-bounds the cover.
    pub(crate) fn clique_lower_bound(&mut self) -> usize {
        let mut need = self.crt;
        let mut order: Vec<(usize, usize)> = (0..self.n)
            .filter(|&i| self.x[i] < 0)
            .map(|i| (self.deg(i), i))
            .collect();
        order.sort_unstable();

        let mut clique_of = vec![usize::MAX; self.n];
        let mut clique_size = vec![0usize; self.n];
        let mut internal_edges = vec![0usize; self.n];
        self.used.clear();

        for &(_, v) in &order {
            for &u in &self.adj[v] {
                if self.x[u] < 0 && self.used.contains(u) {
                    internal_edges[clique_of[u]] = 0;
                }
            }
            let mut to = v;
            let mut max = 0usize;
            for &u in &self.adj[v] {
                if self.x[u] < 0 && self.used.contains(u) {
                    let c = clique_of[u];
                    internal_edges[c] += 1;
                    if internal_edges[c] == clique_size[c] && max < clique_size[c] {
                        to = c;
                        max = clique_size[c];
                    }
                }
            }
            clique_of[v] = to;
            if to != v {
                clique_size[to] += 1;
                need += 1;
            } else {
                clique_size[v] = 1;
            }
            self.used.insert(v);
        }
        need
    }

    /// Combines every estimator enabled by `self.config.lower_bound`,
    /// caching the running maximum in `self.lb`.
    pub(crate) fn lower_bound(&mut self) -> usize {
        use crate::config::LowerBoundLevel::*;
        let mut source = "crt";
        if (self.lb as i64) < self.crt as i64 {
            self.lb = self.crt as i64;
        }
        let level = self.config.lower_bound;
        if matches!(level, Clique | All) {
            let v = self.clique_lower_bound();
            if self.lb < v as i64 {
                self.lb = v as i64;
                source = "clique";
            }
        }
        if matches!(level, Lp | All) {
            let v = self.lp_lower_bound();
            if self.lb < v as i64 {
                self.lb = v as i64;
                source = "lp";
            }
        }
        if matches!(level, Cycle | All) {
            let v = self.cycle_lower_bound();
            if self.lb < v as i64 {
                self.lb = v as i64;
                source = "cycle";
            }
        }
        if self.depth <= self.config.log_depth_limit {
            log::debug!("depth={} lb: {} ({}), {}", self.depth, self.lb, source, self.opt);
        }
        self.lb as usize
    }
}

#[cfg(test)]
mod tests {
    use crate::state::Solver;

    #[test]
    fn lp_lower_bound_on_empty_graph_is_crt() {
        let s = Solver::new_raw(Vec::new(), 0);
        assert_eq!(s.lp_lower_bound(), 0);
    }

    #[test]
    fn clique_lower_bound_on_triangle_is_two() {
        let adj = vec![vec![1, 2], vec![0, 2], vec![0, 1]];
        let mut s = Solver::new_raw(adj, 3);
        // a triangle needs at least 2 vertices in any vertex cover
        assert_eq!(s.clique_lower_bound(), 2);
    }
}
