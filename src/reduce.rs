//! Kernelization rules and the fixed-point loop that drives them.
//!
//! Every rule below only ever shrinks `rn` (by `set`-ing a vertex or folding
//! a subgraph); none of them undo anything themselves, that's `Solver::restore`'s
//! job. Scratch buffers (`que`, `level`, `iter_`, `mod_tmp`, `used`) are
//! reused across rules: each rule resets whatever slice of them it needs
//! before reading, never relies on another rule's leftovers.

use crate::state::{PackingConstraint, Solver, IN_COVER, OUT_OF_COVER};

impl Solver {
    /// Logs a rule's shrinkage at trace level, gated by `log_depth_limit`,
    /// mirroring the reference implementation's `debugString()`-prefixed
    /// `fprintf` calls in every reduction rule.
    fn log_rule_progress(&self, name: &str, old_rn: usize) {
        if old_rn != self.rn && self.depth <= self.config.log_depth_limit {
            log::trace!("depth={} {}: {} -> {}", self.depth, name, old_rn, self.rn);
        }
    }

    /// Pushes undecided-degree-<=1 vertices into the independent set,
    /// propagating as neighbours drop below the threshold.
    pub(crate) fn deg1_reduction(&mut self) -> bool {
        let old_rn = self.rn;
        self.used.clear();
        let mut queue: Vec<usize> = Vec::new();
        for v in 0..self.n {
            if self.x[v] < 0 {
                let d = self.deg(v);
                self.iter_[v] = d as i64;
                if d <= 1 {
                    queue.push(v);
                    self.used.insert(v);
                }
            }
        }
        while let Some(v) = queue.pop() {
            if self.x[v] >= 0 {
                continue;
            }
            debug_assert!(self.iter_[v] <= 1);
            for i in 0..self.adj[v].len() {
                let u = self.adj[v][i];
                if self.x[u] < 0 {
                    for j in 0..self.adj[u].len() {
                        let w = self.adj[u][j];
                        if self.x[w] < 0 {
                            self.iter_[w] -= 1;
                            if self.iter_[w] <= 1 && self.used.insert(w) {
                                queue.push(w);
                            }
                        }
                    }
                }
            }
            self.set(v, OUT_OF_COVER);
        }
        self.log_rule_progress("deg1", old_rn);
        old_rn != self.rn
    }

    /// `v` is dominated (safe to put in the cover) if some undecided
    /// neighbour `u`'s undecided neighbourhood is a subset of `N[v]`.
    pub(crate) fn dominate_reduction(&mut self) -> bool {
        let old_rn = self.rn;
        for v in 0..self.n {
            if self.x[v] < 0 {
                self.used.clear();
                self.used.insert(v);
                for &u in &self.adj[v] {
                    if self.x[u] < 0 {
                        self.used.insert(u);
                    }
                }
                for i in 0..self.adj[v].len() {
                    let u = self.adj[v][i];
                    if self.x[u] < 0 {
                        let dominated = self.adj[u]
                            .iter()
                            .all(|&w| self.x[w] >= 0 || self.used.contains(w));
                        if dominated {
                            self.set(v, IN_COVER);
                            break;
                        }
                    }
                }
            }
        }
        self.log_rule_progress("dominate", old_rn);
        old_rn != self.rn
    }

    /// `v` with exactly two undecided neighbours `a`, `b`: if `a~b`, `v` is
    /// in a triangle and goes to the independent set; otherwise fold `{v}`
    /// into `{a, b}`.
    pub(crate) fn fold2_reduction(&mut self) -> bool {
        let old_rn = self.rn;
        for v in 0..self.n {
            if self.x[v] < 0 {
                let mut tmp = [0usize; 3];
                let mut p = 0usize;
                let mut overflow = false;
                for &u in &self.adj[v] {
                    if self.x[u] < 0 {
                        if p < 3 {
                            tmp[p] = u;
                        }
                        p += 1;
                        if p > 2 {
                            overflow = true;
                            break;
                        }
                    }
                }
                if overflow || p < 2 {
                    continue;
                }
                let (a, b) = (tmp[0], tmp[1]);
                if self.adj[a].contains(&b) {
                    self.set(v, OUT_OF_COVER);
                } else {
                    self.compute_fold(&[v], &[a, b]);
                }
            }
        }
        self.log_rule_progress("fold2", old_rn);
        old_rn != self.rn
    }

    /// Two undecided degree-3 vertices sharing the same 3-neighbourhood are
    /// twins: fold them together if that neighbourhood is independent,
    /// otherwise both are safe for the independent set.
    pub(crate) fn twin_reduction(&mut self) -> bool {
        let old_rn = self.rn;
        for v in 0..self.n {
            if self.x[v] < 0 && self.deg(v) == 3 {
                let mut ns = [0usize; 3];
                let mut p = 0usize;
                for &u in self.adj[v].clone().iter() {
                    if self.x[u] < 0 {
                        ns[p] = u;
                        p += 1;
                    }
                }
                if p != 3 {
                    continue;
                }
                // find another degree-3 vertex with exactly this neighbourhood
                let mut twin = None;
                'search: for &u in &ns {
                    for &w in &self.adj[u].clone() {
                        if w != v && self.x[w] < 0 && self.deg(w) == 3 {
                            let w_ns: std::collections::BTreeSet<usize> =
                                self.adj[w].iter().copied().filter(|&z| self.x[z] < 0).collect();
                            let v_ns: std::collections::BTreeSet<usize> =
                                ns.iter().copied().collect();
                            if w_ns == v_ns {
                                twin = Some(w);
                                break 'search;
                            }
                        }
                    }
                }
                if let Some(w) = twin {
                    let independent = ns.iter().all(|&a| {
                        ns.iter().all(|&b| a == b || !self.adj[a].contains(&b))
                    });
                    if independent {
                        self.compute_fold(&[v, w], &ns);
                    } else {
                        self.set(v, OUT_OF_COVER);
                        self.set(w, OUT_OF_COVER);
                    }
                }
            }
        }
        self.log_rule_progress("twin", old_rn);
        old_rn != self.rn
    }

    /// Funnel: `v`'s undecided neighbourhood is a clique minus one vertex
    /// `u`; alternative-fold `{v}` against `{u}`.
    pub(crate) fn funnel_reduction(&mut self) -> bool {
        let old_rn = self.rn;
        'outer: for v in 0..self.n {
            if self.x[v] < 0 {
                self.used.clear();
                let mut tmp: Vec<usize> = Vec::new();
                for &u in &self.adj[v] {
                    if self.x[u] < 0 && self.used.insert(u) {
                        tmp.push(u);
                    }
                }
                let p = tmp.len();
                if p <= 1 {
                    self.set(v, OUT_OF_COVER);
                    continue;
                }
                let internal_degree = |s: &Self, w: usize| -> usize {
                    s.adj[w].iter().filter(|&&u| s.x[u] < 0 && s.used.contains(u)).count()
                };
                let mut u1 = None;
                for &w in &tmp {
                    if internal_degree(self, w) + 1 < p {
                        u1 = Some(w);
                        break;
                    }
                }
                let u1 = match u1 {
                    Some(w) => w,
                    None => {
                        self.set(v, OUT_OF_COVER);
                        continue;
                    }
                };
                let u1_neighbours: std::collections::HashSet<usize> = self.adj[u1]
                    .iter()
                    .copied()
                    .filter(|&u| self.x[u] < 0)
                    .collect();
                let mut u2 = None;
                for &w in &tmp {
                    if w != u1 && !u1_neighbours.contains(&w) {
                        u2 = Some(w);
                        break;
                    }
                }
                let u2 = u2.expect("funnel: non-clique witness must have a non-neighbour in tmp");
                self.used.remove(u1);
                self.used.remove(u2);
                let d1 = self.adj[u1].iter().filter(|&&w| self.x[w] < 0 && self.used.contains(w)).count();
                let d2 = self.adj[u2].iter().filter(|&&w| self.x[w] < 0 && self.used.contains(w)).count();
                if d1 + 2 < p && d2 + 2 < p {
                    continue;
                }
                for &u in &tmp {
                    if u == u1 || u == u2 {
                        continue;
                    }
                    let d = self.adj[u].iter().filter(|&&w| self.x[w] < 0 && self.used.contains(w)).count();
                    if d + 3 < p {
                        continue 'outer;
                    }
                }
                let u = if d1 + 2 == p { u2 } else { u1 };
                self.compute_alternative(&[v], &[u]);
            }
        }
        self.log_rule_progress("funnel", old_rn);
        old_rn != self.rn
    }

    /// Desk: a pair of private-ish degree-3/4 neighbours `u1, u2` of `v`
    /// sharing a common degree-3/4 external neighbour `w` of matching shape.
    pub(crate) fn desk_reduction(&mut self) -> bool {
        let old_rn = self.rn;
        let mut nv = vec![-1i64; self.n];
        'outer: for v in 0..self.n {
            if self.x[v] < 0 {
                let mut tmp: Vec<usize> = Vec::new();
                for &u in &self.adj[v] {
                    if self.x[u] < 0 {
                        tmp.push(u);
                        nv[u] = v as i64;
                        if tmp.len() > 4 {
                            break;
                        }
                    }
                }
                let d = tmp.len();
                if d != 3 && d != 4 {
                    continue;
                }
                let candidates: Vec<usize> = tmp
                    .iter()
                    .copied()
                    .filter(|&u| matches!(self.deg(u), 3 | 4))
                    .collect();
                for i in 0..candidates.len() {
                    let u1 = candidates[i];
                    self.used.clear();
                    let mut s_b1 = 0usize;
                    for &w in &self.adj[u1].clone() {
                        if self.x[w] < 0 && w != v {
                            self.used.insert(w);
                            s_b1 += 1;
                        }
                    }
                    for j in (i + 1)..candidates.len() {
                        let u2 = candidates[j];
                        if self.used.contains(u2) {
                            continue;
                        }
                        let s_b2 = self.adj[u2]
                            .iter()
                            .filter(|&&w| self.x[w] < 0 && w != v && !self.used.contains(w))
                            .count();
                        if s_b1 + s_b2 > 3 {
                            continue;
                        }
                        for &w in &self.adj[u2].clone() {
                            if self.x[w] < 0 && self.used.contains(w) && nv[w] != v as i64 {
                                let d3 = self.deg(w);
                                if d3 == 3 || d3 == 4 {
                                    let mut s_a = d - 2;
                                    for &z in &self.adj[w] {
                                        if self.x[z] < 0 && z != u1 && z != u2 && nv[z] != v as i64 {
                                            s_a += 1;
                                        }
                                    }
                                    if s_a <= 2 {
                                        self.compute_alternative(&[v, w], &[u1, u2]);
                                        continue 'outer;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        self.log_rule_progress("desk", old_rn);
        old_rn != self.rn
    }

    /// Grows a closure `S` starting at `{v}`: any exclusive neighbour of the
    /// closure with no undecided neighbour outside it makes `v` unconfined,
    /// safe for the cover. After the closure stabilizes, also checks the
    /// "diamond" extension (two boundary vertices sharing an identical pair
    /// of outside neighbours).
    pub(crate) fn unconfined_reduction(&mut self) -> bool {
        let old_rn = self.rn;
        for v in 0..self.n {
            if self.x[v] < 0 {
                self.used.clear();
                self.used.insert(v);
                let mut ns: Vec<usize> = Vec::new();
                let mut deg: std::collections::HashMap<usize, i64> = std::collections::HashMap::new();
                for &u in &self.adj[v] {
                    if self.x[u] < 0 {
                        self.used.insert(u);
                        ns.push(u);
                        deg.insert(u, 1);
                    }
                }
                let mut p = 1usize;
                let mut became_cover = false;
                'grow: loop {
                    let mut changed = false;
                    let mut i = 0;
                    while i < ns.len() {
                        let u = ns[i];
                        if *deg.get(&u).unwrap_or(&0) != 1 {
                            i += 1;
                            continue;
                        }
                        let mut z: i64 = -1;
                        for &w in &self.adj[u] {
                            if self.x[w] < 0 && !self.used.contains(w) {
                                if z >= 0 {
                                    z = -2;
                                    break;
                                }
                                z = w as i64;
                            }
                        }
                        if z == -1 {
                            if self.config.reduction_level() >= 3 {
                                let mut members = vec![v];
                                for &w in &self.adj[v] {
                                    if self.x[w] < 0 {
                                        members.push(w);
                                    }
                                }
                                self.packing.push(PackingConstraint { limit: 1, vertices: members });
                            }
                            self.set(v, IN_COVER);
                            became_cover = true;
                            break 'grow;
                        } else if z >= 0 {
                            let z = z as usize;
                            self.used.insert(z);
                            p += 1;
                            changed = true;
                            for &w in &self.adj[z] {
                                if self.x[w] < 0 {
                                    if self.used.insert(w) {
                                        ns.push(w);
                                        deg.insert(w, 1);
                                    } else {
                                        *deg.entry(w).or_insert(0) += 1;
                                    }
                                }
                            }
                        }
                        i += 1;
                    }
                    if !changed {
                        break 'grow;
                    }
                }
                if !became_cover && self.x[v] < 0 && p >= 2 {
                    self.used.clear();
                    for &u in &ns {
                        self.used.insert(u);
                    }
                    let size = ns.len();
                    let mut pair: Vec<Option<(usize, usize)>> = vec![None; size];
                    for i in 0..size {
                        let u = ns[i];
                        if *deg.get(&u).unwrap_or(&0) != 2 {
                            continue;
                        }
                        let mut v1: i64 = -1;
                        let mut v2: i64 = -1;
                        for &w in &self.adj[u] {
                            if self.x[w] < 0 && !self.used.contains(w) {
                                if v1 < 0 {
                                    v1 = w as i64;
                                } else if v2 < 0 {
                                    v2 = w as i64;
                                } else {
                                    v1 = -1;
                                    v2 = -1;
                                    break;
                                }
                            }
                        }
                        if v1 >= 0 && v2 >= 0 {
                            let (mut a, mut b) = (v1 as usize, v2 as usize);
                            if a > b {
                                std::mem::swap(&mut a, &mut b);
                            }
                            pair[i] = Some((a, b));
                        }
                    }
                    'pairs: for i in 0..size {
                        if let Some(pi) = pair[i] {
                            let u = ns[i];
                            self.used.clear();
                            for &w in &self.adj[u] {
                                if self.x[w] < 0 {
                                    self.used.insert(w);
                                }
                            }
                            for j in (i + 1)..size {
                                if pair[j] == Some(pi) && !self.used.contains(ns[j]) {
                                    if self.config.reduction_level() >= 3 {
                                        let mut members = vec![v];
                                        for &w in &self.adj[v] {
                                            if self.x[w] < 0 {
                                                members.push(w);
                                            }
                                        }
                                        self.packing.push(PackingConstraint { limit: 1, vertices: members });
                                    }
                                    self.set(v, IN_COVER);
                                    break 'pairs;
                                }
                            }
                        }
                    }
                }
            }
        }
        self.log_rule_progress("unconfined", old_rn);
        old_rn != self.rn
    }

    /// Evaluates every packing constraint against the current (projected)
    /// assignment, forcing vertices and deriving new constraints as
    /// described by [`PackingConstraint`]. Returns `Err(())` if a
    /// constraint is violated, `Ok(changed)` otherwise.
    pub(crate) fn packing_reduction(&mut self) -> Result<bool, ()> {
        let old_rn = self.rn;
        let mut projected = self.x.clone();
        let mut cached_rn: i64 = -1;
        let mut pi = 0usize;
        while pi < self.packing.len() {
            if cached_rn != self.rn as i64 {
                projected.copy_from_slice(&self.x);
                self.reverse_into(&mut projected);
                cached_rn = self.rn as i64;
            }
            let limit = self.packing[pi].limit;
            let members = self.packing[pi].vertices.clone();
            let max = members.len() - limit;
            let mut sum = 0usize;
            let mut s_vertices: Vec<usize> = Vec::new();
            for &v in &members {
                if projected[v] < 0 {
                    s_vertices.push(v);
                }
                if projected[v] == 1 {
                    sum += 1;
                }
            }
            let size = s_vertices.len();
            if sum > max {
                return Err(());
            } else if sum == max && size > 0 {
                self.used.clear();
                let mut count: std::collections::HashMap<usize, i64> = std::collections::HashMap::new();
                for &s in &s_vertices {
                    self.used.insert(s);
                    count.insert(s, -1);
                }
                for &s in &s_vertices {
                    for &u in &self.adj[s].clone() {
                        if self.x[u] < 0 {
                            if self.used.insert(u) {
                                count.insert(u, 1);
                            } else if *count.get(&u).unwrap_or(&0) < 0 {
                                return Err(());
                            } else {
                                *count.get_mut(&u).unwrap() += 1;
                            }
                        }
                    }
                }
                let mut new_constraints = Vec::new();
                for &s in &s_vertices {
                    for &u in &self.adj[s].clone() {
                        if self.x[u] < 0 && *count.get(&u).unwrap_or(&0) == 1 {
                            let mut qs = Vec::new();
                            for &w in &self.adj[u] {
                                if self.x[w] < 0 && !self.used.contains(w) {
                                    qs.push(w);
                                }
                            }
                            new_constraints.push(PackingConstraint { limit: 1, vertices: qs });
                        }
                    }
                }
                for &s in &s_vertices {
                    debug_assert!(self.x[s] < 0);
                    self.set(s, OUT_OF_COVER);
                }
                self.packing.extend(new_constraints);
            } else if sum + size > max {
                debug_assert!(size >= 2);
                self.used.clear();
                for &s in &s_vertices {
                    self.used.insert(s);
                }
                let anchor = s_vertices[0];
                for &v in &self.adj[anchor].clone() {
                    if self.x[v] < 0 && !self.used.contains(v) {
                        let p = self.adj[v].iter().filter(|&&u| self.used.contains(u)).count();
                        if sum + p > max {
                            let mut qs = vec![v];
                            for &u in &self.adj[v] {
                                if self.x[u] < 0 {
                                    qs.push(u);
                                }
                            }
                            self.packing.push(PackingConstraint { limit: 2, vertices: qs });
                            self.set(v, IN_COVER);
                            break;
                        }
                    }
                }
            }
            pi += 1;
        }
        self.log_rule_progress("packing", old_rn);
        Ok(old_rn != self.rn)
    }

    fn dinic_dfs(&mut self, v: usize) -> bool {
        while self.iter_[v] >= 0 {
            let idx = self.iter_[v] as usize;
            let u = self.adj[v][idx];
            self.iter_[v] -= 1;
            if self.x[u] >= 0 {
                continue;
            }
            let w = self.lp_in[u];
            let recurse_ok = w >= 0
                && self.level[v] < self.level[w as usize]
                && self.iter_[w as usize] >= 0
                && self.dinic_dfs(w as usize);
            if w < 0 || recurse_ok {
                self.lp_in[u] = v as i64;
                self.lp_out[v] = u as i64;
                return true;
            }
        }
        false
    }

    /// Maintains a maximum matching between undecided vertices and their
    /// undecided neighbours (`lp_in`/`lp_out`), incrementally, via repeated
    /// Dinic phases.
    pub(crate) fn update_lp(&mut self) {
        for v in 0..self.n {
            let out = self.lp_out[v];
            if out >= 0 {
                let out_u = out as usize;
                if (self.x[v] < 0) != (self.x[out_u] < 0) {
                    self.lp_in[out_u] = -1;
                    self.lp_out[v] = -1;
                }
            }
        }
        loop {
            self.used.clear();
            let mut queue: Vec<usize> = Vec::new();
            for v in 0..self.n {
                if self.x[v] < 0 && self.lp_out[v] < 0 {
                    self.level[v] = 0;
                    self.used.insert(v);
                    queue.push(v);
                }
            }
            let mut ok = false;
            let mut qs = 0usize;
            while qs < queue.len() {
                let v = queue[qs];
                qs += 1;
                self.iter_[v] = self.adj[v].len() as i64 - 1;
                for i in 0..self.adj[v].len() {
                    let u = self.adj[v][i];
                    if self.x[u] < 0 && self.used.insert(self.n + u) {
                        let w = self.lp_in[u];
                        if w < 0 {
                            ok = true;
                        } else {
                            let w = w as usize;
                            self.level[w] = self.level[v] + 1;
                            self.used.insert(w);
                            queue.push(w);
                        }
                    }
                }
            }
            if !ok {
                break;
            }
            for v in (0..self.n).rev() {
                if self.x[v] < 0 && self.lp_out[v] < 0 {
                    self.dinic_dfs(v);
                }
            }
        }
    }

    /// Runs the matching, then discards any vertex reachable from an
    /// unmatched left vertex but unable to reach an unmatched right vertex:
    /// it can always be excluded from the cover (a Konig/crown argument).
    pub(crate) fn lp_reduction(&mut self) -> bool {
        let old_rn = self.rn;
        self.update_lp();
        for v in 0..self.n {
            if self.x[v] < 0 && self.used.contains(v) && !self.used.contains(self.n + v) {
                self.set(v, OUT_OF_COVER);
            }
        }
        // The reference implementation also builds a second, SCC-contraction
        // based crown here, but gates it on a condition hardcoded to false
        // before it is ever applied; it is unreachable by construction and
        // is not ported.
        self.log_rule_progress("lp", old_rn);
        old_rn != self.rn
    }

    /// Runs every rule enabled by `self.config.reduction` to a fixed point,
    /// highest-priority rule first, restarting from the top whenever any
    /// rule makes progress. Returns `true` iff a packing constraint turned
    /// out to be infeasible.
    pub(crate) fn reduce(&mut self) -> bool {
        let level = self.config.reduction_level();
        let old_rn = self.rn;
        loop {
            if self.deg1_reduction() {
                continue;
            }
            if level < 2 {
                if self.dominate_reduction() {
                    continue;
                }
            } else if self.unconfined_reduction() {
                continue;
            }
            if level >= 1 && self.lp_reduction() {
                continue;
            }
            if level >= 3 {
                match self.packing_reduction() {
                    Err(()) => return true,
                    Ok(true) => continue,
                    Ok(false) => {}
                }
            }
            if level >= 1 && self.fold2_reduction() {
                continue;
            }
            if level >= 2 {
                if self.twin_reduction() {
                    continue;
                }
                if self.funnel_reduction() {
                    continue;
                }
                if self.desk_reduction() {
                    continue;
                }
            }
            break;
        }
        if old_rn != self.rn && self.depth <= self.config.log_depth_limit {
            log::debug!("depth={} reduce: {} -> {}", self.depth, old_rn, self.rn);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(k: usize) -> Solver {
        let mut adj = vec![Vec::new(); k + 1];
        for leaf in 1..=k {
            adj[0].push(leaf);
            adj[leaf].push(0);
        }
        Solver::new_raw(adj, k + 1)
    }

    #[test]
    fn deg1_on_star_covers_the_center() {
        let mut s = star(4);
        assert!(s.deg1_reduction());
        assert_eq!(s.x[0], IN_COVER);
        for leaf in 1..=4 {
            assert_eq!(s.x[leaf], OUT_OF_COVER);
        }
    }

    #[test]
    fn fold2_on_path_folds_middle_vertex() {
        // 0 - 1 - 2 - 3, v=1 has exactly two undecided neighbours {0,2}
        let adj = vec![vec![1], vec![0, 2], vec![1, 3], vec![2]];
        let mut s = Solver::new_raw(adj, 4);
        assert!(s.fold2_reduction());
        assert_eq!(s.modifications.len(), 1);
    }

    #[test]
    fn dominate_removes_vertex_whose_neighbour_covers_less() {
        // triangle 0-1-2 plus a pendant 3 on vertex 0: vertex 0 dominates
        // its neighbour 1 (N[1] = {0,2} subset of N[0] = {0,1,2,3})... use
        // the simpler case: 1's neighbourhood {0,2} is a subset of 2's
        // neighbourhood {0,1} union {2}? Use K3 directly: every vertex
        // dominates every other, so the whole triangle collapses to a
        // single `set(v,1)`.
        let adj = vec![vec![1, 2], vec![0, 2], vec![0, 1]];
        let mut s = Solver::new_raw(adj, 3);
        assert!(s.dominate_reduction());
        assert!(s.x.iter().any(|&a| a == IN_COVER));
    }

    #[test]
    fn packing_unit_constraint_forces_independent_set() {
        let adj = vec![vec![1], vec![0]];
        let mut s = Solver::new_raw(adj, 2);
        s.packing.push(PackingConstraint { limit: 1, vertices: vec![0, 1] });
        assert_eq!(s.packing_reduction(), Ok(true));
        assert_eq!(s.x[0], OUT_OF_COVER);
        assert_eq!(s.x[1], IN_COVER);
    }
}
