//! Collaborator interfaces consumed by a subset of branching strategies.
//!
//! The core algorithm only needs narrow read-only graph iteration and a
//! max-flow/min-cut primitive; it does not care which concrete graph type or
//! flow implementation a host provides. [`DinicMaxFlow`] is a default,
//! crate-internal implementation so the solver works end-to-end without a
//! host wiring anything in, but any of these traits can be substituted.

/// Minimal read-only view over an undirected simple graph.
pub trait GraphView {
    /// Number of vertices.
    fn num_nodes(&self) -> usize;
    /// Neighbours of `v`.
    fn neighbors(&self, v: usize) -> &[usize];
}

/// A maximum-flow engine, used to refine the branch vertex chosen by
/// [`crate::config::BranchingStrategy::StCut`].
pub trait MaxFlowEngine {
    /// Returns the min-cut value between `source` and `sink`, together with
    /// the set of vertices on the source side of the cut.
    fn min_cut(&self, graph: &dyn GraphView, source: usize, sink: usize) -> (usize, Vec<usize>);
}

/// A global minimum-cut engine, used by
/// [`crate::config::BranchingStrategy::GlobalMincut`].
pub trait MinCutEngine {
    fn global_min_cut(&self, graph: &dyn GraphView) -> (usize, Vec<usize>);
}

/// Optional refinement hook for the st-cut branch vertex (Hopcroft-Karp
/// style bipartite matching).
pub trait BipartiteMatcher {
    /// Returns a maximum matching between `0..left` and `0..right` given
    /// `edges` (left id, right id) pairs.
    fn max_matching(&self, left: usize, right: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)>;
}

/// A tiny adjacency-list [`GraphView`] used internally to feed the adapters.
pub(crate) struct AdjGraph<'a> {
    pub adj: &'a [Vec<usize>],
}

impl<'a> GraphView for AdjGraph<'a> {
    fn num_nodes(&self) -> usize {
        self.adj.len()
    }
    fn neighbors(&self, v: usize) -> &[usize] {
        &self.adj[v]
    }
}

/// Iterative articulation-point detection (Tarjan's algorithm, explicit
/// stack rather than recursion so the depth cannot overflow the call stack
/// on a path-like graph).
pub(crate) fn articulation_points(graph: &dyn GraphView) -> Vec<usize> {
    let n = graph.num_nodes();
    let mut disc = vec![usize::MAX; n];
    let mut low = vec![0usize; n];
    let mut is_ap = vec![false; n];
    let mut timer = 0usize;

    struct Frame {
        v: usize,
        parent: usize,
        idx: usize,
    }

    for start in 0..n {
        if disc[start] != usize::MAX {
            continue;
        }
        let mut stack = vec![Frame {
            v: start,
            parent: usize::MAX,
            idx: 0,
        }];
        disc[start] = timer;
        low[start] = timer;
        timer += 1;
        let mut root_children = 0usize;

        while let Some(frame) = stack.last_mut() {
            let v = frame.v;
            let neighbors = graph.neighbors(v);
            if frame.idx < neighbors.len() {
                let u = neighbors[frame.idx];
                frame.idx += 1;
                if u == frame.parent {
                    continue;
                }
                if disc[u] == usize::MAX {
                    disc[u] = timer;
                    low[u] = timer;
                    timer += 1;
                    if v == start {
                        root_children += 1;
                    }
                    stack.push(Frame {
                        v: u,
                        parent: v,
                        idx: 0,
                    });
                } else if disc[u] < low[v] {
                    low[v] = disc[u];
                }
            } else {
                let finished = stack.pop().unwrap();
                if let Some(parent_frame) = stack.last_mut() {
                    let pv = parent_frame.v;
                    if low[finished.v] < low[pv] {
                        low[pv] = low[finished.v];
                    }
                    if pv != start && low[finished.v] >= disc[pv] {
                        is_ap[pv] = true;
                    }
                }
            }
        }
        if root_children > 1 {
            is_ap[start] = true;
        }
    }

    (0..n).filter(|&v| is_ap[v]).collect()
}

/// Split-vertex capacitated network used to turn vertex-connectivity into a
/// standard max-flow problem: vertex `v` becomes `in(v) = 2v` and
/// `out(v) = 2v+1`, joined by a capacity-1 edge; an original edge `(u, v)`
/// becomes infinite-capacity edges `out(u) -> in(v)` and `out(v) -> in(u)`.
struct FlowNet {
    // adjacency as (to, capacity, rev_edge_index) triples, two entries per
    // undirected/residual pair
    graph: Vec<Vec<(usize, i64, usize)>>,
}

const INF: i64 = i64::MAX / 4;

impl FlowNet {
    fn new(num_nodes: usize) -> Self {
        FlowNet {
            graph: vec![Vec::new(); num_nodes],
        }
    }

    fn add_edge(&mut self, from: usize, to: usize, cap: i64) {
        let rev_from = self.graph[to].len();
        let rev_to = self.graph[from].len();
        self.graph[from].push((to, cap, rev_from));
        self.graph[to].push((from, 0, rev_to));
    }

    fn from_graph_view(graph: &dyn GraphView) -> Self {
        let n = graph.num_nodes();
        let mut net = FlowNet::new(2 * n);
        for v in 0..n {
            net.add_edge(2 * v, 2 * v + 1, 1);
            for &u in graph.neighbors(v) {
                net.add_edge(2 * v + 1, 2 * u, INF);
            }
        }
        net
    }

    fn bfs_levels(&self, source: usize) -> Vec<i64> {
        let mut level = vec![-1i64; self.graph.len()];
        level[source] = 0;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(source);
        while let Some(v) = queue.pop_front() {
            for &(to, cap, _) in &self.graph[v] {
                if cap > 0 && level[to] < 0 {
                    level[to] = level[v] + 1;
                    queue.push_back(to);
                }
            }
        }
        level
    }

    fn dfs_flow(&mut self, v: usize, sink: usize, f: i64, level: &[i64], iter: &mut [usize]) -> i64 {
        if v == sink {
            return f;
        }
        while iter[v] < self.graph[v].len() {
            let (to, cap, rev) = self.graph[v][iter[v]];
            if cap > 0 && level[to] == level[v] + 1 {
                let d = self.dfs_flow(to, sink, f.min(cap), level, iter);
                if d > 0 {
                    self.graph[v][iter[v]].1 -= d;
                    self.graph[to][rev].1 += d;
                    return d;
                }
            }
            iter[v] += 1;
        }
        0
    }

    /// Dinic's algorithm. Returns the max-flow value; residual capacities
    /// are left in `self.graph` for a reachability-based min-cut query.
    fn max_flow(&mut self, source: usize, sink: usize) -> i64 {
        let mut flow = 0;
        loop {
            let level = self.bfs_levels(source);
            if level[sink] < 0 {
                return flow;
            }
            let mut iter = vec![0usize; self.graph.len()];
            loop {
                let f = self.dfs_flow(source, sink, INF, &level, &mut iter);
                if f == 0 {
                    break;
                }
                flow += f;
            }
        }
    }

    fn reachable_from(&self, source: usize) -> Vec<bool> {
        let mut seen = vec![false; self.graph.len()];
        seen[source] = true;
        let mut stack = vec![source];
        while let Some(v) = stack.pop() {
            for &(to, cap, _) in &self.graph[v] {
                if cap > 0 && !seen[to] {
                    seen[to] = true;
                    stack.push(to);
                }
            }
        }
        seen
    }
}

/// A Dinic's-algorithm based implementation of both [`MaxFlowEngine`] and
/// [`MinCutEngine`], built over the vertex-split network so that a vertex
/// min-cut (not merely an edge min-cut) is produced.
#[derive(Debug, Default, Clone, Copy)]
pub struct DinicMaxFlow;

impl MaxFlowEngine for DinicMaxFlow {
    fn min_cut(&self, graph: &dyn GraphView, source: usize, sink: usize) -> (usize, Vec<usize>) {
        let mut net = FlowNet::from_graph_view(graph);
        // flow is bounded by the split edge of the source/sink themselves
        let value = net.max_flow(2 * source + 1, 2 * sink);
        let reachable = net.reachable_from(2 * source + 1);
        let n = graph.num_nodes();
        let source_side = (0..n).filter(|&v| reachable[2 * v] && reachable[2 * v + 1]).collect();
        (value as usize, source_side)
    }
}

impl MinCutEngine for DinicMaxFlow {
    fn global_min_cut(&self, graph: &dyn GraphView) -> (usize, Vec<usize>) {
        let n = graph.num_nodes();
        if n < 2 {
            return (0, (0..n).collect());
        }
        let mut best = (usize::MAX, Vec::new());
        // Standard reduction: fix a source, try every other vertex as sink
        // that is not already adjacent to it (non-adjacent pairs bound the
        // true vertex connectivity; adjacent pairs have no finite vertex cut).
        let source = 0;
        let neighbors: std::collections::HashSet<usize> = graph.neighbors(source).iter().copied().collect();
        for sink in 1..n {
            if neighbors.contains(&sink) {
                continue;
            }
            let (value, side) = MaxFlowEngine::min_cut(self, graph, source, sink);
            if value < best.0 {
                best = (value, side);
            }
        }
        if best.0 == usize::MAX {
            // complete graph: no non-adjacent pair exists, fall back to n-1
            best = (n - 1, (0..n).collect());
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecGraph(Vec<Vec<usize>>);
    impl GraphView for VecGraph {
        fn num_nodes(&self) -> usize {
            self.0.len()
        }
        fn neighbors(&self, v: usize) -> &[usize] {
            &self.0[v]
        }
    }

    #[test]
    fn bridge_vertex_is_articulation_point() {
        // path 0-1-2
        let g = VecGraph(vec![vec![1], vec![0, 2], vec![1]]);
        assert_eq!(articulation_points(&g), vec![1]);
    }

    #[test]
    fn triangle_has_no_articulation_points() {
        let g = VecGraph(vec![vec![1, 2], vec![0, 2], vec![0, 1]]);
        assert!(articulation_points(&g).is_empty());
    }

    #[test]
    fn max_flow_on_path_is_bottleneck() {
        let g = VecGraph(vec![vec![1], vec![0, 2], vec![1]]);
        let (value, _) = DinicMaxFlow.min_cut(&g, 0, 2);
        assert_eq!(value, 1);
    }
}
