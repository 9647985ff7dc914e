//! An exact branch-and-reduce solver for Minimum Vertex Cover / Maximum
//! Independent Set.
//!
//! Build a [`Solver`] over a symmetric, 0-indexed adjacency list and call
//! [`Solver::solve`]:
//!
//! ```
//! use vcsolve::{Config, Solver, SolveOutcome};
//!
//! // a triangle: every cover needs at least two of its three vertices
//! let adj = vec![vec![1, 2], vec![0, 2], vec![0, 1]];
//! let mut solver = Solver::new(adj, Config::default()).unwrap();
//! assert_eq!(solver.solve(None), SolveOutcome::Optimum(2));
//! ```
//!
//! The solver repeatedly applies kernelization rules (`deg1`, `dominate`,
//! `unconfined`, LP/crown, `fold2`, `twin`, `funnel`, `desk`, packing), each
//! of which is reversible, then either finds the induced subgraph has
//! decomposed into independent components or branches on a chosen vertex,
//! recursing on both outcomes and taking the best. See [`Config`] for the
//! knobs that trade search thoroughness for per-node cost.

#![deny(missing_docs)]

mod adapters;
mod bitset;
mod bounds;
mod branch;
mod config;
mod decompose;
mod error;
mod modification;
mod reduce;
mod solver;
mod state;

pub use adapters::{BipartiteMatcher, DinicMaxFlow, GraphView, MaxFlowEngine, MinCutEngine};
pub use config::{BranchingStrategy, Config, LowerBoundLevel, ReductionLevel};
pub use error::Error;
pub use solver::SolveOutcome;
pub use state::Solver;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_adjacency() {
        let adj = vec![vec![5]];
        assert!(matches!(
            Solver::new(adj, Config::default()),
            Err(Error::InvalidAdjacency(5, 1))
        ));
    }

    #[test]
    fn k4_optimal_cover_is_three() {
        let adj = vec![
            vec![1, 2, 3],
            vec![0, 2, 3],
            vec![0, 1, 3],
            vec![0, 1, 2],
        ];
        let mut s = Solver::new(adj, Config::default()).unwrap();
        assert_eq!(s.solve(None), SolveOutcome::Optimum(3));
    }

    #[test]
    fn two_disjoint_triangles_cover_is_four() {
        let adj = vec![
            vec![1, 2],
            vec![0, 2],
            vec![0, 1],
            vec![4, 5],
            vec![3, 5],
            vec![3, 4],
        ];
        let mut s = Solver::new(adj, Config::default()).unwrap();
        assert_eq!(s.solve(None), SolveOutcome::Optimum(4));
    }

    #[test]
    fn petersen_graph_cover_is_six() {
        // outer 5-cycle 0..5, inner pentagram 5..10, spokes i - (i+5)
        let mut adj = vec![Vec::new(); 10];
        let mut edge = |a: usize, b: usize, adj: &mut Vec<Vec<usize>>| {
            adj[a].push(b);
            adj[b].push(a);
        };
        for i in 0..5 {
            edge(i, (i + 1) % 5, &mut adj);
            edge(5 + i, 5 + (i + 2) % 5, &mut adj);
            edge(i, 5 + i, &mut adj);
        }
        let mut s = Solver::new(adj, Config::default()).unwrap();
        assert_eq!(s.solve(None), SolveOutcome::Optimum(6));
    }

    #[test]
    fn triangle_with_pendant_cover_is_two() {
        // triangle 0-1-2 plus pendant 3 hanging off 0
        let adj = vec![vec![1, 2, 3], vec![0, 2], vec![0, 1], vec![0]];
        let mut s = Solver::new(adj, Config::default()).unwrap();
        assert_eq!(s.solve(None), SolveOutcome::Optimum(2));
    }

    #[test]
    fn no_edge_graph_cover_is_zero() {
        let adj: Vec<Vec<usize>> = vec![Vec::new(); 6];
        let mut s = Solver::new(adj, Config::default()).unwrap();
        assert_eq!(s.solve(None), SolveOutcome::Optimum(0));
    }

    #[test]
    fn six_vertex_prism_cover_is_four() {
        // two triangles 0-1-2 and 3-4-5 joined by matching spokes
        let adj = vec![
            vec![1, 2, 3],
            vec![0, 2, 4],
            vec![0, 1, 5],
            vec![4, 5, 0],
            vec![3, 5, 1],
            vec![3, 4, 2],
        ];
        let mut s = Solver::new(adj, Config::default()).unwrap();
        assert_eq!(s.solve(None), SolveOutcome::Optimum(4));
    }

    #[test]
    fn starting_solution_seeds_the_search() {
        let adj = vec![vec![1, 2], vec![0, 2], vec![0, 1]];
        let mut s = Solver::new(adj, Config::default()).unwrap();
        s.add_starting_solution(&[1, 1, 0], 2).unwrap();
        assert_eq!(s.solve(None), SolveOutcome::Optimum(2));
    }
}
