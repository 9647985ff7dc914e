//! The top-level search driver: `solve`/`rec`, starting-solution seeding,
//! and the handful of read-only observers exposed on top of raw state.

use crate::error::Error;
use crate::state::{Solver, IN_COVER, OUT_OF_COVER};
use std::time::Instant;

/// Outcome of a [`Solver::solve`] call. Replaces the reference
/// implementation's `-1` timeout sentinel with a variant that can't be
/// mistaken for a real cover size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    /// The minimum vertex cover size, proven optimal.
    Optimum(usize),
    /// The time budget passed to `solve` elapsed before a proof completed.
    TimedOut,
}

impl Solver {
    /// Seeds the search with a known cover, used as an initial upper bound
    /// to prune against. `solution[i]` must be `0` (independent set) or `1`
    /// (cover) for every vertex.
    pub fn add_starting_solution(&mut self, solution: &[i8], solution_size: usize) -> Result<(), Error> {
        if solution.len() != self.n {
            return Err(Error::StartingSolutionLength {
                actual: solution.len(),
                expected: self.n,
            });
        }
        for v in 0..self.n {
            for &u in &self.adj[v] {
                if solution[v] != IN_COVER && solution[u] != IN_COVER {
                    return Err(Error::StartingSolutionNotACover(v.min(u), v.max(u)));
                }
            }
        }
        self.y[..self.n].copy_from_slice(solution);
        self.opt = solution_size;
        self.starting_solution_is_best = true;
        Ok(())
    }

    /// Runs the branch-and-reduce search. `deadline`, if set, bounds wall
    /// time; the search returns [`SolveOutcome::TimedOut`] (rather than a
    /// possibly-suboptimal size) once it elapses.
    pub fn solve(&mut self, deadline: Option<Instant>) -> SolveOutcome {
        if let Some(d) = deadline {
            if Instant::now() >= d {
                return SolveOutcome::TimedOut;
            }
        }
        if self.config.output_lp {
            if self.config.reduction_level() == 0 {
                self.lp_reduction();
            } else {
                self.reduce();
            }
            log::debug!("lp value: {}", self.crt as f64 + self.rn as f64 / 2.0);
            return SolveOutcome::Optimum(self.opt);
        }
        self.root_depth = self.depth as i64;
        self.rec(deadline);
        if let Some(d) = deadline {
            if Instant::now() >= d {
                return SolveOutcome::TimedOut;
            }
        }
        SolveOutcome::Optimum(self.opt)
    }

    /// One recursive search step: reduce, prune by lower bound, record an
    /// optimum on an empty graph, try decomposition, else branch.
    pub(crate) fn rec(&mut self, deadline: Option<Instant>) {
        if let Some(d) = deadline {
            if Instant::now() >= d {
                return;
            }
        }
        debug_assert!(self.config.reduction_level() >= 3 || self.packing.is_empty());

        if self.config.extra_decomp && self.decompose(deadline) {
            return;
        }
        if self.reduce() {
            return;
        }
        if self.lower_bound() as i64 >= self.opt as i64 {
            return;
        }
        if self.rn == 0 {
            if self.depth <= self.config.log_depth_limit {
                log::debug!("depth={} opt: {} -> {}", self.depth, self.opt, self.crt);
            }
            self.opt = self.crt;
            self.y = self.x.clone();
            self.starting_solution_is_best = false;
            self.reverse();
            return;
        }
        if self.decompose(deadline) {
            return;
        }
        self.branching(deadline);
    }

    /// Runs `reduce()` to a fixed point ignoring its infeasibility signal;
    /// used as a cheap preprocessing pass before search, mirroring the
    /// reference implementation's `reduce_graph`.
    pub fn reduce_graph(&mut self) {
        self.reduce();
    }

    /// Snapshots the post-reduction state so a later caller can cheaply
    /// undo everything done since via [`Solver::restore_to_snapshot`].
    pub fn initial_reduce_graph(&mut self) {
        self.reduce_graph();
        self.snapshot_x = Some(self.x.clone());
        self.snapshot_modifications_len = self.modifications.len();
    }

    /// Undoes every `set`/modification performed since the last
    /// [`Solver::initial_reduce_graph`] call.
    pub fn restore_to_snapshot(&mut self) {
        let snapshot = self
            .snapshot_x
            .clone()
            .expect("restore_to_snapshot called without a prior initial_reduce_graph");
        let target_rn = snapshot.iter().filter(|&&a| a < 0).count();
        self.restore(target_rn);
        self.x = snapshot;
    }

    /// Extends the current reduction to a maximal independent set by
    /// greedily placing any still-undecided vertex into the independent
    /// set and re-reducing, until none remain; returns the projected
    /// assignment.
    pub fn compute_maximal_is(&mut self) -> Vec<i8> {
        loop {
            self.reduce_graph();
            let next = (0..self.n).find(|&i| self.x[i] < 0);
            match next {
                Some(i) => self.set(i, OUT_OF_COVER),
                None => break,
            }
        }
        let mut buf = self.x.clone();
        self.reverse_into(&mut buf);
        buf
    }

    /// Size of the maximal independent set [`Solver::compute_maximal_is`]
    /// would report, without materializing the full assignment.
    pub fn compute_alternative_maximal_is_size(&mut self) -> usize {
        loop {
            self.reduce_graph();
            let next = (0..self.n).find(|&i| self.x[i] < 0);
            match next {
                Some(i) => self.set(i, OUT_OF_COVER),
                None => break,
            }
        }
        self.get_current_is_size_with_folds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn triangle_optimal_cover_is_two() {
        let adj = vec![vec![1, 2], vec![0, 2], vec![0, 1]];
        let mut s = Solver::new(adj, Config::default()).unwrap();
        assert_eq!(s.solve(None), SolveOutcome::Optimum(2));
    }

    #[test]
    fn path_of_four_optimal_cover_is_two() {
        let adj = vec![vec![1], vec![0, 2], vec![1, 3], vec![2]];
        let mut s = Solver::new(adj, Config::default()).unwrap();
        assert_eq!(s.solve(None), SolveOutcome::Optimum(2));
    }

    #[test]
    fn empty_graph_optimal_cover_is_zero() {
        let adj: Vec<Vec<usize>> = vec![Vec::new(); 5];
        let mut s = Solver::new(adj, Config::default()).unwrap();
        assert_eq!(s.solve(None), SolveOutcome::Optimum(0));
    }

    #[test]
    fn odd_cycle_five_optimal_cover_is_three() {
        let adj = vec![vec![1, 4], vec![0, 2], vec![1, 3], vec![2, 4], vec![3, 0]];
        let mut s = Solver::new(adj, Config::default()).unwrap();
        assert_eq!(s.solve(None), SolveOutcome::Optimum(3));
    }

    #[test]
    fn starting_solution_must_be_a_valid_cover() {
        let adj = vec![vec![1], vec![0]];
        let mut s = Solver::new(adj, Config::default()).unwrap();
        let bad = vec![OUT_OF_COVER, OUT_OF_COVER];
        assert!(s.add_starting_solution(&bad, 0).is_err());
    }
}
