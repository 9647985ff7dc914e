//! Recoverable, caller-facing error conditions.
//!
//! These are the handful of input problems a caller can plausibly hit when
//! building a [`crate::Solver`] from untrusted data (e.g. a parsed DIMACS
//! file). Everything else the original treats as a programmer-precondition
//! violation (`assert`) stays a `debug_assert!`/panic here too.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An adjacency list entry names a vertex id at or beyond the vertex
    /// count.
    #[error("adjacency references vertex {0}, but capacity is only {1}")]
    InvalidAdjacency(usize, usize),
    /// [`crate::Solver::add_starting_solution`] was given a slice whose
    /// length doesn't match the vertex count.
    #[error("starting solution has length {actual}, expected {expected}")]
    StartingSolutionLength {
        /// Length of the slice that was passed in.
        actual: usize,
        /// Vertex count the solver expected.
        expected: usize,
    },
    /// The starting solution leaves some edge with neither endpoint in the
    /// cover.
    #[error("starting solution is not a valid vertex cover (edge ({0}, {1}) uncovered)")]
    StartingSolutionNotACover(usize, usize),
}
