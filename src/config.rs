//! Solver configuration.
//!
//! Replaces the original's process-wide `static` knobs (`REDUCTION`,
//! `LOWER_BOUND`, `BRANCHING`, `outputLP`, `EXTRA_DECOMP`) with a plain,
//! `Copy` value passed in at construction time.

/// How aggressively the reduction engine runs before every branch.
///
/// Each level is a strict superset of the previous one's rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReductionLevel {
    /// `deg1` and `dominate` only.
    Deg1Dominate,
    /// Adds the LP (crown) reduction and `fold2`.
    LpFold2,
    /// Adds `unconfined`, `twin`, `funnel` and `desk`.
    #[default]
    Full,
    /// Adds the packing reduction.
    WithPacking,
}

/// Which lower-bound estimator(s) `Solver::lower_bound` combines with the
/// trivial `crt` bound. Unlike [`ReductionLevel`], these are not cumulative:
/// each variant other than `All` picks exactly one estimator, matching the
/// reference implementation's single-valued `LOWER_BOUND` knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LowerBoundLevel {
    /// Only the trivial `crt` bound.
    CrtOnly,
    /// The clique-cover bound.
    Clique,
    /// The LP bound (requires `ReductionLevel::LpFold2` or higher).
    Lp,
    /// The cycle bound.
    Cycle,
    /// Clique, LP and cycle bounds combined.
    #[default]
    All,
}

/// Which vertex the branching step selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchingStrategy {
    /// Uniformly random undecided vertex.
    Random,
    /// Vertex with minimum undecided degree.
    MinDegree,
    /// Vertex with maximum undecided degree, breaking ties by minimum edge
    /// count among its undecided neighbours. Matches the original's default.
    MaxDegreeMinEdges,
    /// An articulation point of the undecided subgraph, if one exists.
    ArticulationPoint,
    /// The vertex identified by a global minimum-cut computation.
    GlobalMincut,
    /// A vertex drawn from a source/sink cut, refined across successive
    /// branches.
    StCut,
}

impl Default for BranchingStrategy {
    fn default() -> Self {
        BranchingStrategy::MaxDegreeMinEdges
    }
}

/// Tunable knobs for [`crate::Solver`].
///
/// `Config` is `Copy`: it is read from, never mutated behind the solver's
/// back, matching the "configuration value, not a global" re-architecture
/// decision.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Which kernelization rules run before every branch.
    pub reduction: ReductionLevel,
    /// Which lower-bound estimators are combined at every node.
    pub lower_bound: LowerBoundLevel,
    /// Which vertex the branching step picks.
    pub branching: BranchingStrategy,
    /// If set, `solve` prints the LP value to the log and returns without
    /// search (mirrors the original's `outputLP`).
    pub output_lp: bool,
    /// Attempt component decomposition on every recursion node, not only
    /// after a failed branch.
    pub extra_decomp: bool,
    /// Threshold below which a single surviving component is considered
    /// "not significantly smaller" than its parent and decomposition is
    /// skipped (the original's hardcoded `SHRINK = 0.5`).
    pub shrink_factor: f64,
    /// Recursion depth below which progress messages are emitted (the
    /// original's `maxDepth`); deeper frames stay silent even at trace level.
    pub log_depth_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reduction: ReductionLevel::default(),
            lower_bound: LowerBoundLevel::default(),
            branching: BranchingStrategy::default(),
            output_lp: false,
            extra_decomp: false,
            shrink_factor: 0.5,
            log_depth_limit: 10,
        }
    }
}

impl Config {
    /// Numeric reduction level, matching the reference implementation's
    /// `REDUCTION` knob (0 = `Deg1Dominate` .. 3 = `WithPacking`).
    pub fn reduction_level(&self) -> u8 {
        match self.reduction {
            ReductionLevel::Deg1Dominate => 0,
            ReductionLevel::LpFold2 => 1,
            ReductionLevel::Full => 2,
            ReductionLevel::WithPacking => 3,
        }
    }
}
