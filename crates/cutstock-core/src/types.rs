use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Advisory priority of a demand entry. Never affects feasibility; used as a
/// tiebreaker in reporting order and candidate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// Solving strategy requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Column generation over a growing pattern pool, rounded to integers.
    #[default]
    ColumnGeneration,
    FirstFitDecreasing,
    BestFitDecreasing,
    /// Runs both greedy heuristics and keeps the better one.
    Hybrid,
}

/// What the selector optimizes for when comparing candidate plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationGoal {
    #[default]
    MinimizeWaste,
    MinimizeRolls,
    MinimizeCost,
    BalanceAll,
}

/// Coarse quality tag attached to every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convergence {
    /// LP relaxation priced out and the rounding gap was at most one roll.
    Optimal,
    NearOptimal,
    Timeout,
    /// Column generation failed and the greedy fallback produced the plan.
    Error,
}

impl std::fmt::Display for Convergence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::NearOptimal => write!(f, "near_optimal"),
            Self::Timeout => write!(f, "timeout"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Status of one entry in the algorithm-step trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

/// One raw demand entry: how many pieces of a given length are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamRequirement {
    pub length: u32,
    pub quantity: u32,
    #[serde(default)]
    pub priority: Priority,
}

/// Input: a single-length solve request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    pub master_roll_length: u32,
    /// Cost of one master roll. Defaults to 1 when not supplied.
    #[serde(default)]
    pub unit_cost: Option<f64>,
    #[serde(default)]
    pub algorithm: Algorithm,
    #[serde(default)]
    pub goal: OptimizationGoal,
    pub demand: Vec<BeamRequirement>,
}

/// Arithmetic progression of master roll lengths for a range sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollLengthRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

/// Input: a range-sweep request. Same as [`SolveRequest`] with the scalar
/// master roll length replaced by a range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeRequest {
    pub master_roll_length: RollLengthRange,
    #[serde(default)]
    pub unit_cost: Option<f64>,
    #[serde(default)]
    pub algorithm: Algorithm,
    #[serde(default)]
    pub goal: OptimizationGoal,
    pub demand: Vec<BeamRequirement>,
}

/// One cut within a pattern: `quantity` pieces of `length`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternCut {
    pub length: u32,
    pub quantity: u32,
}

/// One way of cutting a master roll, with how many rolls use it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutPattern {
    /// Content-addressed id, stable across runs for the same cuts.
    pub id: String,
    pub cuts: Vec<PatternCut>,
    pub total_length: u32,
    pub waste: u32,
    pub rolls_used: u32,
}

/// Human-readable cutting instruction, 1-indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuttingInstruction {
    pub step: u32,
    pub description: String,
    pub pattern: String,
    pub rolls_count: u32,
}

/// One entry in the append-only algorithm trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmStep {
    pub step: u32,
    pub name: String,
    pub description: String,
    pub status: StepStatus,
    /// Measured wall time of the step in seconds.
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Performance counters attached to every report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    /// Total wall time of the solve in seconds.
    pub execution_time: f64,
    /// Best-effort peak footprint estimate in bytes; 0 when unavailable.
    pub memory_usage: u64,
    pub patterns_evaluated: u32,
    pub iterations: u32,
    pub convergence: Convergence,
}

/// Output: the full optimization report for one master roll length.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub total_rolls: u32,
    /// Percentage of bought stock length consumed by demanded pieces.
    pub efficiency: f64,
    pub waste_percentage: f64,
    pub total_waste: u64,
    /// Rolls saved versus the first-fit-decreasing baseline, in cost units.
    /// Negative when the chosen plan uses more rolls than the baseline.
    pub cost_savings: f64,
    pub patterns: Vec<CutPattern>,
    pub cutting_instructions: Vec<CuttingInstruction>,
    pub algorithm_steps: Vec<AlgorithmStep>,
    pub performance: Performance,
}

/// One entry of a range sweep: the result for a single master roll length.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeResultEntry {
    pub master_roll_length: u32,
    pub optimization: OptimizationResult,
}

/// A master roll length the sweep could not solve, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeFailure {
    pub master_roll_length: u32,
    pub error: String,
}

/// Aggregate statistics over the feasible runs of a sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSummary {
    /// Number of feasible configurations actually solved.
    pub total_configurations: u32,
    pub best_efficiency: f64,
    pub worst_efficiency: f64,
    pub average_efficiency: f64,
    /// Total wall time of the sweep in seconds.
    pub total_execution_time: f64,
}

/// Output: the full range sweep report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeResult {
    pub results: Vec<RangeResultEntry>,
    /// Master roll length of the feasible run with the lowest goal score.
    pub best_configuration: u32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<RangeFailure>,
    pub summary: RangeSummary,
}

/// Progress event emitted at the start of each range-sweep iteration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeProgress {
    pub completed: u32,
    pub total: u32,
    pub current_configuration: u32,
}

/// Callback invoked synchronously between range-sweep iterations.
/// Best-effort: the core never depends on what the sink does.
pub type ProgressCallback = Box<dyn Fn(RangeProgress) + Send + Sync>;

/// Cloneable cancellation handle. The solver checks it at iteration and
/// DP-row boundaries; a fired token fails the call with
/// [`SolverError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Tunable limits and constants of the solver.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Cap on the total demanded piece count, guaranteeing termination.
    pub max_total_pieces: u64,
    /// Cap on column-generation iterations.
    pub max_iterations: u32,
    /// Wall-time budget for column generation, inherited by the pricer.
    pub time_budget: Duration,
    /// Reduced-cost tolerance: a column is attractive iff Z* > 1 + epsilon.
    pub epsilon: f64,
    /// Refuse to allocate a knapsack DP table larger than this many cells.
    pub max_dp_cells: usize,
    /// Node budget for the branch-and-bound pricing fallback.
    pub max_bb_nodes: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_total_pieces: 10_000,
            max_iterations: 200,
            time_budget: Duration::from_secs(10),
            epsilon: 1e-6,
            max_dp_cells: 10_000_000,
            max_bb_nodes: 200_000,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_total_pieces(mut self, cap: u64) -> Self {
        self.max_total_pieces = cap;
        self
    }

    pub fn with_max_iterations(mut self, cap: u32) -> Self {
        self.max_iterations = cap;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_max_dp_cells(mut self, cells: usize) -> Self {
        self.max_dp_cells = cells;
        self
    }

    pub fn with_max_bb_nodes(mut self, nodes: usize) -> Self {
        self.max_bb_nodes = nodes;
        self
    }
}

/// Error type for solve and range operations.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Resource limit exceeded: {0}")]
    ResourceExceeded(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("LP backend failure: {0}")]
    BackendFailure(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;
