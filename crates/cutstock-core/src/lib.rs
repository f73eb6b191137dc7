//! # cutstock-core
//!
//! One-dimensional cutting stock optimization engine. Given a master roll
//! length and a list of (length, quantity, priority) demands, computes an
//! assignment of pieces to a minimum-cost set of rolls.
//!
//! Two entry points:
//!
//! - [`Solver`] - one synchronous solve for a single master roll length.
//! - [`RangeSolver`] - the same solve swept across an arithmetic
//!   progression of lengths, with optional progress reporting.
//!
//! The engine combines column generation (an LP master over a growing
//! pattern pool priced by a bounded knapsack) with first-fit and best-fit
//! decreasing heuristics, and selects the winning plan under the requested
//! optimization goal. Results are deterministic: identical requests produce
//! identical plans, pattern ids and orderings.
//!
//! ```no_run
//! use cutstock_core::{Solver, SolveRequest, Algorithm, OptimizationGoal};
//! use cutstock_core::BeamRequirement;
//!
//! let request = SolveRequest {
//!     master_roll_length: 100,
//!     unit_cost: None,
//!     algorithm: Algorithm::ColumnGeneration,
//!     goal: OptimizationGoal::MinimizeWaste,
//!     demand: vec![BeamRequirement {
//!         length: 50,
//!         quantity: 2,
//!         priority: Default::default(),
//!     }],
//! };
//! let result = Solver::new(request)?.solve()?;
//! assert_eq!(result.total_rolls, 1);
//! # Ok::<(), cutstock_core::SolverError>(())
//! ```

pub mod range;
pub mod solver;
pub mod types;

pub use range::RangeSolver;
pub use solver::Solver;
pub use types::{
    Algorithm, AlgorithmStep, BeamRequirement, CancelToken, Convergence, CutPattern,
    CuttingInstruction, OptimizationGoal, OptimizationResult, PatternCut, Performance, Priority,
    ProgressCallback, RangeFailure, RangeProgress, RangeRequest, RangeResult, RangeResultEntry,
    RangeSummary, Result, RollLengthRange, SolveRequest, SolverConfig, SolverError, StepStatus,
};
