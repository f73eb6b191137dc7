use std::time::Instant;

use crate::solver::Solver;
use crate::types::*;

/// Runs the solver across an arithmetic progression of master roll lengths
/// and picks the configuration with the lowest goal score.
pub struct RangeSolver {
    request: RangeRequest,
    config: SolverConfig,
    cancel: CancelToken,
}

impl RangeSolver {
    /// Validates the range and builds a new driver instance.
    pub fn new(request: RangeRequest) -> Result<Self> {
        Self::with_config(request, SolverConfig::default())
    }

    /// Like [`RangeSolver::new`] with explicit limits.
    pub fn with_config(request: RangeRequest, config: SolverConfig) -> Result<Self> {
        let range = &request.master_roll_length;
        if range.min == 0 {
            return Err(SolverError::InvalidInput(
                "Master roll length range must start above zero".to_string(),
            ));
        }
        if range.min > range.max {
            return Err(SolverError::InvalidInput(format!(
                "Range minimum {} exceeds maximum {}",
                range.min, range.max
            )));
        }
        if range.step == 0 {
            return Err(SolverError::InvalidInput(
                "Range step must be positive".to_string(),
            ));
        }
        if request.demand.is_empty() {
            return Err(SolverError::InvalidInput(
                "At least one demand entry must be provided".to_string(),
            ));
        }

        Ok(Self {
            request,
            config,
            cancel: CancelToken::new(),
        })
    }

    /// Attaches a cancellation token checked before every configuration.
    pub fn with_cancellation(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Runs the full sweep without progress reporting.
    pub fn solve(&self) -> Result<RangeResult> {
        self.run(None)
    }

    /// Runs the full sweep, emitting one progress event at the start of
    /// each configuration. Events are best-effort; the result does not
    /// depend on the sink.
    pub fn solve_with_progress(&self, callback: ProgressCallback) -> Result<RangeResult> {
        self.run(Some(&callback))
    }

    fn run(&self, progress: Option<&ProgressCallback>) -> Result<RangeResult> {
        let started = Instant::now();
        let range = &self.request.master_roll_length;

        let lengths: Vec<u32> = (range.min..=range.max)
            .step_by(range.step as usize)
            .collect();
        let total = lengths.len() as u32;
        let longest_piece = self
            .request
            .demand
            .iter()
            .map(|r| r.length)
            .max()
            .unwrap_or(0);

        let mut results: Vec<RangeResultEntry> = Vec::new();
        let mut failures: Vec<RangeFailure> = Vec::new();
        let mut best: Option<(u32, f64)> = None;

        for (index, &length) in lengths.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(SolverError::Cancelled);
            }
            if let Some(sink) = progress {
                sink(RangeProgress {
                    completed: index as u32,
                    total,
                    current_configuration: length,
                });
            }

            // A roll shorter than the longest piece cannot hold every
            // demanded length; skipped, not an error.
            if longest_piece > length {
                continue;
            }

            let solver = Solver::with_config(
                SolveRequest {
                    master_roll_length: length,
                    unit_cost: self.request.unit_cost,
                    algorithm: self.request.algorithm,
                    goal: self.request.goal,
                    demand: self.request.demand.clone(),
                },
                self.config.clone(),
            )?
            .with_cancellation(self.cancel.clone());

            match solver.solve_scored() {
                Ok((optimization, score)) => {
                    let improved = match best {
                        Some((_, best_score)) => score < best_score,
                        None => true,
                    };
                    if improved {
                        best = Some((length, score));
                    }
                    results.push(RangeResultEntry {
                        master_roll_length: length,
                        optimization,
                    });
                }
                Err(SolverError::Cancelled) => return Err(SolverError::Cancelled),
                Err(error) => failures.push(RangeFailure {
                    master_roll_length: length,
                    error: error.to_string(),
                }),
            }
        }

        let best_configuration = match best {
            Some((length, _)) => length,
            None => {
                return Err(SolverError::InvalidInput(
                    "No feasible master roll length in the range".to_string(),
                ));
            }
        };

        let efficiencies: Vec<f64> = results
            .iter()
            .map(|entry| entry.optimization.efficiency)
            .collect();
        let best_efficiency = efficiencies.iter().cloned().fold(f64::MIN, f64::max);
        let worst_efficiency = efficiencies.iter().cloned().fold(f64::MAX, f64::min);
        let average_efficiency =
            efficiencies.iter().sum::<f64>() / efficiencies.len() as f64;

        Ok(RangeResult {
            best_configuration,
            summary: RangeSummary {
                total_configurations: results.len() as u32,
                best_efficiency,
                worst_efficiency,
                average_efficiency,
                total_execution_time: started.elapsed().as_secs_f64(),
            },
            results,
            failures,
        })
    }
}
