use highs::{HighsModelStatus, RowProblem, Sense};

use super::demand::NormalizedDemand;
use super::pattern::Pattern;
use crate::types::{Result, SolverError};

/// Primal/dual solution of the master LP relaxation.
#[derive(Debug, Clone)]
pub(super) struct LpSolution {
    /// Fractional usage per pooled pattern, aligned with the pool order.
    pub usages: Vec<f64>,
    /// Dual price per demand constraint, aligned with the normalized order.
    pub duals: Vec<f64>,
    /// Minimized total roll count.
    pub objective: f64,
}

/// Solves the continuous set-cover relaxation over the current pattern pool:
/// minimize Σ yₚ subject to Σₚ aₚᵢ·yₚ ≥ qᵢ, yₚ ≥ 0.
///
/// The pool always contains the singleton patterns, so the LP is feasible by
/// construction; any other backend status is a failure. Solver options pin
/// the run to a single thread and a fixed seed so identical inputs give
/// identical primals and duals.
pub(super) fn solve_master(pool: &[Pattern], demand: &NormalizedDemand) -> Result<LpSolution> {
    let mut problem = RowProblem::default();

    let columns: Vec<highs::Col> = pool
        .iter()
        .map(|_| problem.add_column(1.0, 0.0..))
        .collect();

    for entry in demand.entries() {
        let factors: Vec<(highs::Col, f64)> = pool
            .iter()
            .zip(&columns)
            .filter_map(|(pattern, &col)| {
                let count = pattern.count_of(entry.length);
                (count > 0).then(|| (col, count as f64))
            })
            .collect();
        problem.add_row((entry.quantity as f64).., factors);
    }

    let mut model = problem.optimise(Sense::Minimise);
    model.set_option("output_flag", false);
    model.set_option("threads", 1);
    model.set_option("random_seed", 0);

    let solved = model.solve();
    match solved.status() {
        HighsModelStatus::Optimal => {}
        status => {
            return Err(SolverError::BackendFailure(format!(
                "Master LP returned status {:?}",
                status
            )));
        }
    }

    let solution = solved.get_solution();
    let usages: Vec<f64> = solution.columns().to_vec();
    let duals: Vec<f64> = solution.dual_rows().to_vec();

    if duals.iter().any(|d| !d.is_finite()) {
        return Err(SolverError::BackendFailure(
            "Master LP produced non-finite dual values".to_string(),
        ));
    }

    let objective = usages.iter().sum();
    Ok(LpSolution {
        usages,
        duals,
        objective,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BeamRequirement, Priority, SolverConfig};

    fn demand_of(entries: &[(u32, u32)], master: u32) -> NormalizedDemand {
        let reqs: Vec<BeamRequirement> = entries
            .iter()
            .map(|&(length, quantity)| BeamRequirement {
                length,
                quantity,
                priority: Priority::Normal,
            })
            .collect();
        NormalizedDemand::new(&reqs, master, &SolverConfig::default()).unwrap()
    }

    #[test]
    fn singleton_pool_covers_demand() {
        let demand = demand_of(&[(60, 2), (40, 3)], 100);
        let pool = vec![
            Pattern::new(vec![(60, 1)], 100).unwrap(),
            Pattern::new(vec![(40, 1)], 100).unwrap(),
        ];

        let lp = solve_master(&pool, &demand).unwrap();
        assert!((lp.usages[0] - 2.0).abs() < 1e-6);
        assert!((lp.usages[1] - 3.0).abs() < 1e-6);
        assert!((lp.objective - 5.0).abs() < 1e-6);
        // Each singleton column prices its own constraint at exactly 1.
        assert!(lp.duals.iter().all(|&d| (d - 1.0).abs() < 1e-6));
    }

    #[test]
    fn richer_pool_lowers_the_objective() {
        let demand = demand_of(&[(60, 1), (40, 1)], 100);
        let pool = vec![
            Pattern::new(vec![(60, 1)], 100).unwrap(),
            Pattern::new(vec![(40, 1)], 100).unwrap(),
            Pattern::new(vec![(60, 1), (40, 1)], 100).unwrap(),
        ];

        let lp = solve_master(&pool, &demand).unwrap();
        assert!((lp.objective - 1.0).abs() < 1e-6);
        assert!((lp.usages[2] - 1.0).abs() < 1e-6);
    }
}


