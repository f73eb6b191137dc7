use std::collections::HashSet;
use std::time::Instant;

use super::demand::NormalizedDemand;
use super::greedy;
use super::knapsack;
use super::lp;
use super::pattern::Pattern;
use super::PatternUsage;
use crate::types::*;

/// What the column-generation phase produced, before report assembly.
#[derive(Debug, Clone)]
pub(super) struct ColGenOutcome {
    pub plan: Vec<PatternUsage>,
    pub convergence: Convergence,
    pub iterations: u32,
    /// Size of the final pattern pool, counted as evaluated patterns.
    pub pool_size: u32,
    pub lp_objective: f64,
    /// Dual values of the first LP solve, surfaced in the trace.
    pub first_duals: Option<Vec<f64>>,
    /// Peak knapsack table footprint, for the report's memory estimate.
    pub peak_table_bytes: u64,
    pub timings: ColGenTimings,
}

/// Wall time spent in each phase, in seconds, for the trace.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct ColGenTimings {
    pub initialize: f64,
    pub pricing: f64,
    pub rounding: f64,
}

/// How the pricing loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    PricedOut,
    RepeatedColumn,
    IterationCap,
    TimeBudget,
}

/// Runs column generation: iterate the master LP against the knapsack pricer
/// until no column with negative reduced cost exists, then round the
/// fractional usages to an integer plan.
pub(super) fn run(
    demand: &NormalizedDemand,
    goal: OptimizationGoal,
    unit_cost: f64,
    config: &SolverConfig,
    cancel: &CancelToken,
    started: Instant,
) -> Result<ColGenOutcome> {
    let master = demand.master_roll_length();
    let deadline = started + config.time_budget;
    let mut timings = ColGenTimings::default();

    // Initial pool: one singleton pattern per piece length. Trivially
    // feasible: the singleton usage equals the demanded quantity.
    let phase = Instant::now();
    let mut pool: Vec<Pattern> = demand
        .entries()
        .iter()
        .map(|e| Pattern::new(vec![(e.length, 1)], master))
        .collect::<Result<_>>()?;
    let mut seen: HashSet<Pattern> = pool.iter().cloned().collect();
    timings.initialize = phase.elapsed().as_secs_f64();

    let phase = Instant::now();
    let mut iterations = 0u32;
    let mut first_duals: Option<Vec<f64>> = None;
    let mut peak_table_bytes = 0u64;
    let mut lp_solution = lp::solve_master(&pool, demand)?;

    let exit = loop {
        if cancel.is_cancelled() {
            return Err(SolverError::Cancelled);
        }
        if Instant::now() >= deadline {
            break LoopExit::TimeBudget;
        }

        if first_duals.is_none() {
            first_duals = Some(lp_solution.duals.clone());
        }

        let pricing =
            knapsack::solve_pricing(&lp_solution.duals, demand, config, deadline, cancel)?;
        peak_table_bytes = peak_table_bytes.max(pricing.table_bytes);
        if pricing.timed_out {
            break LoopExit::TimeBudget;
        }

        // A new column is attractive iff Z* > 1 + epsilon.
        if pricing.objective <= 1.0 + config.epsilon {
            break LoopExit::PricedOut;
        }

        let lengths: Vec<u32> = demand.entries().iter().map(|e| e.length).collect();
        let column = Pattern::from_counts(&lengths, &pricing.counts, master)?;
        if !seen.insert(column.clone()) {
            // Degenerate master: the pricer reproduced a pooled column.
            break LoopExit::RepeatedColumn;
        }

        iterations += 1;
        if iterations >= config.max_iterations {
            // The fresh column is dropped so the pool stays aligned with
            // the last solved master.
            break LoopExit::IterationCap;
        }
        pool.push(column);

        lp_solution = lp::solve_master(&pool, demand)?;
    };
    timings.pricing = phase.elapsed().as_secs_f64();

    let phase = Instant::now();
    let plan =
        round_to_integer_plan(&pool, &lp_solution.usages, demand, goal, unit_cost, config)?;
    timings.rounding = phase.elapsed().as_secs_f64();

    let total_rolls: u32 = plan.iter().map(|u| u.rolls_used).sum();
    let lp_lower_bound = (lp_solution.objective - config.epsilon).ceil() as u32;
    let rounding_gap = total_rolls.saturating_sub(lp_lower_bound);

    let convergence = match exit {
        LoopExit::PricedOut if rounding_gap <= 1 => Convergence::Optimal,
        LoopExit::PricedOut | LoopExit::RepeatedColumn => Convergence::NearOptimal,
        LoopExit::IterationCap | LoopExit::TimeBudget => Convergence::Timeout,
    };

    Ok(ColGenOutcome {
        plan,
        convergence,
        iterations,
        pool_size: pool.len() as u32,
        lp_objective: lp_solution.objective,
        first_duals,
        peak_table_bytes,
        timings,
    })
}

/// Two-phase rounding: floor the fractional usages in decreasing-usage
/// order, then cover the remaining demand with the hybrid greedy heuristic.
/// Guarantees full coverage; identical patterns from both phases merge.
fn round_to_integer_plan(
    pool: &[Pattern],
    usages: &[f64],
    demand: &NormalizedDemand,
    goal: OptimizationGoal,
    unit_cost: f64,
    config: &SolverConfig,
) -> Result<Vec<PatternUsage>> {
    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.sort_by(|&a, &b| {
        usages[b]
            .total_cmp(&usages[a])
            .then_with(|| pool[a].id().cmp(&pool[b].id()))
    });

    let mut residual: Vec<u32> = demand.entries().iter().map(|e| e.quantity).collect();
    let mut plan: Vec<PatternUsage> = Vec::new();

    for idx in order {
        let rolls = usages[idx].floor() as u32;
        if rolls == 0 {
            continue;
        }
        // Floored rolls beyond the residual demand would be pure
        // overproduction; cap them at what is still needed.
        let needed = demand
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, e)| pool[idx].count_of(e.length) > 0)
            .map(|(i, e)| {
                let per_roll = pool[idx].count_of(e.length);
                residual[i].div_ceil(per_roll)
            })
            .max()
            .unwrap_or(0);
        let rolls = rolls.min(needed);
        if rolls == 0 {
            continue;
        }

        for (i, entry) in demand.entries().iter().enumerate() {
            let covered = pool[idx].count_of(entry.length) * rolls;
            residual[i] = residual[i].saturating_sub(covered);
        }
        plan.push(PatternUsage {
            pattern: pool[idx].clone(),
            rolls_used: rolls,
        });
    }

    if residual.iter().any(|&q| q > 0) {
        let leftover: Vec<BeamRequirement> = demand
            .entries()
            .iter()
            .zip(&residual)
            .filter(|(_, &q)| q > 0)
            .map(|(entry, &q)| BeamRequirement {
                length: entry.length,
                quantity: q,
                priority: entry.priority,
            })
            .collect();
        let residual_demand =
            NormalizedDemand::new(&leftover, demand.master_roll_length(), config)?;
        let completion = greedy::hybrid(&residual_demand, goal, unit_cost)?;
        for usage in completion {
            merge_usage(&mut plan, usage);
        }
    }

    Ok(plan)
}

fn merge_usage(plan: &mut Vec<PatternUsage>, usage: PatternUsage) {
    match plan.iter_mut().find(|u| u.pattern == usage.pattern) {
        Some(existing) => existing.rolls_used += usage.rolls_used,
        None => plan.push(usage),
    }
}


