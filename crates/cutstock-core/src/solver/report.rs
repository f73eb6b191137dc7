use std::time::Instant;

use super::score::PlanStats;
use super::{PatternUsage, Solver};
use crate::types::*;

impl Solver {
    /// Canonical reporting order: descending rolls used, then descending
    /// used length, then ascending pattern id.
    pub(super) fn order_usages(&self, plan: &[PatternUsage]) -> Vec<PatternUsage> {
        let mut ordered = plan.to_vec();
        ordered.sort_by(|a, b| {
            b.rolls_used
                .cmp(&a.rolls_used)
                .then_with(|| b.pattern.total_length().cmp(&a.pattern.total_length()))
                .then_with(|| a.pattern.id().cmp(&b.pattern.id()))
        });
        ordered
    }

    /// Assembles the final result record from the chosen plan: totals,
    /// per-pattern usage, ordered cutting instructions, the algorithm trace
    /// and the performance counters.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn build_report(
        &self,
        ordered: &[PatternUsage],
        mut steps: Vec<AlgorithmStep>,
        convergence: Convergence,
        iterations: u32,
        patterns_evaluated: u32,
        memory_usage: u64,
        baseline: &PlanStats,
        started: Instant,
    ) -> OptimizationResult {
        let finalize_started = Instant::now();
        let master = self.demand.master_roll_length();

        let total_rolls: u32 = ordered.iter().map(|u| u.rolls_used).sum();
        let total_waste: u64 = ordered
            .iter()
            .map(|u| u.pattern.waste() as u64 * u.rolls_used as u64)
            .sum();

        let demanded_length = self.demand.total_length();
        let available_length = total_rolls as u64 * master as u64;
        let efficiency = if available_length > 0 {
            100.0 * demanded_length as f64 / available_length as f64
        } else {
            0.0
        };
        let waste_percentage = 100.0 - efficiency;
        let cost_savings =
            (baseline.rolls as f64 - total_rolls as f64) * self.unit_cost;

        let patterns: Vec<CutPattern> = ordered
            .iter()
            .map(|usage| CutPattern {
                id: usage.pattern.id(),
                cuts: usage
                    .pattern
                    .cuts()
                    .iter()
                    .map(|&(length, quantity)| PatternCut { length, quantity })
                    .collect(),
                total_length: usage.pattern.total_length(),
                waste: usage.pattern.waste(),
                rolls_used: usage.rolls_used,
            })
            .collect();

        let mut cutting_instructions: Vec<CuttingInstruction> = ordered
            .iter()
            .enumerate()
            .map(|(i, usage)| CuttingInstruction {
                step: i as u32 + 1,
                description: format!(
                    "Take {} master roll{} of length {}",
                    usage.rolls_used,
                    if usage.rolls_used == 1 { "" } else { "s" },
                    master
                ),
                pattern: usage.pattern.describe(),
                rolls_count: usage.rolls_used,
            })
            .collect();

        // Closing inventory check restating the demanded pieces.
        let inventory = self
            .demand
            .entries()
            .iter()
            .map(|e| format!("{} pieces of {}", e.quantity, e.length))
            .collect::<Vec<_>>()
            .join(", ");
        cutting_instructions.push(CuttingInstruction {
            step: cutting_instructions.len() as u32 + 1,
            description: "Final inventory check".to_string(),
            pattern: format!("{} - all requirements met", inventory),
            rolls_count: 0,
        });

        steps.push(AlgorithmStep {
            step: steps.len() as u32 + 1,
            name: "Finalize Report".to_string(),
            description: format!(
                "Assembled {} pattern{} into {} cutting instruction{}",
                patterns.len(),
                if patterns.len() == 1 { "" } else { "s" },
                cutting_instructions.len(),
                if cutting_instructions.len() == 1 { "" } else { "s" },
            ),
            status: StepStatus::Completed,
            duration: finalize_started.elapsed().as_secs_f64(),
            details: None,
        });

        OptimizationResult {
            total_rolls,
            efficiency,
            waste_percentage,
            total_waste,
            cost_savings,
            patterns,
            cutting_instructions,
            algorithm_steps: steps,
            performance: Performance {
                execution_time: started.elapsed().as_secs_f64(),
                memory_usage,
                patterns_evaluated,
                iterations,
                convergence,
            },
        }
    }
}


