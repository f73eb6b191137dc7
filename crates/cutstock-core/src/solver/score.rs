use super::demand::NormalizedDemand;
use super::PatternUsage;
use crate::types::{OptimizationGoal, Priority};

/// Aggregates of a candidate plan that the goal functions consume.
#[derive(Debug, Clone, Copy)]
pub(super) struct PlanStats {
    pub rolls: u32,
    pub waste: u64,
    pub cost: f64,
}

pub(super) fn stats(plan: &[PatternUsage], unit_cost: f64) -> PlanStats {
    let rolls: u32 = plan.iter().map(|u| u.rolls_used).sum();
    let waste: u64 = plan
        .iter()
        .map(|u| u.pattern.waste() as u64 * u.rolls_used as u64)
        .sum();
    PlanStats {
        rolls,
        waste,
        cost: rolls as f64 * unit_cost,
    }
}

/// Goal score of a plan; lower is better. `balance_all` normalizes against
/// the first-fit-decreasing baseline with equal weights; zero baseline
/// components are floored at one to keep the ratios finite.
pub(super) fn score(stats: &PlanStats, goal: OptimizationGoal, baseline: &PlanStats) -> f64 {
    match goal {
        OptimizationGoal::MinimizeWaste => stats.waste as f64,
        OptimizationGoal::MinimizeRolls => stats.rolls as f64,
        OptimizationGoal::MinimizeCost => stats.cost,
        OptimizationGoal::BalanceAll => {
            let rolls = stats.rolls as f64 / (baseline.rolls.max(1)) as f64;
            let waste = stats.waste as f64 / (baseline.waste.max(1)) as f64;
            let cost = stats.cost / baseline.cost.max(1.0);
            (rolls + waste + cost) / 3.0
        }
    }
}

/// Priority-bump tiebreaker: for each priority, the index of the last roll
/// containing a piece of that priority over the report-ordered roll
/// expansion. Earlier satisfaction of high-priority pieces wins, then
/// normal, then low; lexicographically smaller signatures are better.
pub(super) fn priority_signature(
    ordered_plan: &[PatternUsage],
    demand: &NormalizedDemand,
) -> [i64; 3] {
    let mut signature = [-1i64; 3];
    let mut roll_index = 0i64;

    for usage in ordered_plan {
        let last_roll = roll_index + usage.rolls_used as i64 - 1;
        for &(length, _) in usage.pattern.cuts() {
            let slot = match demand.priority_of(length) {
                Priority::High => 0,
                Priority::Normal => 1,
                Priority::Low => 2,
            };
            signature[slot] = signature[slot].max(last_roll);
        }
        roll_index += usage.rolls_used as i64;
    }

    signature
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BeamRequirement, SolverConfig};

    use super::super::pattern::Pattern;

    fn usage(cuts: &[(u32, u32)], master: u32, rolls: u32) -> PatternUsage {
        PatternUsage {
            pattern: Pattern::new(cuts.to_vec(), master).unwrap(),
            rolls_used: rolls,
        }
    }

    #[test]
    fn goal_scores_follow_the_definitions() {
        let plan = vec![usage(&[(60, 1), (30, 1)], 100, 2), usage(&[(50, 1)], 100, 1)];
        let s = stats(&plan, 2.5);

        assert_eq!(s.rolls, 3);
        assert_eq!(s.waste, 2 * 10 + 50);
        assert!((s.cost - 7.5).abs() < 1e-9);

        let baseline = s;
        assert_eq!(score(&s, OptimizationGoal::MinimizeWaste, &baseline), 70.0);
        assert_eq!(score(&s, OptimizationGoal::MinimizeRolls, &baseline), 3.0);
        assert_eq!(score(&s, OptimizationGoal::MinimizeCost, &baseline), 7.5);
        // Against itself, balance_all is exactly one.
        assert!((score(&s, OptimizationGoal::BalanceAll, &baseline) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn priority_signature_tracks_last_satisfying_roll() {
        let reqs = vec![
            BeamRequirement {
                length: 60,
                quantity: 2,
                priority: crate::types::Priority::High,
            },
            BeamRequirement {
                length: 30,
                quantity: 2,
                priority: crate::types::Priority::Low,
            },
        ];
        let demand = NormalizedDemand::new(&reqs, 100, &SolverConfig::default()).unwrap();

        // Two rolls of 1x60, then one roll of 2x30: high pieces are done by
        // roll 1, low pieces by roll 2.
        let plan = vec![usage(&[(60, 1)], 100, 2), usage(&[(30, 2)], 100, 1)];
        assert_eq!(priority_signature(&plan, &demand), [1, -1, 2]);

        // The reverse order satisfies the low pieces first.
        let plan = vec![usage(&[(30, 2)], 100, 1), usage(&[(60, 1)], 100, 2)];
        assert_eq!(priority_signature(&plan, &demand), [2, -1, 0]);
    }
}


