use super::demand::NormalizedDemand;
use super::pattern::Pattern;
use super::score;
use super::PatternUsage;
use crate::types::{OptimizationGoal, Result};

/// One partially filled roll during greedy placement.
struct OpenRoll {
    remaining: u32,
    pieces: Vec<u32>,
}

/// First-fit decreasing: each piece goes into the first open roll with
/// enough remaining capacity, or opens a new roll.
pub(super) fn first_fit(demand: &NormalizedDemand) -> Result<Vec<PatternUsage>> {
    place(demand, |rolls, length| {
        rolls.iter().position(|r| r.remaining >= length)
    })
}

/// Best-fit decreasing: each piece goes into the open roll with the
/// smallest remaining capacity that still fits, older rolls on ties.
pub(super) fn best_fit(demand: &NormalizedDemand) -> Result<Vec<PatternUsage>> {
    place(demand, |rolls, length| {
        rolls
            .iter()
            .enumerate()
            .filter(|(_, r)| r.remaining >= length)
            .min_by_key(|&(i, r)| (r.remaining, i))
            .map(|(i, _)| i)
    })
}

/// Runs both heuristics and keeps the one scoring better under the goal,
/// first-fit on ties.
pub(super) fn hybrid(
    demand: &NormalizedDemand,
    goal: OptimizationGoal,
    unit_cost: f64,
) -> Result<Vec<PatternUsage>> {
    let ffd = first_fit(demand)?;
    let bfd = best_fit(demand)?;

    let baseline = score::stats(&ffd, unit_cost);
    let ffd_score = score::score(&score::stats(&ffd, unit_cost), goal, &baseline);
    let bfd_score = score::score(&score::stats(&bfd, unit_cost), goal, &baseline);

    if bfd_score < ffd_score {
        Ok(bfd)
    } else {
        Ok(ffd)
    }
}

/// Shared placement frame: expand the demand into individual pieces sorted
/// by descending length (stable within equal lengths), run the fit rule,
/// and merge identical rolls into pattern usages.
fn place(
    demand: &NormalizedDemand,
    fit: impl Fn(&[OpenRoll], u32) -> Option<usize>,
) -> Result<Vec<PatternUsage>> {
    let mut rolls: Vec<OpenRoll> = Vec::new();
    let master = demand.master_roll_length();

    for entry in demand.entries() {
        for _ in 0..entry.quantity {
            match fit(&rolls, entry.length) {
                Some(i) => {
                    rolls[i].remaining -= entry.length;
                    rolls[i].pieces.push(entry.length);
                }
                None => rolls.push(OpenRoll {
                    remaining: master - entry.length,
                    pieces: vec![entry.length],
                }),
            }
        }
    }

    merge_rolls(rolls, master)
}

/// Collapses rolls carrying the same piece multiset into one usage entry,
/// preserving the order in which each distinct pattern first appeared.
fn merge_rolls(rolls: Vec<OpenRoll>, master: u32) -> Result<Vec<PatternUsage>> {
    let mut plan: Vec<PatternUsage> = Vec::new();
    for roll in rolls {
        let mut cuts: Vec<(u32, u32)> = Vec::new();
        for piece in roll.pieces {
            match cuts.iter_mut().find(|(l, _)| *l == piece) {
                Some((_, c)) => *c += 1,
                None => cuts.push((piece, 1)),
            }
        }
        let pattern = Pattern::new(cuts, master)?;
        match plan.iter_mut().find(|u| u.pattern == pattern) {
            Some(usage) => usage.rolls_used += 1,
            None => plan.push(PatternUsage {
                pattern,
                rolls_used: 1,
            }),
        }
    }
    Ok(plan)
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

    fn total_rolls(plan: &[PatternUsage]) -> u32 {
        plan.iter().map(|u| u.rolls_used).sum()
    }

    #[test]
    fn first_fit_opens_rolls_in_order() {
        // 60 opens roll 1, 50 cannot join it, 40 fits beside 60.
        let demand = demand_of(&[(60, 1), (50, 1), (40, 1)], 100);
        let plan = first_fit(&demand).unwrap();

        assert_eq!(total_rolls(&plan), 2);
        assert_eq!(plan[0].pattern.cuts(), &[(60, 1), (40, 1)]);
        assert_eq!(plan[1].pattern.cuts(), &[(50, 1)]);
    }

    #[test]
    fn best_fit_prefers_the_tightest_roll() {
        // After 60, 50 and 45 are placed the open rolls hold 40 and 5 of
        // remaining capacity. The final 5 goes to the first roll under
        // first-fit but to the tighter second roll under best-fit.
        let demand = demand_of(&[(60, 1), (50, 1), (45, 1), (5, 1)], 100);

        let ffd = first_fit(&demand).unwrap();
        assert!(ffd.iter().any(|u| u.pattern.cuts() == [(60, 1), (5, 1)]));
        assert!(ffd.iter().any(|u| u.pattern.cuts() == [(50, 1), (45, 1)]));

        let bfd = best_fit(&demand).unwrap();
        assert!(bfd.iter().any(|u| u.pattern.cuts() == [(60, 1)]));
        assert!(bfd
            .iter()
            .any(|u| u.pattern.cuts() == [(50, 1), (45, 1), (5, 1)]));
    }

    #[test]
    fn identical_rolls_merge() {
        let demand = demand_of(&[(3, 7)], 10);
        let plan = first_fit(&demand).unwrap();

        assert_eq!(total_rolls(&plan), 3);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].pattern.cuts(), &[(3, 3)]);
        assert_eq!(plan[0].rolls_used, 2);
        assert_eq!(plan[1].pattern.cuts(), &[(3, 1)]);
        assert_eq!(plan[1].rolls_used, 1);
    }

    #[test]
    fn hybrid_never_loses_to_first_fit() {
        let demand = demand_of(&[(70, 2), (60, 2), (30, 2), (25, 2)], 100);
        let ffd = first_fit(&demand).unwrap();
        let plan = hybrid(&demand, OptimizationGoal::MinimizeRolls, 1.0).unwrap();
        assert!(total_rolls(&plan) <= total_rolls(&ffd));
    }
}


