use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use super::demand::NormalizedDemand;
use crate::types::{CancelToken, Result, SolverConfig, SolverError};

/// Outcome of one pricing call: the maximum dual value collectable in a
/// single roll and one optimal piece-count vector, aligned with the
/// normalized demand order.
#[derive(Debug, Clone)]
pub(super) struct PricingSolution {
    pub objective: f64,
    pub counts: Vec<u32>,
    /// True when the time budget expired and the result is the best primal
    /// found so far rather than a proven optimum.
    pub timed_out: bool,
    /// Bytes allocated for the DP table, for the report's memory estimate.
    pub table_bytes: u64,
}

/// Comparable solution state carrying the tie-break keys: larger objective,
/// then more pieces, then more used length.
#[derive(Debug, Clone, Copy, Default)]
struct State {
    value: f64,
    pieces: u32,
    length: u64,
}

impl State {
    fn beats(&self, other: &State) -> bool {
        if self.value != other.value {
            return self.value > other.value;
        }
        if self.pieces != other.pieces {
            return self.pieces > other.pieces;
        }
        self.length > other.length
    }
}

/// Solves the bounded knapsack max Σ dᵢxᵢ s.t. Σ ℓᵢxᵢ ≤ L, 0 ≤ xᵢ ≤ qᵢ.
///
/// Uses dynamic programming over capacities when the table fits the cell
/// budget, and best-first branch and bound otherwise. Both paths apply the
/// same tie-breaks and are deterministic for identical inputs.
pub(super) fn solve_pricing(
    duals: &[f64],
    demand: &NormalizedDemand,
    config: &SolverConfig,
    deadline: Instant,
    cancel: &CancelToken,
) -> Result<PricingSolution> {
    let capacity = demand.master_roll_length() as usize;
    let n = demand.len();

    // One value row plus one count row per item.
    let cells = (n + 1) * (capacity + 1);
    if cells > config.max_dp_cells {
        return branch_and_bound(duals, demand, config, deadline, cancel);
    }

    dynamic_programming(duals, demand, capacity, deadline, cancel)
}

fn dynamic_programming(
    duals: &[f64],
    demand: &NormalizedDemand,
    capacity: usize,
    deadline: Instant,
    cancel: &CancelToken,
) -> Result<PricingSolution> {
    let entries = demand.entries();
    let n = entries.len();

    let mut state = vec![State::default(); capacity + 1];
    // rows[i][c] = copies of item i in the optimum over items 0..=i at
    // capacity c; exact reconstruction walks these rows back.
    let mut rows: Vec<Vec<u32>> = Vec::with_capacity(n);
    let table_bytes = ((capacity + 1) * std::mem::size_of::<State>()
        + n * (capacity + 1) * std::mem::size_of::<u32>()) as u64;

    let mut processed = 0;
    let mut timed_out = false;

    for (i, entry) in entries.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(SolverError::Cancelled);
        }
        if Instant::now() >= deadline {
            timed_out = true;
            break;
        }

        let weight = entry.length as usize;
        let max_take = entry.quantity.min((capacity / weight) as u32);
        let mut row = vec![0u32; capacity + 1];

        // Power-of-two decomposition: chunks of 1, 2, 4, ... plus remainder,
        // each treated as a 0/1 item over descending capacities.
        let mut remaining = max_take;
        let mut chunk = 1u32;
        while remaining > 0 {
            let take = chunk.min(remaining);
            let chunk_weight = weight * take as usize;
            let chunk_value = duals[i] * take as f64;

            for c in (chunk_weight..=capacity).rev() {
                let base = state[c - chunk_weight];
                let candidate = State {
                    value: base.value + chunk_value,
                    pieces: base.pieces + take,
                    length: base.length + chunk_weight as u64,
                };
                if candidate.beats(&state[c]) {
                    state[c] = candidate;
                    row[c] = row[c - chunk_weight] + take;
                }
            }

            remaining -= take;
            chunk = chunk.saturating_mul(2);
        }

        rows.push(row);
        processed = i + 1;
    }

    let mut counts = vec![0u32; n];
    let mut c = capacity;
    for i in (0..processed).rev() {
        let taken = rows[i][c];
        counts[i] = taken;
        c -= taken as usize * entries[i].length as usize;
    }

    Ok(PricingSolution {
        objective: state[capacity].value,
        counts,
        timed_out,
        table_bytes,
    })
}

/// Frontier node for the best-first fallback. Ordered by relaxation bound,
/// with insertion order as the deterministic tiebreaker.
struct BbNode {
    bound: f64,
    state: State,
    next_item: usize,
    remaining: u32,
    counts: Vec<u32>,
    seq: u64,
}

impl PartialEq for BbNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BbNode {}

impl PartialOrd for BbNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BbNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bound
            .total_cmp(&other.bound)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Best-first branch and bound for master roll lengths whose DP table would
/// exceed the cell budget. The relaxation bound is
/// `value + remaining_capacity · max(dᵢ/ℓᵢ)` over the unfixed items.
fn branch_and_bound(
    duals: &[f64],
    demand: &NormalizedDemand,
    config: &SolverConfig,
    deadline: Instant,
    cancel: &CancelToken,
) -> Result<PricingSolution> {
    let entries = demand.entries();
    let n = entries.len();
    let capacity = demand.master_roll_length();

    // suffix_density[i] = best value-per-length over items i..n.
    let mut suffix_density = vec![0.0f64; n + 1];
    for i in (0..n).rev() {
        let density = (duals[i] / entries[i].length as f64).max(0.0);
        suffix_density[i] = suffix_density[i + 1].max(density);
    }

    let mut incumbent = greedy_seed(duals, demand);
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;
    heap.push(BbNode {
        bound: capacity as f64 * suffix_density[0],
        state: State::default(),
        next_item: 0,
        remaining: capacity,
        counts: vec![0u32; n],
        seq,
    });

    let mut timed_out = false;
    let mut popped = 0usize;

    while let Some(node) = heap.pop() {
        if cancel.is_cancelled() {
            return Err(SolverError::Cancelled);
        }
        if Instant::now() >= deadline {
            timed_out = true;
            break;
        }

        popped += 1;
        if popped > config.max_bb_nodes {
            return Err(SolverError::ResourceExceeded(format!(
                "Pricing branch-and-bound exceeded its node budget of {}",
                config.max_bb_nodes
            )));
        }

        if node.bound < incumbent.0.value - 1e-9 {
            continue;
        }

        let i = node.next_item;
        if i == n {
            if node.state.beats(&incumbent.0) {
                incumbent = (node.state, node.counts);
            }
            continue;
        }

        let weight = entries[i].length;
        let max_take = entries[i].quantity.min(node.remaining / weight);

        // Larger counts first, so equal-bound ties resolve toward loading
        // earlier (longer) lengths.
        for take in (0..=max_take).rev() {
            let used = weight as u64 * take as u64;
            let state = State {
                value: node.state.value + duals[i] * take as f64,
                pieces: node.state.pieces + take,
                length: node.state.length + used,
            };
            let remaining = node.remaining - weight * take;
            let bound = state.value + remaining as f64 * suffix_density[i + 1];
            if bound < incumbent.0.value - 1e-9 {
                continue;
            }

            let mut counts = node.counts.clone();
            counts[i] = take;

            if i + 1 == n {
                if state.beats(&incumbent.0) {
                    incumbent = (state, counts);
                }
            } else {
                seq += 1;
                heap.push(BbNode {
                    bound,
                    state,
                    next_item: i + 1,
                    remaining,
                    counts,
                    seq,
                });
            }
        }
    }

    Ok(PricingSolution {
        objective: incumbent.0.value,
        counts: incumbent.1,
        timed_out,
        table_bytes: 0,
    })
}

/// Deterministic density-ordered greedy fill, the initial incumbent for the
/// branch-and-bound path.
fn greedy_seed(duals: &[f64], demand: &NormalizedDemand) -> (State, Vec<u32>) {
    let entries = demand.entries();
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| {
        let da = duals[a] / entries[a].length as f64;
        let db = duals[b] / entries[b].length as f64;
        db.total_cmp(&da).then_with(|| a.cmp(&b))
    });

    let mut remaining = demand.master_roll_length();
    let mut counts = vec![0u32; entries.len()];
    let mut state = State::default();
    for i in order {
        if duals[i] <= 0.0 {
            continue;
        }
        let take = entries[i].quantity.min(remaining / entries[i].length);
        if take == 0 {
            continue;
        }
        counts[i] = take;
        remaining -= entries[i].length * take;
        state.value += duals[i] * take as f64;
        state.pieces += take;
        state.length += entries[i].length as u64 * take as u64;
    }
    (state, counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BeamRequirement, Priority};
    use std::time::Duration;

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

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[test]
    fn packs_highest_value_combination() {
        // Lengths 60 and 40 in a roll of 100; equal duals favor more pieces.
        let demand = demand_of(&[(60, 2), (40, 2)], 100);
        let solution = solve_pricing(
            &[0.6, 0.4],
            &demand,
            &SolverConfig::default(),
            far_deadline(),
            &CancelToken::new(),
        )
        .unwrap();

        assert!((solution.objective - 1.0).abs() < 1e-9);
        // 1x60 + 1x40 fills the roll exactly and uses two pieces, beating
        // the single-piece alternatives of equal value.
        assert_eq!(solution.counts, vec![1, 1]);
    }

    #[test]
    fn respects_quantity_bounds() {
        let demand = demand_of(&[(10, 3)], 100);
        let solution = solve_pricing(
            &[1.0],
            &demand,
            &SolverConfig::default(),
            far_deadline(),
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(solution.counts, vec![3]);
        assert!((solution.objective - 3.0).abs() < 1e-9);
    }

    #[test]
    fn prefers_more_pieces_on_value_ties() {
        // Both items have zero-ish value distinctions: 2x30 and 1x60 collect
        // the same dual value; the two-piece fill must win.
        let demand = demand_of(&[(60, 1), (30, 2)], 60);
        let solution = solve_pricing(
            &[0.6, 0.3],
            &demand,
            &SolverConfig::default(),
            far_deadline(),
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(solution.counts, vec![0, 2]);
    }

    #[test]
    fn fallback_matches_dp() {
        let demand = demand_of(&[(7, 4), (5, 3), (3, 6)], 40);
        let duals = [0.9, 0.55, 0.28];
        let config = SolverConfig::default();

        let dp = solve_pricing(&duals, &demand, &config, far_deadline(), &CancelToken::new())
            .unwrap();
        // Force the table over budget so the fallback runs.
        let tiny = SolverConfig::default().with_max_dp_cells(8);
        let bb = solve_pricing(&duals, &demand, &tiny, far_deadline(), &CancelToken::new())
            .unwrap();

        assert!((dp.objective - bb.objective).abs() < 1e-9);
        assert_eq!(dp.counts, bb.counts);
    }

    #[test]
    fn cancellation_stops_the_pricer() {
        let demand = demand_of(&[(10, 5)], 1000);
        let token = CancelToken::new();
        token.cancel();
        let err = solve_pricing(
            &[1.0],
            &demand,
            &SolverConfig::default(),
            far_deadline(),
            &token,
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::Cancelled));
    }
}


