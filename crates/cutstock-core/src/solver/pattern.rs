use crate::types::{Result, SolverError};

/// A way of cutting one master roll: piece counts per length, with the
/// derived used length and waste. Immutable once constructed; the cut list
/// is kept canonical (sorted by descending length) so equality, hashing and
/// the content-addressed id are stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    cuts: Vec<(u32, u32)>,
    total_length: u32,
    waste: u32,
}

impl Pattern {
    /// Builds a pattern from (length, count) pairs, enforcing the capacity
    /// constraint against the master roll length. Zero counts are dropped;
    /// an entirely empty pattern is rejected.
    pub fn new(cuts: Vec<(u32, u32)>, master_roll_length: u32) -> Result<Self> {
        let mut cuts: Vec<(u32, u32)> = cuts.into_iter().filter(|&(_, c)| c > 0).collect();
        if cuts.is_empty() {
            return Err(SolverError::InvalidInput(
                "A pattern must contain at least one piece".to_string(),
            ));
        }
        cuts.sort_by(|a, b| b.0.cmp(&a.0));

        let total: u64 = cuts.iter().map(|&(l, c)| l as u64 * c as u64).sum();
        if total > master_roll_length as u64 {
            return Err(SolverError::InvalidInput(format!(
                "Pattern length {} exceeds the master roll length {}",
                total, master_roll_length
            )));
        }

        let total_length = total as u32;
        Ok(Self {
            cuts,
            total_length,
            waste: master_roll_length - total_length,
        })
    }

    /// Builds a pattern from a per-entry count vector aligned with the
    /// normalized demand order.
    pub fn from_counts(
        lengths: &[u32],
        counts: &[u32],
        master_roll_length: u32,
    ) -> Result<Self> {
        let cuts = lengths
            .iter()
            .zip(counts)
            .map(|(&l, &c)| (l, c))
            .collect();
        Self::new(cuts, master_roll_length)
    }

    /// Canonical (length, count) pairs, sorted by descending length.
    pub fn cuts(&self) -> &[(u32, u32)] {
        &self.cuts
    }

    pub fn total_length(&self) -> u32 {
        self.total_length
    }

    pub fn waste(&self) -> u32 {
        self.waste
    }

    /// Number of pieces of the given length in this pattern.
    pub fn count_of(&self, length: u32) -> u32 {
        self.cuts
            .iter()
            .find(|&&(l, _)| l == length)
            .map(|&(_, c)| c)
            .unwrap_or(0)
    }

    /// Total piece count across all lengths.
    pub fn piece_count(&self) -> u32 {
        self.cuts.iter().map(|&(_, c)| c).sum()
    }

    /// Content-addressed id: an FNV-1a 64 hash of the canonical pairs,
    /// rendered as decimal. Stable across runs, appears in user-facing
    /// output.
    pub fn id(&self) -> String {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

        let mut hash = FNV_OFFSET;
        for &(length, count) in &self.cuts {
            for byte in length.to_be_bytes().iter().chain(count.to_be_bytes().iter()) {
                hash ^= *byte as u64;
                hash = hash.wrapping_mul(FNV_PRIME);
            }
        }
        hash.to_string()
    }

    /// Canonical display form: `"2×50 + 1×30 (waste 20)"`.
    pub fn describe(&self) -> String {
        let cuts = self
            .cuts
            .iter()
            .map(|&(l, c)| format!("{}\u{d7}{}", c, l))
            .collect::<Vec<_>>()
            .join(" + ");
        format!("{} (waste {})", cuts, self.waste)
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_cut_order() {
        let a = Pattern::new(vec![(30, 1), (60, 1)], 100).unwrap();
        let b = Pattern::new(vec![(60, 1), (30, 1)], 100).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.cuts(), &[(60, 1), (30, 1)]);
    }

    #[test]
    fn derives_length_and_waste() {
        let p = Pattern::new(vec![(50, 2)], 120).unwrap();
        assert_eq!(p.total_length(), 100);
        assert_eq!(p.waste(), 20);
        assert_eq!(p.count_of(50), 2);
        assert_eq!(p.count_of(40), 0);
    }

    #[test]
    fn rejects_overfull_pattern() {
        assert!(Pattern::new(vec![(60, 2)], 100).is_err());
    }

    #[test]
    fn rejects_empty_pattern() {
        assert!(Pattern::new(vec![(50, 0)], 100).is_err());
    }

    #[test]
    fn id_distinguishes_different_patterns() {
        let a = Pattern::new(vec![(50, 2)], 100).unwrap();
        let b = Pattern::new(vec![(50, 1), (30, 1)], 100).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn describes_canonically() {
        let p = Pattern::new(vec![(30, 2), (40, 1)], 110).unwrap();
        assert_eq!(p.describe(), "1\u{d7}40 + 2\u{d7}30 (waste 10)");
    }
}


