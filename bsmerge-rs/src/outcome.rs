use crate::loader::LoadStats;
use crate::types::EditDistance;
use std::collections::BTreeMap;
use std::fmt;

/// Why a read (or pair) that reached the resolver was not emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DropReason {
    /// Equally good hits on several strands, or several equally scored hits
    /// on the winning strand.
    Ambiguous,
    /// Read missing from the read file, read length disagreeing with the
    /// CIGAR, or an alignment running off its reference sequence.
    Malformed,
    FragmentNotFound,
    /// Mates of a pair disagree on the restriction fragment size.
    FragmentMismatch,
    TooManyMismatches,
    /// Soft clip reported in end-to-end mode.
    SoftClipped,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::Ambiguous => "ambiguous",
            DropReason::Malformed => "malformed",
            DropReason::FragmentNotFound => "fragment_not_found",
            DropReason::FragmentMismatch => "fragment_mismatch",
            DropReason::TooManyMismatches => "too_many_mismatches",
            DropReason::SoftClipped => "soft_clipped",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChunkStats {
    pub load: LoadStats,
    pub retained: u64,
    pub dropped: BTreeMap<DropReason, u64>,
    /// Retained alignments by recomputed mismatch count.
    pub by_mismatches: BTreeMap<EditDistance, u64>,
}

impl ChunkStats {
    pub fn record_retained(&mut self, mismatches: EditDistance) {
        self.retained += 1;
        *self.by_mismatches.entry(mismatches).or_default() += 1;
    }

    pub fn record_dropped(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_default() += 1;
    }

    pub fn dropped(&self, reason: DropReason) -> u64 {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_dropped(&self) -> u64 {
        self.dropped.values().sum()
    }

    pub fn merge(&mut self, other: &ChunkStats) {
        self.load.merge(&other.load);
        self.retained += other.retained;
        for (reason, n) in &other.dropped {
            *self.dropped.entry(*reason).or_default() += n;
        }
        for (mismatches, n) in &other.by_mismatches {
            *self.by_mismatches.entry(*mismatches).or_default() += n;
        }
    }
}
