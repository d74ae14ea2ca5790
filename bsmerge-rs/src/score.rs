use crate::cigar::Cigar;
use crate::types::{EditDistance, Score};

/// Weights used to rank candidate alignments of one read.
///
/// The score only orders hits against each other; it is not a biological
/// alignment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringScheme {
    pub match_score: Score,
    pub mismatch: Score,
    pub gap_open: Score,
    pub gap_extend: Score,
}

impl Default for ScoringScheme {
    fn default() -> Self {
        Self {
            match_score: 1,
            mismatch: -2,
            gap_open: -3,
            gap_extend: -1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub matches: i64,
    pub mismatches: i64,
    pub gap_penalty: Score,
    pub score: Score,
}

impl ScoringScheme {
    pub fn breakdown(&self, cigar: &Cigar, edit_distance: EditDistance) -> ScoreBreakdown {
        let totals = cigar.totals();

        let gap_penalty: Score = cigar
            .gap_runs()
            .map(|run| self.gap_open + (run as Score - 1).max(0) * self.gap_extend)
            .sum();

        let gap_bases = i64::from(totals.inserted) + i64::from(totals.deleted);
        let mismatches = (i64::from(edit_distance) - gap_bases).max(0);
        let aligned =
            i64::from(totals.matched) + i64::from(totals.inserted) + i64::from(totals.soft_clipped);
        let matches = aligned - i64::from(edit_distance);

        let score = matches * i64::from(self.match_score)
            + mismatches * i64::from(self.mismatch)
            + i64::from(gap_penalty);

        ScoreBreakdown {
            matches,
            mismatches,
            gap_penalty,
            score: score.clamp(i64::from(Score::MIN), i64::from(Score::MAX)) as Score,
        }
    }

    pub fn score(&self, cigar: &Cigar, edit_distance: EditDistance) -> Score {
        self.breakdown(cigar, edit_distance).score
    }
}
