use bsmerge_rs::{Cigar, ScoringScheme};

fn cigar(s: &str) -> Cigar {
    Cigar::parse(s).unwrap()
}

#[test]
fn perfect_match_scores_one_per_base() {
    let scheme = ScoringScheme::default();
    let b = scheme.breakdown(&cigar("5M"), 0);
    assert_eq!(b.matches, 5);
    assert_eq!(b.mismatches, 0);
    assert_eq!(b.gap_penalty, 0);
    assert_eq!(b.score, 5 * scheme.match_score);
}

#[test]
fn mismatches_are_penalised() {
    let b = ScoringScheme::default().breakdown(&cigar("10M"), 2);
    assert_eq!(b.matches, 8);
    assert_eq!(b.mismatches, 2);
    assert_eq!(b.score, 8 - 4);
}

#[test]
fn gap_open_and_extend() {
    let scheme = ScoringScheme::default();

    // 2-base insertion: open + one extension, one substitution left over.
    let b = scheme.breakdown(&cigar("5M2I5M"), 3);
    assert_eq!(b.gap_penalty, -4);
    assert_eq!(b.mismatches, 1);
    assert_eq!(b.matches, 9);
    assert_eq!(b.score, 9 - 2 - 4);

    let b = scheme.breakdown(&cigar("5M1D5M"), 1);
    assert_eq!(b.gap_penalty, -3);
    assert_eq!(b.mismatches, 0);
    assert_eq!(b.matches, 9);
    assert_eq!(b.score, 6);
}

#[test]
fn each_gap_run_opens_separately() {
    let b = ScoringScheme::default().breakdown(&cigar("3M1I3M1D3M"), 2);
    assert_eq!(b.gap_penalty, -6);
    assert_eq!(b.mismatches, 0);
}

#[test]
fn custom_weights() {
    let scheme = ScoringScheme {
        match_score: 2,
        mismatch: -3,
        gap_open: -4,
        gap_extend: -1,
    };
    assert_eq!(scheme.score(&cigar("10M"), 1), 9 * 2 - 3);
    assert_eq!(scheme.score(&cigar("4M3I3M"), 3), 7 * 2 + (-4 - 2));
}

#[test]
fn edit_distance_below_gap_bases_does_not_go_negative() {
    let b = ScoringScheme::default().breakdown(&cigar("5M2D5M"), 1);
    assert_eq!(b.mismatches, 0);
}
