use bsmerge_rs::mismatch::count_mismatches;
use bsmerge_rs::strand::Conversion;

#[test]
fn bisulfite_conversion_is_tolerated() {
    assert_eq!(count_mismatches(b"TTGA", b"CTGA", Conversion::CtoT), 0);
    assert_eq!(count_mismatches(b"TAGA", b"CTGA", Conversion::CtoT), 1);
    assert_eq!(count_mismatches(b"AAGT", b"GAGT", Conversion::GtoA), 0);
}

#[test]
fn only_the_strand_conversion_is_tolerated() {
    assert_eq!(count_mismatches(b"T", b"C", Conversion::GtoA), 1);
    assert_eq!(count_mismatches(b"A", b"G", Conversion::CtoT), 1);
    // Reverse of the tolerated pair still counts.
    assert_eq!(count_mismatches(b"C", b"T", Conversion::CtoT), 1);
}

#[test]
fn n_never_counts_but_gaps_do() {
    assert_eq!(count_mismatches(b"NCGT", b"ACGN", Conversion::CtoT), 0);
    assert_eq!(count_mismatches(b"AC-T", b"ACGT", Conversion::CtoT), 1);
    assert_eq!(count_mismatches(b"ACGGT", b"AC-GT", Conversion::CtoT), 1);
}

#[test]
fn counting_is_idempotent() {
    let read = b"ATTGA-CGTANCT";
    let reference = b"ACTGACCGTTACG";
    let first = count_mismatches(read, reference, Conversion::CtoT);
    let second = count_mismatches(read, reference, Conversion::CtoT);
    assert_eq!(first, second);
    assert_eq!(first, 3);
}
