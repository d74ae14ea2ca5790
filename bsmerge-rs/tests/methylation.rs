use bsmerge_rs::Cigar;
use bsmerge_rs::methylation::{classify_alignment, classify_read};
use bsmerge_rs::reference::ReferenceWindow;
use bsmerge_rs::strand::Orientation;

fn window(bases: &str) -> ReferenceWindow {
    ReferenceWindow::from_bases(bases.as_bytes().to_vec())
}

#[test]
fn cpg_context() {
    assert_eq!(classify_read(b"C", &window("NNCGA")), "Z");
    assert_eq!(classify_read(b"T", &window("NNCGA")), "z");
}

#[test]
fn chg_and_chh_contexts() {
    assert_eq!(classify_read(b"C", &window("NNCAG")), "X");
    assert_eq!(classify_read(b"T", &window("NNCTG")), "x");
    assert_eq!(classify_read(b"C", &window("NNCAT")), "H");
    assert_eq!(classify_read(b"T", &window("NNCTT")), "h");
}

#[test]
fn non_cytosine_positions_are_not_applicable() {
    assert_eq!(classify_read(b"C", &window("NNAGT")), "-");
    assert_eq!(classify_read(b"A", &window("NNCGT")), "-");
    assert_eq!(classify_read(b"G", &window("NNCGT")), "-");
    // Unknown context base.
    assert_eq!(classify_read(b"C", &window("NNCNG")), "-");
}

#[test]
fn boundary_misses_only_blank_their_position() {
    // No right padding: the last C cannot see its context.
    assert_eq!(classify_read(b"ACGC", &window("NNACGC")), "-Z--");
}

#[test]
fn whole_read_calls() {
    // Reference TTACGGATCGAACG, read starts at offset 2 with both CpG cytosines unmethylated.
    assert_eq!(
        classify_read(b"ATGGATTGAA", &window("TTACGGATCGAACG")),
        "-z----z---"
    );
}

#[test]
fn gapped_alignments_follow_the_cigar() {
    let w = window("NNCCGANN");
    let read = b"CTCG";
    let cigar = Cigar::parse("1M1I2M").unwrap();
    assert_eq!(classify_alignment(read, &w, &cigar, Orientation::Forward), "X-Z-");
    assert_eq!(classify_read(read, &w), "Xz--");

    let deletion = Cigar::parse("1M1D1M").unwrap();
    assert_eq!(classify_alignment(b"CC", &window("NNCACGNN"), &deletion, Orientation::Forward), "HZ");
}

#[test]
fn clipped_bases_are_not_called() {
    let cigar = Cigar::parse("1S2M").unwrap();
    let w = window("NNACGNNN");
    // Forward: the clip consumes reference, the first aligned base sits on C.
    assert_eq!(classify_alignment(b"CCG", &w, &cigar, Orientation::Forward), "-Z-");
    // Reverse: the same read is shifted one base left and its C sits on A.
    assert_eq!(classify_alignment(b"CCG", &w, &cigar, Orientation::Reverse), "---");
}
