use bsmerge_rs::Cigar;
use bsmerge_rs::reconstruct::{GAP, ReconstructError, reconstruct};
use bsmerge_rs::reference::ReferenceWindow;
use bsmerge_rs::strand::Orientation;

fn window(core: &str) -> ReferenceWindow {
    ReferenceWindow::from_bases(format!("GG{core}TT").into_bytes())
}

fn cigar(s: &str) -> Cigar {
    Cigar::parse(s).unwrap()
}

#[test]
fn ungapped_alignment_copies_both_sides() {
    let r = reconstruct(b"ACGTACGTAC", &window("ACGTACGTAC"), &cigar("10M"), Orientation::Forward).unwrap();
    assert_eq!(r.aligned_read(), b"ACGTACGTAC");
    assert_eq!(r.aligned_reference(), b"ACGTACGTAC");
    assert_eq!(r.aligned_len(), 10);
}

#[test]
fn insertion_gaps_the_reference() {
    let r = reconstruct(b"ACGTTTACGT", &window("ACGTACGTNN"), &cigar("4M2I4M"), Orientation::Forward).unwrap();
    assert_eq!(r.aligned_read(), b"ACGTTTACGT");
    assert_eq!(r.aligned_reference(), b"ACGT--ACGT");
    assert_eq!(r.insertions, 2);
    assert_eq!(r.deletions, 0);
}

#[test]
fn deletion_gaps_the_read() {
    let r = reconstruct(b"ACGTACGT", &window("ACGTCCACGT"), &cigar("4M2D4M"), Orientation::Reverse).unwrap();
    assert_eq!(r.aligned_read(), b"ACGT--ACGT");
    assert_eq!(r.aligned_reference(), b"ACGTCCACGT");
    assert_eq!(r.deletions, 2);
}

#[test]
fn leading_clip_depends_on_orientation() {
    // Forward: the aligner position includes the clipped bases.
    let fw = reconstruct(b"GGACGTACGT", &window("TTACGTACGT"), &cigar("2S8M"), Orientation::Forward).unwrap();
    assert_eq!(fw.leading_clip, 2);
    assert_eq!(fw.aligned_read(), b"ACGTACGT");
    assert_eq!(fw.aligned_reference(), b"ACGTACGT");

    // Reverse: the position is already past the clip.
    let rc = reconstruct(b"GGACGTACGT", &window("ACGTACGTTT"), &cigar("2S8M"), Orientation::Reverse).unwrap();
    assert_eq!(rc.leading_clip, 2);
    assert_eq!(rc.aligned_read(), b"ACGTACGT");
    assert_eq!(rc.aligned_reference(), b"ACGTACGT");
}

#[test]
fn lone_clip_is_leading() {
    let clip = cigar("4S");
    let fw = reconstruct(b"ACGT", &window("TTTT"), &clip, Orientation::Forward).unwrap();
    assert_eq!(fw.leading_clip, clip.leading_soft_clip());
    assert_eq!(fw.trailing_clip, clip.trailing_soft_clip());
    assert_eq!(fw.full_reference(), b"TTTT");
    assert_eq!(fw.aligned_len(), 0);

    let rc = reconstruct(b"ACGT", &window("TTTT"), &clip, Orientation::Reverse).unwrap();
    assert_eq!(rc.leading_clip, 4);
    assert!(rc.full_reference().is_empty());
    assert_eq!(rc.aligned_len(), 0);
}

#[test]
fn trailing_clip_is_trimmed() {
    let r = reconstruct(b"ACGTACGTGG", &window("ACGTACGTTT"), &cigar("8M2S"), Orientation::Forward).unwrap();
    assert_eq!(r.trailing_clip, 2);
    assert_eq!(r.aligned_read(), b"ACGTACGT");
    assert_eq!(r.aligned_reference(), b"ACGTACGT");
    assert_eq!(r.full_read(), b"ACGTACGTGG");
}

#[test]
fn read_length_must_match_cigar() {
    let err = reconstruct(b"ACGTACGTAC", &window("ACGTACGTAC"), &cigar("8M"), Orientation::Forward).unwrap_err();
    assert_eq!(err, ReconstructError::ReadLength { cigar: 8, read: 10 });
}

#[test]
fn short_window_is_reported() {
    let err = reconstruct(b"ACGTACGTAC", &ReferenceWindow::from_bases(b"GGACGT".to_vec()), &cigar("10M"), Orientation::Forward)
        .unwrap_err();
    assert_eq!(err, ReconstructError::ReferenceExhausted);
}

#[test]
fn read_side_keeps_every_read_base() {
    let read = b"ACGTACGTACGTACGTACGT";
    let cases = [
        "20M",
        "3S17M",
        "17M3S",
        "2S5M2I6M1D3M2S",
        "5M3D15M",
        "4M1I4M2N11M",
        "1S18M1S",
    ];
    for c in cases {
        let cigar = cigar(c);
        let totals = cigar.totals();
        let core_len = read.len() + (totals.deleted + totals.skipped) as usize;
        let core = "A".repeat(core_len);
        for orientation in [Orientation::Forward, Orientation::Reverse] {
            let r = reconstruct(read, &window(&core), &cigar, orientation).unwrap();
            let bases = r.full_read().iter().filter(|&&b| b != GAP).count();
            assert_eq!(bases, read.len(), "cigar {c}");
            assert_eq!(r.aligned_read().len(), r.aligned_reference().len(), "cigar {c}");
        }
    }
}
