mod common;

use bsmerge_rs::pipeline::{self, ALIGNMENTS_FILE, SharedData, process_chunk};
use bsmerge_rs::{DropReason, ReconcileConfig};
use common::{GENOME, fastq, sam, sam_mate};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn write_genome(dir: &Path) -> PathBuf {
    let path = dir.join("genome.fa");
    fs::write(&path, format!(">chr1 test contig\n{}\n{}\n", &GENOME[..20], &GENOME[20..])).unwrap();
    path
}

/// r1 maps only to FW_C2T, r2 equally well to both strands, r3 only to RC_G2A.
fn write_chunk(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("FW_C2T.sam"),
        [
            "@HD\tVN:1.6\n".to_string(),
            sam("r1", 0, "chr1", 3, "10M", 0),
            sam("r2", 0, "chr1", 3, "10M", 0),
        ]
        .concat(),
    )
    .unwrap();
    fs::write(
        dir.join("RC_G2A.sam"),
        [
            sam("r2", 16, "chr1", 3, "10M", 0),
            sam("r3", 16, "chr1", 21, "10M", 0),
        ]
        .concat(),
    )
    .unwrap();
    fs::write(
        dir.join("reads.fq"),
        fastq(&[
            ("r1", "ATGGATTGAA"),
            ("r2", "ATGGATTGAA"),
            ("r3", "GGACTTGCAT"),
        ]),
    )
    .unwrap();
}

#[test]
fn chunk_keeps_unique_hits_in_strand_order() {
    let tmp = TempDir::new().unwrap();
    let genome = write_genome(tmp.path());
    let chunk = tmp.path().join("chunk-0");
    write_chunk(&chunk);

    let shared = SharedData::load(&genome, None, None, None).unwrap();
    let config = ReconcileConfig {
        methylation: true,
        ..ReconcileConfig::default()
    };
    let mut out = Vec::new();
    let stats = process_chunk(&chunk, &shared, &config, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("r1\t0\tchr1\t3\t255\t10M\t*\t0\t0\tACGGATCGAA\t*\tNM:i:0\tXM:Z:-z----z---"));
    assert!(lines[1].starts_with("r3\t16\tchr1\t21\t255\t10M\t"));
    assert!(lines[1].ends_with("XR:Z:CT\tXG:Z:GA"));

    assert_eq!(stats.load.lines, 4);
    assert_eq!(stats.retained, 2);
    assert_eq!(stats.dropped(DropReason::Ambiguous), 1);
    assert_eq!(stats.total_dropped(), 1);
    assert_eq!(stats.by_mismatches.get(&0), Some(&2));
}

#[test]
fn keep_ambiguous_emits_first_strand() {
    let tmp = TempDir::new().unwrap();
    let genome = write_genome(tmp.path());
    let chunk = tmp.path().join("chunk-0");
    write_chunk(&chunk);

    let shared = SharedData::load(&genome, None, None, None).unwrap();
    let config = ReconcileConfig {
        keep_ambiguous: true,
        ..ReconcileConfig::default()
    };
    let mut out = Vec::new();
    let stats = process_chunk(&chunk, &shared, &config, &mut out).unwrap();

    // Cross-strand ties are still dropped; only within-strand ties are kept.
    assert_eq!(stats.dropped(DropReason::Ambiguous), 1);
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
}

#[test]
fn missing_strand_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let genome = write_genome(tmp.path());
    let chunk = tmp.path().join("chunk-0");
    write_chunk(&chunk);
    fs::remove_file(chunk.join("RC_G2A.sam")).unwrap();

    let shared = SharedData::load(&genome, None, None, None).unwrap();
    let mut out = Vec::new();
    assert!(process_chunk(&chunk, &shared, &ReconcileConfig::default(), &mut out).is_err());
}

#[test]
fn paired_chunk_writes_both_mates() {
    let tmp = TempDir::new().unwrap();
    let genome = write_genome(tmp.path());
    let chunk = tmp.path().join("chunk-0");
    fs::create_dir_all(&chunk).unwrap();
    fs::write(
        chunk.join("FW_C2T.sam"),
        [
            sam_mate("p1/1", "chr1", 3, "10M", 28, 0),
            sam_mate("p1/2", "chr1", 21, "10M", -28, 0),
            sam_mate("p2/1", "chr1", 3, "10M", 28, 0),
            sam_mate("p2/2", "chr1", 21, "10M", -28, 0),
        ]
        .concat(),
    )
    .unwrap();
    fs::write(chunk.join("RC_G2A.sam"), "").unwrap();
    fs::write(
        chunk.join("reads_1.fq"),
        fastq(&[("p1/1", "ATGGATTGAA"), ("p2/1", "ATGGATTGAA")]),
    )
    .unwrap();
    // Mate 2 of p2 is absent from the second read file.
    fs::write(chunk.join("reads_2.fq"), fastq(&[("p1/2", "GGACTTGCAT")])).unwrap();

    let shared = SharedData::load(&genome, None, None, None).unwrap();
    let config = ReconcileConfig {
        paired: true,
        ..ReconcileConfig::default()
    };
    let mut out = Vec::new();
    let stats = process_chunk(&chunk, &shared, &config, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<Vec<&str>> = text.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        &lines[0][..11],
        ["p1", "0", "chr1", "3", "255", "10M", "chr1", "21", "28", "ACGGATCGAA", "*"]
    );
    assert_eq!(
        &lines[1][..11],
        ["p1", "0", "chr1", "21", "255", "10M", "chr1", "3", "-28", "ATGCAAGTCC", "*"]
    );
    assert_eq!(lines[1][11], "NM:i:0");

    assert_eq!(stats.load.records, 2);
    assert_eq!(stats.retained, 1);
    assert_eq!(stats.dropped(DropReason::Malformed), 1);
    assert_eq!(stats.total_dropped(), 1);
}

#[test]
fn non_directional_chunk_reads_four_strands() {
    let tmp = TempDir::new().unwrap();
    let genome = write_genome(tmp.path());
    let chunk = tmp.path().join("chunk-0");
    fs::create_dir_all(&chunk).unwrap();
    fs::write(chunk.join("FW_C2T.sam"), sam("n1", 0, "chr1", 3, "10M", 0)).unwrap();
    fs::write(chunk.join("RC_G2A.sam"), "").unwrap();
    fs::write(chunk.join("FW_G2A.sam"), sam("n1", 16, "chr1", 3, "10M", 1)).unwrap();
    fs::write(chunk.join("RC_C2T.sam"), sam("n2", 0, "chr1", 21, "10M", 0)).unwrap();
    fs::write(
        chunk.join("reads.fq"),
        fastq(&[("n2", "GGACTTGCAT"), ("n1", "ATGGATTGAA")]),
    )
    .unwrap();

    let shared = SharedData::load(&genome, None, None, None).unwrap();
    let mut out = Vec::new();
    let stats = process_chunk(&chunk, &shared, &ReconcileConfig::non_directional(), &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("n1\t0\tchr1\t3\t"));
    assert!(lines[0].ends_with("XR:Z:CT\tXG:Z:CT"));
    assert!(lines[1].starts_with("n2\t0\tchr1\t21\t"));
    assert!(lines[1].ends_with("XR:Z:GA\tXG:Z:GA"));
    assert_eq!(stats.retained, 2);
    assert_eq!(stats.total_dropped(), 0);

    fs::remove_file(chunk.join("FW_G2A.sam")).unwrap();
    let mut out = Vec::new();
    assert!(process_chunk(&chunk, &shared, &ReconcileConfig::non_directional(), &mut out).is_err());
}

#[test]
fn threaded_run_merges_chunks_in_order() {
    let tmp = TempDir::new().unwrap();
    let genome = write_genome(tmp.path());
    let chunks: Vec<PathBuf> = (0..3).map(|i| tmp.path().join(format!("chunk-{i}"))).collect();
    for chunk in &chunks {
        write_chunk(chunk);
    }
    // Make the middle chunk distinguishable.
    fs::write(
        chunks[1].join("reads.fq"),
        fastq(&[("r1", "ATGGATTGAA"), ("r2", "ATGGATTGAA")]),
    )
    .unwrap();

    let out_dir = tmp.path().join("out");
    let shared = SharedData::load(&genome, None, None, None).unwrap();
    let stats = pipeline::run(&chunks, &out_dir, &shared, &ReconcileConfig::default(), 2).unwrap();

    let merged = fs::read_to_string(out_dir.join(ALIGNMENTS_FILE)).unwrap();
    let names: Vec<&str> = merged.lines().map(|l| l.split('\t').next().unwrap()).collect();
    assert_eq!(names, ["r1", "r3", "r1", "r1", "r3"]);

    assert_eq!(stats.retained, 5);
    assert_eq!(stats.dropped(DropReason::Ambiguous), 3);
    assert_eq!(stats.dropped(DropReason::Malformed), 1);

    let leftovers: Vec<_> = fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, [ALIGNMENTS_FILE]);
}

#[test]
fn binary_writes_merged_output() {
    let tmp = TempDir::new().unwrap();
    let genome = write_genome(tmp.path());
    let chunk = tmp.path().join("chunk-0");
    write_chunk(&chunk);
    let out_dir = tmp.path().join("out");

    let status = Command::new(env!("CARGO_BIN_EXE_bsmerge-rs"))
        .arg(&chunk)
        .arg("-g")
        .arg(&genome)
        .arg("-o")
        .arg(&out_dir)
        .arg("-M")
        .arg("-q")
        .status()
        .unwrap();
    assert!(status.success());

    let merged = fs::read_to_string(out_dir.join(ALIGNMENTS_FILE)).unwrap();
    assert_eq!(merged.lines().count(), 2);
    assert!(merged.contains("XM:Z:-z----z---"));
}

#[test]
fn binary_rejects_rrbs_without_fragments() {
    let tmp = TempDir::new().unwrap();
    let genome = write_genome(tmp.path());

    let status = Command::new(env!("CARGO_BIN_EXE_bsmerge-rs"))
        .arg(tmp.path())
        .arg("-g")
        .arg(&genome)
        .arg("-o")
        .arg(tmp.path().join("out"))
        .arg("--rrbs")
        .arg("-q")
        .status()
        .unwrap();
    assert!(!status.success());
}
