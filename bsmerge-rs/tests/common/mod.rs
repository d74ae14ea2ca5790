#![allow(dead_code)]

use bsmerge_rs::loader::{AlignmentRecord, PerReadAlignmentSet, load_single};
use bsmerge_rs::{ConversionStrand, ReconcileConfig};

/// 40 bp test contig.
pub const GENOME: &str = "TTACGGATCGAACGTTCAGCATGCAAGTCCGATGCATCGA";

/// Single-end SAM line with an NM tag.
pub fn sam(name: &str, flag: u16, target: &str, pos: u32, cigar: &str, nm: u32) -> String {
    format!("{name}\t{flag}\t{target}\t{pos}\t255\t{cigar}\t*\t0\t0\t*\t*\tNM:i:{nm}\n")
}

/// Paired-end SAM line carrying a template length.
pub fn sam_mate(name: &str, target: &str, pos: u32, cigar: &str, tlen: i64, nm: u32) -> String {
    format!("{name}\t0\t{target}\t{pos}\t255\t{cigar}\t=\t0\t{tlen}\t*\t*\tNM:i:{nm}\n")
}

pub fn single_set(
    strand: ConversionStrand,
    lines: &[String],
    config: &ReconcileConfig,
) -> PerReadAlignmentSet<AlignmentRecord> {
    let text = lines.concat();
    load_single(text.as_bytes(), strand, config).unwrap().0
}

pub fn fastq(records: &[(&str, &str)]) -> String {
    records
        .iter()
        .map(|(name, seq)| format!("@{name}\n{seq}\n+\n{}\n", "I".repeat(seq.len())))
        .collect()
}
