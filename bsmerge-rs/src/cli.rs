use crate::config::{ReconcileConfig, RrbsConfig};
use crate::score::ScoringScheme;
use crate::strand::Library;
use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bsmerge-rs",
    about = "Reconcile bisulfite-converted alignments into methylation-annotated records",
    version
)]
pub struct Args {
    /// Chunk directories holding one <STRAND>.sam per conversion strand and the raw reads
    #[arg(required = true, value_name = "CHUNK_DIR")]
    pub chunks: Vec<PathBuf>,

    /// Reference genome FASTA (forward halves in RRBS mode)
    #[arg(short = 'g', long = "genome", value_name = "FASTA")]
    pub genome: PathBuf,

    /// RRBS: FASTA with the reverse half of every target
    #[arg(long = "genome-rc", value_name = "FASTA")]
    pub genome_rc: Option<PathBuf>,

    /// Target id to name table (TSV)
    #[arg(long = "names", value_name = "TSV")]
    pub names: Option<PathBuf>,

    /// RRBS: restriction fragment index (TSV)
    #[arg(long = "fragments", value_name = "TSV")]
    pub fragments: Option<PathBuf>,

    /// Output directory
    #[arg(short = 'o', long = "out", value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Reads are paired-end (reads_1 / reads_2)
    #[arg(long)]
    pub paired: bool,

    /// Non-directional library (four conversion strands)
    #[arg(long = "non-directional")]
    pub non_directional: bool,

    /// Maximum mismatches per alignment
    #[arg(short = 'm', long = "mismatches", default_value_t = 5)]
    pub mismatches: u32,

    /// Reduced-representation library
    #[arg(short = 'R', long)]
    pub rrbs: bool,

    /// RRBS restriction site, '-' marks the cut
    #[arg(short = 'd', long = "red-site", default_value = "C-CGG")]
    pub red_site: String,

    /// Report per-base methylation calls (XM tag)
    #[arg(short = 'M', long)]
    pub methylation: bool,

    /// Also consider XA multi-hits (single-end only)
    #[arg(long = "all-valid")]
    pub all_valid: bool,

    /// Keep the first of several equally scored hits instead of dropping the read
    #[arg(short = 'a', long = "ambiguous")]
    pub ambiguous: bool,

    /// Drop soft-clipped alignments
    #[arg(long = "e2e")]
    pub end_to_end: bool,

    #[arg(long = "match-score", default_value_t = 1, allow_hyphen_values = true)]
    pub match_score: i32,

    #[arg(long = "mismatch-score", default_value_t = -2, allow_hyphen_values = true)]
    pub mismatch_score: i32,

    #[arg(long = "gap-open", default_value_t = -3, allow_hyphen_values = true)]
    pub gap_open: i32,

    #[arg(long = "gap-extend", default_value_t = -1, allow_hyphen_values = true)]
    pub gap_extend: i32,

    /// Number of chunks processed concurrently
    #[arg(short = 'p', long = "threads", default_value_t = 1)]
    pub threads: u8,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Args {
    pub fn config(&self) -> Result<ReconcileConfig> {
        let rrbs = if self.rrbs {
            if self.fragments.is_none() {
                bail!("--rrbs requires a fragment index (--fragments)");
            }
            Some(RrbsConfig::new(&self.red_site)?)
        } else {
            if self.genome_rc.is_some() || self.fragments.is_some() {
                tracing::warn!("--genome-rc/--fragments are only used with --rrbs");
            }
            None
        };
        if self.all_valid && self.paired {
            tracing::warn!("--all-valid is ignored for paired-end reads");
        }
        if self.threads == 0 {
            bail!("--threads must be at least 1");
        }

        Ok(ReconcileConfig {
            library: if self.non_directional {
                Library::NonDirectional
            } else {
                Library::Directional
            },
            paired: self.paired,
            max_mismatches: self.mismatches,
            scoring: ScoringScheme {
                match_score: self.match_score,
                mismatch: self.mismatch_score,
                gap_open: self.gap_open,
                gap_extend: self.gap_extend,
            },
            all_valid: self.all_valid && !self.paired,
            keep_ambiguous: self.ambiguous,
            methylation: self.methylation,
            end_to_end: self.end_to_end,
            rrbs,
        })
    }
}
