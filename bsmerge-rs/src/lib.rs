//! bsmerge-rs: reconcile bisulfite alignments made against converted genomes.
//!
//! Reads from a bisulfite library are aligned once per in-silico conversion
//! strand. This crate merges those per-strand outputs into at most one
//! methylation-annotated alignment per read (or read pair).
//!
//! # Library usage
//!
//! ```no_run
//! use bsmerge_rs::{ReconcileConfig, pipeline::{SharedData, process_chunk}};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ReconcileConfig { methylation: true, ..ReconcileConfig::default() };
//! let shared = SharedData::load(Path::new("genome.fa"), None, None, None)?;
//! let mut out = Vec::new();
//! let stats = process_chunk(Path::new("chunk-0"), &shared, &config, &mut out)?;
//! println!("{} reads retained", stats.retained);
//! # Ok(())
//! # }
//! ```

pub mod annotate;
pub mod cigar;
pub mod cli;
pub mod config;
pub mod emit;
pub mod fragments;
pub mod loader;
pub mod methylation;
pub mod mismatch;
pub mod outcome;
pub mod pipeline;
pub mod reads;
pub mod reconstruct;
pub mod reference;
pub mod resolve;
pub mod score;
pub mod strand;
pub mod types;

// Flat re-exports for the most commonly used public types.
pub use annotate::{AnnotationContext, RetainedAlignment};
pub use cigar::{Cigar, CigarError};
pub use config::{ReconcileConfig, RrbsConfig};
pub use loader::{AlignmentRecord, PairedAlignmentRecord, PerReadAlignmentSet, StrandCollection};
pub use outcome::{ChunkStats, DropReason};
pub use score::ScoringScheme;
pub use strand::{ConversionStrand, Library, Orientation};
