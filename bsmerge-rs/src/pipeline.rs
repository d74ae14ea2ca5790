use crate::annotate::{AnnotationContext, annotate_pair, annotate_single};
use crate::config::ReconcileConfig;
use crate::emit::write_alignment;
use crate::fragments::FragmentIndex;
use crate::loader::{
    AlignmentRecord, LoadStats, PairedAlignmentRecord, StrandCollection, load_paired_path,
    load_single_path,
};
use crate::outcome::{ChunkStats, DropReason};
use crate::reads::ReadStore;
use crate::reference::{ReferenceNames, ReferenceStore};
use crate::resolve::resolve;
use crate::strand::ConversionStrand;
use anyhow::{Context, Result};
use crossfire::mpmc;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;

/// Name of the merged output inside the output directory.
pub const ALIGNMENTS_FILE: &str = "alignments.txt";

const READ_EXTENSIONS: [&str; 8] = [
    "fq", "fastq", "fa", "fasta", "fq.gz", "fastq.gz", "fa.gz", "fasta.gz",
];

/// Reference data loaded once and shared read-only by every chunk.
#[derive(Debug, Default)]
pub struct SharedData {
    pub reference: ReferenceStore,
    pub names: ReferenceNames,
    pub fragments: Option<FragmentIndex>,
}

impl SharedData {
    pub fn load(
        genome: &Path,
        genome_rc: Option<&Path>,
        names: Option<&Path>,
        fragments: Option<&Path>,
    ) -> Result<Self> {
        let reference = match genome_rc {
            Some(rc) => ReferenceStore::load_halves(genome, rc)?,
            None => ReferenceStore::load(genome)?,
        };
        let names = match names {
            Some(path) => ReferenceNames::load(path)?,
            None => ReferenceNames::default(),
        };
        let fragments = fragments.map(FragmentIndex::load).transpose()?;

        tracing::info!(
            targets = reference.len(),
            fragment_index = fragments.is_some(),
            "reference loaded"
        );
        Ok(Self {
            reference,
            names,
            fragments,
        })
    }

    pub fn context<'a>(&'a self, config: &'a ReconcileConfig) -> AnnotationContext<'a> {
        AnnotationContext {
            config,
            reference: &self.reference,
            fragments: self.fragments.as_ref(),
        }
    }
}

/// Locate `<stem>.<ext>` among the supported read file extensions.
fn find_reads(dir: &Path, stem: &str) -> Result<PathBuf> {
    READ_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|path| path.is_file())
        .with_context(|| format!("no {stem}.fq/.fastq/.fa/.fasta[.gz] in {}", dir.display()))
}

fn record_missing(strand: ConversionStrand, in_set: usize, seen: usize, stats: &mut ChunkStats) {
    let missing = in_set.saturating_sub(seen);
    if missing > 0 {
        tracing::debug!(strand = %strand, missing, "aligned reads absent from the read file");
        for _ in 0..missing {
            stats.record_dropped(DropReason::Malformed);
        }
    }
}

/// Resolve, annotate and write the single-end hits of one chunk. Output
/// follows strand order, then read file order.
pub fn reconcile_single<W: Write>(
    collection: StrandCollection<AlignmentRecord>,
    reads: &ReadStore,
    ctx: &AnnotationContext<'_>,
    names: &ReferenceNames,
    out: &mut W,
) -> io::Result<ChunkStats> {
    let mut stats = ChunkStats::default();
    let resolved = resolve(collection, ctx.config.keep_ambiguous);
    for _ in &resolved.ambiguous {
        stats.record_dropped(DropReason::Ambiguous);
    }

    for set in resolved.collection.sets() {
        let mut seen = 0usize;
        for name in reads.names() {
            let Some(record) = set.get(name).and_then(|a| a.first()) else {
                continue;
            };
            let Some(raw) = reads.get(name) else {
                continue;
            };
            seen += 1;
            match annotate_single(ctx, record, raw) {
                Ok(retained) => {
                    write_alignment(out, &retained, names)?;
                    stats.record_retained(retained.mismatches());
                }
                Err(reason) => {
                    tracing::debug!(read = name, strand = %set.strand, %reason, "read dropped");
                    stats.record_dropped(reason);
                }
            }
        }
        record_missing(set.strand, set.len(), seen, &mut stats);
    }

    Ok(stats)
}

/// Paired-end counterpart of [`reconcile_single`]; `reads` holds mate 1 and
/// mate 2 files.
pub fn reconcile_paired<W: Write>(
    collection: StrandCollection<PairedAlignmentRecord>,
    reads: [&ReadStore; 2],
    ctx: &AnnotationContext<'_>,
    names: &ReferenceNames,
    out: &mut W,
) -> io::Result<ChunkStats> {
    let mut stats = ChunkStats::default();
    let resolved = resolve(collection, ctx.config.keep_ambiguous);
    for _ in &resolved.ambiguous {
        stats.record_dropped(DropReason::Ambiguous);
    }

    for set in resolved.collection.sets() {
        let mut seen = 0usize;
        for name in reads[0].names() {
            let Some(record) = set.get(name).and_then(|a| a.first()) else {
                continue;
            };
            let (Some(raw1), Some(raw2)) = (reads[0].get(name), reads[1].get(name)) else {
                continue;
            };
            seen += 1;
            match annotate_pair(ctx, record, [raw1, raw2]) {
                Ok(retained) => {
                    write_alignment(out, &retained, names)?;
                    stats.record_retained(retained.mismatches());
                }
                Err(reason) => {
                    tracing::debug!(read = name, strand = %set.strand, %reason, "pair dropped");
                    stats.record_dropped(reason);
                }
            }
        }
        record_missing(set.strand, set.len(), seen, &mut stats);
    }

    Ok(stats)
}

/// Run one chunk directory end to end, writing its records to `out`.
pub fn process_chunk<W: Write>(
    dir: &Path,
    shared: &SharedData,
    config: &ReconcileConfig,
    out: &mut W,
) -> Result<ChunkStats> {
    let ctx = shared.context(config);
    let strands = config.library.strands();

    let stats = if config.paired {
        let reads1 = ReadStore::load(&find_reads(dir, "reads_1")?)?;
        let reads2 = ReadStore::load(&find_reads(dir, "reads_2")?)?;
        let mut load = LoadStats::default();
        let mut sets = Vec::with_capacity(strands.len());
        for &strand in strands {
            let (set, s) = load_paired_path(&dir.join(strand.file_name()), strand, config)?;
            load.merge(&s);
            sets.push(set);
        }
        let collection = StrandCollection::new(config.library, sets)?;
        let mut stats = reconcile_paired(collection, [&reads1, &reads2], &ctx, &shared.names, out)
            .with_context(|| format!("failed to write output of {}", dir.display()))?;
        stats.load = load;
        stats
    } else {
        let reads = ReadStore::load(&find_reads(dir, "reads")?)?;
        let mut load = LoadStats::default();
        let mut sets = Vec::with_capacity(strands.len());
        for &strand in strands {
            let (set, s) = load_single_path(&dir.join(strand.file_name()), strand, config)?;
            load.merge(&s);
            sets.push(set);
        }
        let collection = StrandCollection::new(config.library, sets)?;
        let mut stats = reconcile_single(collection, &reads, &ctx, &shared.names, out)
            .with_context(|| format!("failed to write output of {}", dir.display()))?;
        stats.load = load;
        stats
    };

    tracing::info!(
        chunk = %dir.display(),
        lines = stats.load.lines,
        retained = stats.retained,
        dropped = stats.total_dropped(),
        "chunk processed"
    );
    Ok(stats)
}

fn part_path(out_dir: &Path, idx: usize) -> PathBuf {
    out_dir.join(format!("alignments-{idx}.txt"))
}

fn process_chunk_to_part(
    dir: &Path,
    part: &Path,
    shared: &SharedData,
    config: &ReconcileConfig,
) -> Result<ChunkStats> {
    let file = File::create(part)
        .with_context(|| format!("failed to create {}", part.display()))?;
    let mut writer = BufWriter::new(file);
    let stats = process_chunk(dir, shared, config, &mut writer)?;
    writer.flush()?;
    Ok(stats)
}

struct WorkItem {
    idx: usize,
    dir: PathBuf,
}

struct ResultItem {
    idx: usize,
    result: Result<ChunkStats>,
}

/// Concatenate part files in chunk order into the merged output and remove them.
fn merge_parts(out_dir: &Path, count: usize) -> Result<PathBuf> {
    let merged = out_dir.join(ALIGNMENTS_FILE);
    let file = File::create(&merged)
        .with_context(|| format!("failed to create {}", merged.display()))?;
    let mut writer = BufWriter::new(file);
    for idx in 0..count {
        let part = part_path(out_dir, idx);
        let mut reader = File::open(&part)
            .with_context(|| format!("failed to open {}", part.display()))?;
        io::copy(&mut reader, &mut writer)?;
        fs::remove_file(&part)?;
    }
    writer.flush()?;
    Ok(merged)
}

/// Process every chunk directory and merge their outputs into
/// `<out_dir>/alignments.txt`. With `threads > 1` chunks run on a worker pool;
/// each chunk is still handled by a single thread.
pub fn run(
    chunks: &[PathBuf],
    out_dir: &Path,
    shared: &SharedData,
    config: &ReconcileConfig,
    threads: usize,
) -> Result<ChunkStats> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let mut stats = ChunkStats::default();

    if threads > 1 && chunks.len() > 1 {
        crossfire::detect_backoff_cfg();
        let worker_count = threads.min(chunks.len());
        let cap = worker_count.saturating_mul(4).max(8);
        let (tx_work, rx_work) = mpmc::bounded_blocking::<WorkItem>(cap);
        let (tx_res, rx_res) = mpmc::unbounded_blocking::<ResultItem>();

        thread::scope(|scope| -> Result<()> {
            for _ in 0..worker_count {
                let rx_work = rx_work.clone();
                let tx_res = tx_res.clone();
                scope.spawn(move || {
                    while let Ok(item) = rx_work.recv() {
                        let part = part_path(out_dir, item.idx);
                        let result = process_chunk_to_part(&item.dir, &part, shared, config);
                        let _ = tx_res.send(ResultItem {
                            idx: item.idx,
                            result,
                        });
                    }
                });
            }
            drop(tx_res);

            for (idx, dir) in chunks.iter().enumerate() {
                tx_work
                    .send(WorkItem {
                        idx,
                        dir: dir.clone(),
                    })
                    .map_err(|_| anyhow::anyhow!("chunk work channel closed"))?;
            }
            drop(tx_work);

            let mut pending: BTreeMap<usize, Result<ChunkStats>> = BTreeMap::new();
            let mut next_idx = 0usize;
            while next_idx < chunks.len() {
                let res = rx_res
                    .recv()
                    .map_err(|_| anyhow::anyhow!("worker result channel closed"))?;
                pending.insert(res.idx, res.result);
                while let Some(result) = pending.remove(&next_idx) {
                    stats.merge(&result?);
                    next_idx += 1;
                }
            }

            Ok(())
        })?;
    } else {
        for (idx, dir) in chunks.iter().enumerate() {
            let part = part_path(out_dir, idx);
            stats.merge(&process_chunk_to_part(dir, &part, shared, config)?);
        }
    }

    let merged = merge_parts(out_dir, chunks.len())?;
    tracing::info!(output = %merged.display(), chunks = chunks.len(), "outputs merged");
    Ok(stats)
}
