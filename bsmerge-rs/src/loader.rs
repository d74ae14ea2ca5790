//! Loading of one conversion strand's aligner output.
//!
//! Each strand file is SAM-like text. For every mapped line a record is kept
//! per read together with a histogram of how many hits the read has at each
//! edit distance; the resolver compares those histograms across strands.

use crate::cigar::{Cigar, CigarError};
use crate::config::ReconcileConfig;
use crate::reads::normalize_read_name;
use crate::score::ScoringScheme;
use crate::strand::{ConversionStrand, Library};
use crate::types::{EditDistance, HashMap, Score};
use anyhow::{Context, Result, bail};
use noodles::sam::alignment::record::Flags;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Mandatory SAM columns before the optional tags.
const MANDATORY_FIELDS: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("expected at least 11 fields, found {0}")]
    MissingField(usize),
    #[error("invalid flag '{0}'")]
    InvalidFlag(String),
    #[error("invalid position '{0}'")]
    InvalidPosition(String),
    #[error("invalid CIGAR: {0}")]
    InvalidCigar(#[from] CigarError),
    #[error("missing NM tag")]
    MissingEditDistance,
    #[error("invalid NM tag '{0}'")]
    InvalidEditDistance(String),
    #[error("invalid XA entry '{0}'")]
    InvalidMultiHit(String),
}

/// Anything the resolver can rank.
pub trait Candidate {
    fn edit_distance(&self) -> EditDistance;
    fn score(&self) -> Score;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub read_name: String,
    pub target: String,
    /// 1-based leftmost position.
    pub position: u32,
    /// Bit 0x10 of the aligner's flag.
    pub reverse: bool,
    pub strand: ConversionStrand,
    pub cigar: Cigar,
    pub edit_distance: EditDistance,
    pub score: Score,
}

impl Candidate for AlignmentRecord {
    fn edit_distance(&self) -> EditDistance {
        self.edit_distance
    }

    fn score(&self) -> Score {
        self.score
    }
}

/// One mate of a paired hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MateHit {
    pub target: String,
    pub position: u32,
    pub reverse: bool,
    pub cigar: Cigar,
    pub edit_distance: EditDistance,
    pub score: Score,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedAlignmentRecord {
    pub read_name: String,
    pub mates: [MateHit; 2],
    pub strand: ConversionStrand,
    /// Larger of the two mate edit distances.
    pub edit_distance: EditDistance,
    /// Larger of the two mate scores.
    pub score: Score,
}

impl Candidate for PairedAlignmentRecord {
    fn edit_distance(&self) -> EditDistance {
        self.edit_distance
    }

    fn score(&self) -> Score {
        self.score
    }
}

/// All hits of one read on one strand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadAlignments<A> {
    pub records: Vec<A>,
    /// `histogram[d]` = number of hits at edit distance `d`.
    pub histogram: Vec<u32>,
}

impl<A: Candidate> ReadAlignments<A> {
    pub fn new(max_edit_distance: EditDistance) -> Self {
        Self {
            records: Vec::new(),
            histogram: vec![0; max_edit_distance as usize + 1],
        }
    }

    pub fn push(&mut self, record: A) {
        let ed = record.edit_distance() as usize;
        if ed >= self.histogram.len() {
            self.histogram.resize(ed + 1, 0);
        }
        self.histogram[ed] += 1;
        self.records.push(record);
    }

    pub fn count_at(&self, edit_distance: EditDistance) -> u32 {
        self.histogram
            .get(edit_distance as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Lowest edit distance with at least one hit.
    pub fn best_edit_distance(&self) -> Option<EditDistance> {
        self.histogram
            .iter()
            .position(|&n| n > 0)
            .map(|d| d as EditDistance)
    }

    /// Highest score among hits at exactly `edit_distance`.
    pub fn best_score_at(&self, edit_distance: EditDistance) -> Option<Score> {
        self.records
            .iter()
            .filter(|r| r.edit_distance() == edit_distance)
            .map(Candidate::score)
            .max()
    }

    pub fn first(&self) -> Option<&A> {
        self.records.first()
    }
}

/// Hits of every read on one conversion strand.
#[derive(Debug, Clone)]
pub struct PerReadAlignmentSet<A> {
    pub strand: ConversionStrand,
    reads: HashMap<String, ReadAlignments<A>>,
}

impl<A> PerReadAlignmentSet<A> {
    pub fn new(strand: ConversionStrand) -> Self {
        Self {
            strand,
            reads: HashMap::default(),
        }
    }

    pub fn from_reads(strand: ConversionStrand, reads: HashMap<String, ReadAlignments<A>>) -> Self {
        Self { strand, reads }
    }

    pub fn get(&self, read_name: &str) -> Option<&ReadAlignments<A>> {
        self.reads.get(read_name)
    }

    pub fn contains(&self, read_name: &str) -> bool {
        self.reads.contains_key(read_name)
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    pub fn read_names(&self) -> impl Iterator<Item = &str> {
        self.reads.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReadAlignments<A>)> {
        self.reads.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Rebuild the set, passing every read through `f`; reads for which `f`
    /// returns `None` are left out of the new set.
    pub fn filter_map<F>(self, mut f: F) -> Self
    where
        F: FnMut(&str, ReadAlignments<A>) -> Option<ReadAlignments<A>>,
    {
        let reads = self
            .reads
            .into_iter()
            .filter_map(|(name, alignments)| f(&name, alignments).map(|a| (name, a)))
            .collect();
        Self {
            strand: self.strand,
            reads,
        }
    }
}

impl<A: Candidate> PerReadAlignmentSet<A> {
    pub fn insert(&mut self, read_name: &str, record: A, max_edit_distance: EditDistance) {
        self.reads
            .entry(read_name.to_string())
            .or_insert_with(|| ReadAlignments::new(max_edit_distance))
            .push(record);
    }
}

/// The strand sets of one chunk: two for a directional library, four for a
/// non-directional one, in canonical strand order.
#[derive(Debug, Clone)]
pub struct StrandCollection<A> {
    pub library: Library,
    sets: Vec<PerReadAlignmentSet<A>>,
}

impl<A> StrandCollection<A> {
    pub fn new(library: Library, sets: Vec<PerReadAlignmentSet<A>>) -> Result<Self> {
        let expected = library.strands();
        if sets.len() != expected.len() {
            bail!(
                "{} library needs {} strand sets, got {}",
                library,
                expected.len(),
                sets.len()
            );
        }
        for (set, strand) in sets.iter().zip(expected) {
            if set.strand != *strand {
                bail!("strand set {} found where {} was expected", set.strand, strand);
            }
        }
        Ok(Self { library, sets })
    }

    /// Reassemble sets taken apart with [`StrandCollection::into_sets`].
    pub(crate) fn from_parts(library: Library, sets: Vec<PerReadAlignmentSet<A>>) -> Self {
        Self { library, sets }
    }

    pub fn sets(&self) -> &[PerReadAlignmentSet<A>] {
        &self.sets
    }

    pub fn get(&self, strand: ConversionStrand) -> Option<&PerReadAlignmentSet<A>> {
        self.sets.iter().find(|set| set.strand == strand)
    }

    pub fn into_sets(self) -> Vec<PerReadAlignmentSet<A>> {
        self.sets
    }
}

/// Line counters of one strand file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub lines: u64,
    pub unmapped: u64,
    pub malformed: u64,
    pub over_limit: u64,
    pub records: u64,
}

impl LoadStats {
    pub fn merge(&mut self, other: &LoadStats) {
        self.lines += other.lines;
        self.unmapped += other.unmapped;
        self.malformed += other.malformed;
        self.over_limit += other.over_limit;
        self.records += other.records;
    }
}

#[derive(Debug)]
struct ParsedLine<'a> {
    name: &'a str,
    hit: Option<MappedHit<'a>>,
}

#[derive(Debug)]
struct MappedHit<'a> {
    target: &'a str,
    position: u32,
    reverse: bool,
    cigar: Cigar,
    edit_distance: EditDistance,
    multi_hits: Option<&'a str>,
}

fn parse_line(line: &str) -> Result<ParsedLine<'_>, LineError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MANDATORY_FIELDS {
        return Err(LineError::MissingField(fields.len()));
    }

    let name = normalize_read_name(fields[0]);
    let flags = fields[1]
        .parse::<u16>()
        .map(Flags::from)
        .map_err(|_| LineError::InvalidFlag(fields[1].to_string()))?;

    if flags.is_unmapped() || fields[2] == "*" || fields[5] == "*" {
        return Ok(ParsedLine { name, hit: None });
    }

    let position = fields[3]
        .parse::<u32>()
        .ok()
        .filter(|&p| p > 0)
        .ok_or_else(|| LineError::InvalidPosition(fields[3].to_string()))?;
    let cigar = Cigar::parse(fields[5])?;

    let tags = &fields[MANDATORY_FIELDS..];
    let nm = tags
        .iter()
        .find_map(|tag| tag.strip_prefix("NM:i:"))
        .ok_or(LineError::MissingEditDistance)?;
    let edit_distance = nm
        .parse::<EditDistance>()
        .map_err(|_| LineError::InvalidEditDistance(nm.to_string()))?;
    let multi_hits = tags.last().and_then(|tag| tag.strip_prefix("XA:Z:"));

    Ok(ParsedLine {
        name,
        hit: Some(MappedHit {
            target: fields[2],
            position,
            reverse: flags.is_reverse_complemented(),
            cigar,
            edit_distance,
            multi_hits,
        }),
    })
}

/// Split an `XA:Z:` payload into `(target, position, cigar)` entries.
/// Positions may carry a `+`/`-` strand prefix, which is ignored.
fn parse_multi_hits(payload: &str) -> Vec<Result<(&str, u32, Cigar), LineError>> {
    payload
        .split(';')
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.split(',');
            let (Some(target), Some(pos), Some(cigar)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(LineError::InvalidMultiHit(entry.to_string()));
            };
            let position = pos
                .trim_start_matches(['+', '-'])
                .parse::<u32>()
                .ok()
                .filter(|&p| p > 0)
                .ok_or_else(|| LineError::InvalidMultiHit(entry.to_string()))?;
            Ok((target, position, Cigar::parse(cigar)?))
        })
        .collect()
}

fn read_lines<R: BufRead>(reader: R) -> impl Iterator<Item = Result<String>> {
    reader.lines().filter_map(|line| match line {
        Ok(line) if line.is_empty() || line.starts_with('@') => None,
        Ok(line) => Some(Ok(line)),
        Err(e) => Some(Err(anyhow::Error::new(e).context("failed to read alignment line"))),
    })
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open alignment file {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Load single-end hits of one strand.
pub fn load_single<R: BufRead>(
    reader: R,
    strand: ConversionStrand,
    config: &ReconcileConfig,
) -> Result<(PerReadAlignmentSet<AlignmentRecord>, LoadStats)> {
    let max = config.max_mismatches;
    let scoring = &config.scoring;
    let mut set = PerReadAlignmentSet::new(strand);
    let mut stats = LoadStats::default();

    for line in read_lines(reader) {
        let line = line?;
        stats.lines += 1;

        let parsed = match parse_line(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                stats.malformed += 1;
                tracing::debug!(strand = %strand, error = %e, "skipping malformed alignment line");
                continue;
            }
        };
        let Some(hit) = parsed.hit else {
            stats.unmapped += 1;
            continue;
        };
        if hit.edit_distance > max {
            stats.over_limit += 1;
            continue;
        }

        let record = AlignmentRecord {
            read_name: parsed.name.to_string(),
            target: hit.target.to_string(),
            position: hit.position,
            reverse: hit.reverse,
            strand,
            score: scoring.score(&hit.cigar, hit.edit_distance),
            cigar: hit.cigar,
            edit_distance: hit.edit_distance,
        };
        set.insert(parsed.name, record, max);
        stats.records += 1;

        if config.all_valid
            && let Some(payload) = hit.multi_hits
        {
            for sub_hit in parse_multi_hits(payload) {
                match sub_hit {
                    Ok((target, position, cigar)) => {
                        let record = AlignmentRecord {
                            read_name: parsed.name.to_string(),
                            target: target.to_string(),
                            position,
                            reverse: hit.reverse,
                            strand,
                            score: scoring.score(&cigar, hit.edit_distance),
                            cigar,
                            edit_distance: hit.edit_distance,
                        };
                        set.insert(parsed.name, record, max);
                        stats.records += 1;
                    }
                    Err(e) => {
                        stats.malformed += 1;
                        tracing::debug!(strand = %strand, read = parsed.name, error = %e, "skipping XA sub-hit");
                    }
                }
            }
        }
    }

    Ok((set, stats))
}

fn mate_hit(hit: MappedHit<'_>, scoring: &ScoringScheme) -> MateHit {
    MateHit {
        target: hit.target.to_string(),
        position: hit.position,
        reverse: hit.reverse,
        score: scoring.score(&hit.cigar, hit.edit_distance),
        cigar: hit.cigar,
        edit_distance: hit.edit_distance,
    }
}

/// Load paired-end hits of one strand. Both mates of a pair are expected on
/// consecutive lines under the same read name.
pub fn load_paired<R: BufRead>(
    reader: R,
    strand: ConversionStrand,
    config: &ReconcileConfig,
) -> Result<(PerReadAlignmentSet<PairedAlignmentRecord>, LoadStats)> {
    let max = config.max_mismatches;
    let mut set = PerReadAlignmentSet::new(strand);
    let mut stats = LoadStats::default();
    let mut pending: Option<(String, Option<MateHit>)> = None;

    for line in read_lines(reader) {
        let line = line?;
        stats.lines += 1;

        let parsed = match parse_line(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                stats.malformed += 1;
                tracing::debug!(strand = %strand, error = %e, "skipping malformed alignment line");
                continue;
            }
        };
        let mate = parsed.hit.map(|hit| mate_hit(hit, &config.scoring));

        let (name, first) = match pending.take() {
            Some((name, first)) if name == parsed.name => (name, first),
            Some((orphan, ..)) => {
                stats.malformed += 1;
                tracing::debug!(strand = %strand, read = %orphan, "mate line without a partner");
                pending = Some((parsed.name.to_string(), mate));
                continue;
            }
            None => {
                pending = Some((parsed.name.to_string(), mate));
                continue;
            }
        };

        let (Some(first), Some(second)) = (first, mate) else {
            stats.unmapped += 1;
            continue;
        };

        let edit_distance = first.edit_distance.max(second.edit_distance);
        if edit_distance > max {
            stats.over_limit += 1;
            continue;
        }
        let record = PairedAlignmentRecord {
            read_name: name.clone(),
            strand,
            edit_distance,
            score: first.score.max(second.score),
            mates: [first, second],
        };
        set.insert(&name, record, max);
        stats.records += 1;
    }

    if let Some((orphan, ..)) = pending {
        stats.malformed += 1;
        tracing::debug!(strand = %strand, read = %orphan, "mate line without a partner");
    }

    Ok((set, stats))
}

pub fn load_single_path(
    path: &Path,
    strand: ConversionStrand,
    config: &ReconcileConfig,
) -> Result<(PerReadAlignmentSet<AlignmentRecord>, LoadStats)> {
    load_single(open(path)?, strand, config)
        .with_context(|| format!("failed to load {}", path.display()))
}

pub fn load_paired_path(
    path: &Path,
    strand: ConversionStrand,
    config: &ReconcileConfig,
) -> Result<(PerReadAlignmentSet<PairedAlignmentRecord>, LoadStats)> {
    load_paired(open(path)?, strand, config)
        .with_context(|| format!("failed to load {}", path.display()))
}
