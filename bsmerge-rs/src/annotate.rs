//! Turn a resolved hit into an emitted alignment: reconstruct it against the
//! reference, recount mismatches under the strand's bisulfite rule, call
//! methylation and, for reduced-representation libraries, place it on its
//! restriction fragment.

use crate::cigar::Cigar;
use crate::config::ReconcileConfig;
use crate::fragments::{FragmentBounds, FragmentIndex};
use crate::loader::{AlignmentRecord, PairedAlignmentRecord};
use crate::methylation::classify_alignment;
use crate::mismatch::count_mismatches;
use crate::outcome::DropReason;
use crate::reconstruct::{Reconstruction, reconstruct};
use crate::reference::ReferenceStore;
use crate::strand::{ConversionStrand, Orientation, reverse_complement};
use crate::types::EditDistance;

/// Read-only inputs shared by every read of a chunk.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationContext<'a> {
    pub config: &'a ReconcileConfig,
    pub reference: &'a ReferenceStore,
    pub fragments: Option<&'a FragmentIndex>,
}

/// One output line worth of data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedHit {
    pub target: String,
    /// Output position; moved to the fragment in reduced-representation mode.
    pub position: u32,
    pub cigar: Cigar,
    pub mismatches: EditDistance,
    pub methylation: Option<String>,
    /// Reference bases under the alignment, without padding.
    pub reference: Vec<u8>,
    pub aligned_len: usize,
}

/// The single alignment (or mate pair) kept for a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedAlignment {
    pub read_name: String,
    pub strand: ConversionStrand,
    /// One hit for single-end reads, two (mate 1, mate 2) for pairs.
    pub hits: Vec<AnnotatedHit>,
    pub fragment: Option<FragmentBounds>,
    pub insert_size: Option<i64>,
}

impl RetainedAlignment {
    /// Worst per-mate mismatch count.
    pub fn mismatches(&self) -> EditDistance {
        self.hits.iter().map(|h| h.mismatches).max().unwrap_or(0)
    }
}

struct Replayed {
    recon: Reconstruction,
    hit: AnnotatedHit,
    read_len: usize,
}

/// Replay one hit. The read is oriented by `read_orientation`; the
/// reference half and the soft-clip convention follow the strand.
fn replay(
    ctx: &AnnotationContext<'_>,
    strand: ConversionStrand,
    raw_read: &[u8],
    read_orientation: Orientation,
    target: &str,
    position: u32,
    cigar: &Cigar,
) -> Result<Replayed, DropReason> {
    let config = ctx.config;
    if config.end_to_end && cigar.has_soft_clip() {
        return Err(DropReason::SoftClipped);
    }

    let orientation = strand.orientation();
    let read = match read_orientation {
        Orientation::Forward => raw_read.to_ascii_uppercase(),
        Orientation::Reverse => reverse_complement(raw_read),
    };

    let contig_len = ctx
        .reference
        .get(target, orientation)
        .map(<[u8]>::len)
        .ok_or(DropReason::Malformed)?;
    if (position as usize).saturating_sub(1) + cigar.reference_len() as usize > contig_len {
        tracing::debug!(contig = target, position, cigar = %cigar, "alignment runs off the reference");
        return Err(DropReason::Malformed);
    }

    let totals = cigar.totals();
    let span = read.len() + totals.deleted as usize + totals.skipped as usize;
    let window = ctx
        .reference
        .window(target, orientation, position, span)
        .ok_or(DropReason::Malformed)?;

    let recon = reconstruct(&read, &window, cigar, orientation).map_err(|e| {
        tracing::debug!(contig = target, position, error = %e, "cannot replay alignment");
        DropReason::Malformed
    })?;

    let mismatches = count_mismatches(
        recon.aligned_read(),
        recon.aligned_reference(),
        strand.tolerated(),
    );
    if mismatches > config.max_mismatches {
        return Err(DropReason::TooManyMismatches);
    }

    let methylation = config
        .methylation
        .then(|| classify_alignment(&read, &window, cigar, orientation));

    let hit = AnnotatedHit {
        target: target.to_string(),
        position,
        cigar: cigar.clone(),
        mismatches,
        methylation,
        reference: window.core().to_vec(),
        aligned_len: recon.aligned_len(),
    };

    Ok(Replayed {
        recon,
        hit,
        read_len: read.len(),
    })
}

fn fragment_lookup(
    ctx: &AnnotationContext<'_>,
    orientation: Orientation,
    target: &str,
    position: u32,
    aligned_len: usize,
) -> Result<FragmentBounds, DropReason> {
    let (Some(rrbs), Some(index)) = (&ctx.config.rrbs, ctx.fragments) else {
        return Err(DropReason::FragmentNotFound);
    };
    let lookup = match orientation {
        Orientation::Forward => Some(position),
        Orientation::Reverse => (position + aligned_len as u32).checked_sub(rrbs.tail_len()),
    };
    lookup
        .and_then(|pos| index.lookup(target, orientation, pos))
        .ok_or(DropReason::FragmentNotFound)
}

pub fn annotate_single(
    ctx: &AnnotationContext<'_>,
    record: &AlignmentRecord,
    raw_read: &[u8],
) -> Result<RetainedAlignment, DropReason> {
    let strand = record.strand;
    let orientation = strand.orientation();
    let mut replayed = replay(
        ctx,
        strand,
        raw_read,
        orientation,
        &record.target,
        record.position,
        &record.cigar,
    )?;

    let mut fragment = None;
    if ctx.config.rrbs.is_some() {
        let aligned_len = replayed.hit.aligned_len;
        let bounds = fragment_lookup(ctx, orientation, &record.target, record.position, aligned_len)?;
        replayed.hit.position = match orientation {
            Orientation::Forward => bounds.start,
            Orientation::Reverse => bounds
                .end
                .checked_sub(aligned_len as u32)
                .ok_or(DropReason::FragmentMismatch)?,
        };
        fragment = Some(bounds);
    }

    Ok(RetainedAlignment {
        read_name: record.read_name.clone(),
        strand,
        hits: vec![replayed.hit],
        fragment,
        insert_size: None,
    })
}

pub fn annotate_pair(
    ctx: &AnnotationContext<'_>,
    record: &PairedAlignmentRecord,
    raw_reads: [&[u8]; 2],
) -> Result<RetainedAlignment, DropReason> {
    let strand = record.strand;
    let [m1, m2] = &record.mates;

    let mut first = replay(
        ctx,
        strand,
        raw_reads[0],
        strand.mate_orientation(0),
        &m1.target,
        m1.position,
        &m1.cigar,
    )?;
    let mut second = replay(
        ctx,
        strand,
        raw_reads[1],
        strand.mate_orientation(1),
        &m2.target,
        m2.position,
        &m2.cigar,
    )?;

    let mut fragment = None;
    if ctx.config.rrbs.is_some() {
        let orientation = strand.orientation();
        let bounds = fragment_lookup(ctx, orientation, &m1.target, m1.position, first.hit.aligned_len)?;

        let (pos1, pos2) = (i64::from(m1.position), i64::from(m2.position));
        let net_indel = |r: &Reconstruction| i64::from(r.insertions) - i64::from(r.deletions);
        let detected = match orientation {
            Orientation::Forward => {
                pos2 - pos1 + second.read_len as i64
                    - net_indel(&second.recon)
                    - i64::from(second.recon.leading_clip)
            }
            Orientation::Reverse => {
                pos1 - pos2 + first.read_len as i64 + 1
                    - i64::from(first.recon.leading_clip)
                    - net_indel(&first.recon)
            }
        };
        if detected != bounds.size() {
            tracing::debug!(
                read = %record.read_name,
                detected,
                expected = bounds.size(),
                "mates disagree on fragment size"
            );
            return Err(DropReason::FragmentMismatch);
        }

        first.hit.position = bounds.start;
        second.hit.position = bounds
            .end
            .checked_sub(second.read_len as u32)
            .ok_or(DropReason::FragmentMismatch)?;
        fragment = Some(bounds);
    }

    let insert_size = i64::from(second.hit.position) + second.hit.aligned_len as i64
        - i64::from(first.hit.position);

    Ok(RetainedAlignment {
        read_name: record.read_name.clone(),
        strand,
        hits: vec![first.hit, second.hit],
        fragment,
        insert_size: Some(insert_size),
    })
}
