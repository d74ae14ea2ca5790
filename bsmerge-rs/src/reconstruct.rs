use crate::cigar::Cigar;
use crate::reference::ReferenceWindow;
use crate::strand::Orientation;
use noodles::sam::alignment::record::cigar::op::Kind as CigarKind;
use thiserror::Error;

/// Column filler for bases missing on one side of an alignment.
pub const GAP: u8 = b'-';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconstructError {
    #[error("CIGAR consumes {cigar} read bases but the read has {read}")]
    ReadLength { cigar: u32, read: usize },
    #[error("CIGAR runs past the reference window")]
    ReferenceExhausted,
}

/// Read and reference replayed column by column through a CIGAR.
///
/// The stored strings still contain the soft-clip columns; the trimmed
/// views expose only the aligned part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    read: Vec<u8>,
    reference: Vec<u8>,
    read_lead: usize,
    reference_lead: usize,
    trail: usize,
    pub leading_clip: u32,
    pub trailing_clip: u32,
    pub insertions: u32,
    pub deletions: u32,
}

impl Reconstruction {
    /// Read side including clipped columns.
    pub fn full_read(&self) -> &[u8] {
        &self.read
    }

    pub fn full_reference(&self) -> &[u8] {
        &self.reference
    }

    pub fn aligned_read(&self) -> &[u8] {
        trim(&self.read, self.read_lead, self.trail)
    }

    pub fn aligned_reference(&self) -> &[u8] {
        trim(&self.reference, self.reference_lead, self.trail)
    }

    /// Number of aligned columns, gaps included.
    pub fn aligned_len(&self) -> usize {
        self.aligned_read().len()
    }
}

fn trim(s: &[u8], lead: usize, trail: usize) -> &[u8] {
    let end = s.len().saturating_sub(trail);
    s.get(lead..end).unwrap_or(&[])
}

/// Replay `cigar` over `read` (already oriented for its strand) and the core
/// of `window`.
///
/// A leading soft clip moves the reference cursor only for forward
/// orientation: the aligner reports reverse-strand positions after the clip.
pub fn reconstruct(
    read: &[u8],
    window: &ReferenceWindow,
    cigar: &Cigar,
    orientation: Orientation,
) -> Result<Reconstruction, ReconstructError> {
    let consumed = cigar.read_len();
    if consumed as usize != read.len() {
        return Err(ReconstructError::ReadLength {
            cigar: consumed,
            read: read.len(),
        });
    }

    let reference = window.core();
    let mut out = Reconstruction {
        read: Vec::with_capacity(read.len()),
        reference: Vec::with_capacity(read.len()),
        read_lead: 0,
        reference_lead: 0,
        trail: 0,
        leading_clip: 0,
        trailing_clip: 0,
        insertions: 0,
        deletions: 0,
    };

    let mut r = 0usize;
    let mut g = 0usize;
    let ref_slice = |start: usize, len: usize| {
        reference
            .get(start..start + len)
            .ok_or(ReconstructError::ReferenceExhausted)
    };

    let ops = cigar.ops();
    for (i, op) in ops.iter().enumerate() {
        let n = op.len();
        match op.kind() {
            CigarKind::Match | CigarKind::SequenceMatch | CigarKind::SequenceMismatch => {
                out.read.extend_from_slice(&read[r..r + n]);
                out.reference.extend_from_slice(ref_slice(g, n)?);
                r += n;
                g += n;
            }
            CigarKind::Insertion => {
                out.read.extend_from_slice(&read[r..r + n]);
                out.reference.extend(std::iter::repeat_n(GAP, n));
                r += n;
                out.insertions += n as u32;
            }
            CigarKind::Deletion | CigarKind::Skip => {
                out.read.extend(std::iter::repeat_n(GAP, n));
                out.reference.extend_from_slice(ref_slice(g, n)?);
                g += n;
                out.deletions += n as u32;
            }
            CigarKind::SoftClip if cigar.is_trailing_clip(i) => {
                out.read.extend_from_slice(&read[r..r + n]);
                out.reference.extend_from_slice(ref_slice(g, n)?);
                r += n;
                g += n;
                out.trailing_clip += n as u32;
                out.trail += n;
            }
            CigarKind::SoftClip => {
                out.read.extend_from_slice(&read[r..r + n]);
                r += n;
                out.read_lead += n;
                if orientation == Orientation::Forward {
                    out.reference.extend_from_slice(ref_slice(g, n)?);
                    g += n;
                    out.reference_lead += n;
                }
                out.leading_clip += n as u32;
            }
            CigarKind::HardClip | CigarKind::Pad => {}
        }
    }

    Ok(out)
}
