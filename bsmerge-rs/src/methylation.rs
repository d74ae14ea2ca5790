//! Per-base methylation calls.
//!
//! | symbol | context | read base |
//! |--------|---------|-----------|
//! | `Z` / `z` | CpG | C / T |
//! | `X` / `x` | CHG | C / T |
//! | `H` / `h` | CHH | C / T |
//! | `-` | no reference C, or context unknown | |

use crate::cigar::Cigar;
use crate::reference::{ReferenceWindow, WINDOW_PAD};
use crate::strand::Orientation;
use noodles::sam::alignment::record::cigar::op::Kind as CigarKind;

pub const NOT_APPLICABLE: u8 = b'-';

fn is_h(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'T')
}

/// Call one read base whose reference base sits at `idx` in the padded window.
fn classify_base(read_base: u8, window: &[u8], idx: usize) -> u8 {
    let methylated = match read_base {
        b'C' => true,
        b'T' => false,
        _ => return NOT_APPLICABLE,
    };
    if window.get(idx) != Some(&b'C') {
        return NOT_APPLICABLE;
    }

    let symbol = match (window.get(idx + 1).copied(), window.get(idx + 2).copied()) {
        (Some(b'G'), _) => b'Z',
        (Some(h), Some(b'G')) if is_h(h) => b'X',
        (Some(h1), Some(h2)) if is_h(h1) && is_h(h2) => b'H',
        _ => return NOT_APPLICABLE,
    };

    if methylated {
        symbol
    } else {
        symbol.to_ascii_lowercase()
    }
}

/// Classify an ungapped read against its padded reference window: read
/// position `i` faces window offset `i + 2`.
pub fn classify_read(read: &[u8], window: &ReferenceWindow) -> String {
    let bases = window.bases();
    read.iter()
        .enumerate()
        .map(|(i, &base)| classify_base(base, bases, i + WINDOW_PAD) as char)
        .collect()
}

/// Classify a read through its CIGAR, so that bases after an insertion or
/// deletion are compared against the reference base they were aligned to.
/// Inserted and soft-clipped bases are reported as `-`.
pub fn classify_alignment(
    read: &[u8],
    window: &ReferenceWindow,
    cigar: &Cigar,
    orientation: Orientation,
) -> String {
    if !cigar.has_gaps() && !cigar.has_soft_clip() {
        return classify_read(read, window);
    }

    let bases = window.bases();
    let mut calls = Vec::with_capacity(read.len());
    let mut r = 0usize;
    let mut g = 0usize;
    let ops = cigar.ops();

    for (i, op) in ops.iter().enumerate() {
        let n = op.len();
        match op.kind() {
            CigarKind::Match | CigarKind::SequenceMatch | CigarKind::SequenceMismatch => {
                for k in 0..n {
                    let base = read.get(r + k).copied().unwrap_or(b'N');
                    calls.push(classify_base(base, bases, g + k + WINDOW_PAD));
                }
                r += n;
                g += n;
            }
            CigarKind::Insertion => {
                calls.extend(std::iter::repeat_n(NOT_APPLICABLE, n));
                r += n;
            }
            CigarKind::Deletion | CigarKind::Skip => g += n,
            CigarKind::SoftClip => {
                calls.extend(std::iter::repeat_n(NOT_APPLICABLE, n));
                r += n;
                if !cigar.is_trailing_clip(i) && orientation == Orientation::Forward {
                    g += n;
                }
            }
            CigarKind::HardClip | CigarKind::Pad => {}
        }
    }

    calls.truncate(read.len());
    calls.resize(read.len(), NOT_APPLICABLE);
    calls.into_iter().map(char::from).collect()
}
