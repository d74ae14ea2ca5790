//! Parsing of textual CIGAR strings as written by the aligner.

use noodles::sam::alignment::record::cigar::{Op, op::Kind as CigarKind};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CigarError {
    #[error("empty CIGAR string")]
    Empty,
    #[error("operator '{op}' at offset {offset} has no length")]
    MissingLength { op: char, offset: usize },
    #[error("invalid CIGAR operator '{op}' at offset {offset}")]
    InvalidOperator { op: char, offset: usize },
    #[error("CIGAR ends with a length and no operator")]
    TrailingLength,
    #[error("CIGAR operation length overflows")]
    LengthOverflow,
}

/// Bases per operator category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CigarTotals {
    /// M, = and X.
    pub matched: u32,
    pub inserted: u32,
    pub deleted: u32,
    pub soft_clipped: u32,
    /// N: reference skipped without a read base.
    pub skipped: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cigar {
    ops: Vec<Op>,
}

impl Cigar {
    pub fn parse(s: &str) -> Result<Self, CigarError> {
        if s.is_empty() {
            return Err(CigarError::Empty);
        }

        let mut ops = Vec::new();
        let mut len: Option<usize> = None;
        // Bounds every per-category sum taken later.
        let mut total: u32 = 0;

        for (offset, c) in s.char_indices() {
            if let Some(digit) = c.to_digit(10) {
                let n = len
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(digit as usize))
                    .filter(|n| *n <= u32::MAX as usize)
                    .ok_or(CigarError::LengthOverflow)?;
                len = Some(n);
                continue;
            }

            let kind = kind_from_char(c).ok_or(CigarError::InvalidOperator { op: c, offset })?;
            let n = len.take().ok_or(CigarError::MissingLength { op: c, offset })?;
            total = total
                .checked_add(n as u32)
                .ok_or(CigarError::LengthOverflow)?;
            ops.push(Op::new(kind, n));
        }

        if len.is_some() {
            return Err(CigarError::TrailingLength);
        }

        Ok(Self { ops })
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn totals(&self) -> CigarTotals {
        let mut totals = CigarTotals::default();
        for op in &self.ops {
            let n = op.len() as u32;
            match op.kind() {
                CigarKind::Match | CigarKind::SequenceMatch | CigarKind::SequenceMismatch => {
                    totals.matched += n
                }
                CigarKind::Insertion => totals.inserted += n,
                CigarKind::Deletion => totals.deleted += n,
                CigarKind::SoftClip => totals.soft_clipped += n,
                CigarKind::Skip => totals.skipped += n,
                CigarKind::HardClip | CigarKind::Pad => {}
            }
        }
        totals
    }

    /// Lengths of the individual insertion and deletion runs, in order.
    pub fn gap_runs(&self) -> impl Iterator<Item = u32> + '_ {
        self.ops
            .iter()
            .filter(|op| matches!(op.kind(), CigarKind::Insertion | CigarKind::Deletion))
            .map(|op| op.len() as u32)
    }

    /// Number of read bases the alignment consumes (M, I, S, =, X).
    pub fn read_len(&self) -> u32 {
        self.ops
            .iter()
            .filter(|op| op.kind().consumes_read())
            .map(|op| op.len() as u32)
            .sum()
    }

    /// Number of reference bases covered by the aligned part (M, D, N, =, X).
    pub fn reference_len(&self) -> u32 {
        self.ops
            .iter()
            .filter(|op| op.kind().consumes_reference())
            .map(|op| op.len() as u32)
            .sum()
    }

    pub fn has_soft_clip(&self) -> bool {
        self.ops.iter().any(|op| op.kind() == CigarKind::SoftClip)
    }

    pub fn has_gaps(&self) -> bool {
        self.ops.iter().any(|op| {
            matches!(
                op.kind(),
                CigarKind::Insertion | CigarKind::Deletion | CigarKind::Skip
            )
        })
    }

    /// Whether op `idx` is a soft clip at the end of the read. A lone soft
    /// clip, or one that opens the CIGAR, counts as leading.
    pub fn is_trailing_clip(&self, idx: usize) -> bool {
        idx > 0
            && idx + 1 == self.ops.len()
            && self.ops[idx].kind() == CigarKind::SoftClip
    }

    /// Soft clip at the start of the read, 0 when there is none.
    pub fn leading_soft_clip(&self) -> u32 {
        match self.ops.first() {
            Some(op) if op.kind() == CigarKind::SoftClip => op.len() as u32,
            _ => 0,
        }
    }

    /// Soft clip at the end of the read, 0 when there is none.
    pub fn trailing_soft_clip(&self) -> u32 {
        match self.ops.len().checked_sub(1) {
            Some(last) if self.is_trailing_clip(last) => self.ops[last].len() as u32,
            _ => 0,
        }
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return f.write_str("*");
        }
        for op in &self.ops {
            write!(f, "{}{}", op.len(), kind_to_char(op.kind()))?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Cigar {
    type Err = CigarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

pub(crate) fn kind_from_char(c: char) -> Option<CigarKind> {
    match c {
        'M' => Some(CigarKind::Match),
        'I' => Some(CigarKind::Insertion),
        'D' => Some(CigarKind::Deletion),
        'N' => Some(CigarKind::Skip),
        'S' => Some(CigarKind::SoftClip),
        'H' => Some(CigarKind::HardClip),
        'P' => Some(CigarKind::Pad),
        '=' => Some(CigarKind::SequenceMatch),
        'X' => Some(CigarKind::SequenceMismatch),
        _ => None,
    }
}

pub(crate) fn kind_to_char(kind: CigarKind) -> char {
    match kind {
        CigarKind::Match => 'M',
        CigarKind::Insertion => 'I',
        CigarKind::Deletion => 'D',
        CigarKind::Skip => 'N',
        CigarKind::SoftClip => 'S',
        CigarKind::HardClip => 'H',
        CigarKind::Pad => 'P',
        CigarKind::SequenceMatch => '=',
        CigarKind::SequenceMismatch => 'X',
    }
}
