//! Bisulfite conversion strands and the constants that hang off them.
//!
//! Reads are aligned once per in-silico conversion: the read (or its reverse
//! complement) with C→T or G→A applied, against a genome converted the same
//! way. Which conversion produced a hit decides how the read is oriented,
//! which substitution is tolerated when counting mismatches, and the FLAG /
//! XR / XG values written to the output.

use noodles::sam::alignment::record::Flags;
use std::fmt;

/// Library protocol: number of conversion strands that must be reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Library {
    /// Lister protocol, two strands (FW_C2T, RC_G2A).
    #[default]
    Directional,
    /// Cokus protocol, all four strands.
    NonDirectional,
}

impl Library {
    pub fn strands(self) -> &'static [ConversionStrand] {
        match self {
            Library::Directional => &ConversionStrand::ALL[..2],
            Library::NonDirectional => &ConversionStrand::ALL,
        }
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Library::Directional => f.write_str("directional"),
            Library::NonDirectional => f.write_str("non-directional"),
        }
    }
}

/// Orientation of a strand relative to the forward genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    pub fn flip(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reverse,
            Orientation::Reverse => Orientation::Forward,
        }
    }
}

/// A base substitution produced by bisulfite treatment, expressed as the
/// (read base, reference base) pair it leaves in an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Unmethylated C read as T.
    CtoT,
    /// Unmethylated C on the opposite strand, read as A over a reference G.
    GtoA,
}

impl Conversion {
    pub fn read_base(self) -> u8 {
        match self {
            Conversion::CtoT => b'T',
            Conversion::GtoA => b'A',
        }
    }

    pub fn reference_base(self) -> u8 {
        match self {
            Conversion::CtoT => b'C',
            Conversion::GtoA => b'G',
        }
    }

    /// Two-letter code used in the XR / XG tags.
    pub fn code(self) -> &'static str {
        match self {
            Conversion::CtoT => "CT",
            Conversion::GtoA => "GA",
        }
    }
}

/// One in-silico conversion strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConversionStrand {
    FwC2T,
    RcG2A,
    FwG2A,
    RcC2T,
}

impl ConversionStrand {
    /// Canonical processing and emission order.
    pub const ALL: [ConversionStrand; 4] = [
        ConversionStrand::FwC2T,
        ConversionStrand::RcG2A,
        ConversionStrand::FwG2A,
        ConversionStrand::RcC2T,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConversionStrand::FwC2T => "FW_C2T",
            ConversionStrand::RcG2A => "RC_G2A",
            ConversionStrand::FwG2A => "FW_G2A",
            ConversionStrand::RcC2T => "RC_C2T",
        }
    }

    /// Strand tag attached to every hit loaded from this strand.
    pub fn tag(self) -> &'static str {
        match self {
            ConversionStrand::FwC2T => "+FW",
            ConversionStrand::RcG2A => "-FW",
            ConversionStrand::FwG2A => "-RC",
            ConversionStrand::RcC2T => "+RC",
        }
    }

    /// FW_* strands align the read as sequenced, RC_* its reverse complement.
    pub fn orientation(self) -> Orientation {
        match self {
            ConversionStrand::FwC2T | ConversionStrand::FwG2A => Orientation::Forward,
            ConversionStrand::RcG2A | ConversionStrand::RcC2T => Orientation::Reverse,
        }
    }

    /// Orientation of mate `mate` (0 or 1) of a pair aligned on this strand.
    /// Mate 2 is sequenced from the opposite end, so it is flipped.
    pub fn mate_orientation(self, mate: usize) -> Orientation {
        if mate == 0 {
            self.orientation()
        } else {
            self.orientation().flip()
        }
    }

    /// Substitution that is not counted as a mismatch on this strand.
    pub fn tolerated(self) -> Conversion {
        match self {
            ConversionStrand::FwC2T | ConversionStrand::RcC2T => Conversion::CtoT,
            ConversionStrand::RcG2A | ConversionStrand::FwG2A => Conversion::GtoA,
        }
    }

    /// XR: conversion applied to the read.
    pub fn read_conversion(self) -> Conversion {
        match self {
            ConversionStrand::FwC2T | ConversionStrand::RcG2A => Conversion::CtoT,
            ConversionStrand::FwG2A | ConversionStrand::RcC2T => Conversion::GtoA,
        }
    }

    /// XG: conversion applied to the genome.
    pub fn genome_conversion(self) -> Conversion {
        match self {
            ConversionStrand::FwC2T | ConversionStrand::FwG2A => Conversion::CtoT,
            ConversionStrand::RcG2A | ConversionStrand::RcC2T => Conversion::GtoA,
        }
    }

    /// Output FLAG. Only bit 0x10 is reported.
    pub fn flags(self) -> Flags {
        match self {
            ConversionStrand::FwC2T | ConversionStrand::RcC2T => Flags::empty(),
            ConversionStrand::RcG2A | ConversionStrand::FwG2A => Flags::REVERSE_COMPLEMENTED,
        }
    }

    /// File name of this strand's aligner output inside a chunk directory.
    pub fn file_name(self) -> String {
        format!("{}.sam", self.name())
    }
}

impl fmt::Display for ConversionStrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reverse complement a nucleotide sequence. Non-ACGT bases become `N`.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|base| match base.to_ascii_uppercase() {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            _ => b'N',
        })
        .collect()
}
