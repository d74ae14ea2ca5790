use crate::score::ScoringScheme;
use crate::strand::Library;
use crate::types::EditDistance;
use anyhow::{Result, bail};

/// Restriction enzyme site of a reduced-representation library, written with
/// a `-` at the cut position (e.g. `C-CGG` for MspI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RrbsConfig {
    pub restriction_site: String,
}

impl RrbsConfig {
    pub fn new(restriction_site: &str) -> Result<Self> {
        let Some((head, tail)) = restriction_site.split_once('-') else {
            bail!("restriction site '{}' has no cut position '-'", restriction_site);
        };
        if head.is_empty() && tail.is_empty() {
            bail!("restriction site '{}' is empty", restriction_site);
        }
        Ok(Self {
            restriction_site: restriction_site.to_string(),
        })
    }

    /// Number of site bases after the cut.
    pub fn tail_len(&self) -> u32 {
        self.restriction_site
            .split_once('-')
            .map(|(_, tail)| tail.len() as u32)
            .unwrap_or(0)
    }
}

impl Default for RrbsConfig {
    fn default() -> Self {
        Self {
            restriction_site: "C-CGG".to_string(),
        }
    }
}

/// Knobs of the reconciliation engine.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub library: Library,
    pub paired: bool,
    /// Mismatch ceiling, applied both to NM at load time and to the
    /// recomputed bisulfite-aware mismatch count.
    pub max_mismatches: EditDistance,
    pub scoring: ScoringScheme,
    /// Also load the XA multi-hit tag (single-end only).
    pub all_valid: bool,
    /// Keep the first of several equally scored hits on the winning strand.
    pub keep_ambiguous: bool,
    pub methylation: bool,
    /// Drop soft-clipped alignments.
    pub end_to_end: bool,
    pub rrbs: Option<RrbsConfig>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            library: Library::Directional,
            paired: false,
            max_mismatches: 5,
            scoring: ScoringScheme::default(),
            all_valid: false,
            keep_ambiguous: false,
            methylation: false,
            end_to_end: false,
            rrbs: None,
        }
    }
}

impl ReconcileConfig {
    pub fn directional() -> Self {
        Self::default()
    }

    pub fn non_directional() -> Self {
        Self {
            library: Library::NonDirectional,
            ..Self::default()
        }
    }
}
