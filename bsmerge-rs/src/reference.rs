use crate::strand::Orientation;
use crate::types::HashMap;
use anyhow::{Context, Result};
use needletail::parse_fastx_file;
use std::fs;
use std::path::Path;

/// Reference bases kept on each side of an alignment window.
pub const WINDOW_PAD: usize = 2;

#[derive(Debug)]
pub enum ReferenceSeq {
    Whole(Vec<u8>),
    /// Reduced-representation genomes: one half per orientation.
    Halves { forward: Vec<u8>, reverse: Vec<u8> },
}

impl ReferenceSeq {
    pub fn for_orientation(&self, orientation: Orientation) -> &[u8] {
        match (self, orientation) {
            (ReferenceSeq::Whole(seq), _) => seq,
            (ReferenceSeq::Halves { forward, .. }, Orientation::Forward) => forward,
            (ReferenceSeq::Halves { reverse, .. }, Orientation::Reverse) => reverse,
        }
    }
}

#[derive(Debug, Default)]
pub struct ReferenceStore {
    seqs: HashMap<String, ReferenceSeq>,
}

impl ReferenceStore {
    pub fn load(path: &Path) -> Result<Self> {
        let seqs = read_fasta(path)?
            .into_iter()
            .map(|(id, seq)| (id, ReferenceSeq::Whole(seq)))
            .collect();
        Ok(Self { seqs })
    }

    /// Load forward and reverse halves of a reduced-representation genome.
    /// Every target of the forward file must also be present in the reverse one.
    pub fn load_halves(forward: &Path, reverse: &Path) -> Result<Self> {
        let forward_seqs = read_fasta(forward)?;
        let mut reverse_seqs: HashMap<String, Vec<u8>> = read_fasta(reverse)?.into_iter().collect();

        let mut seqs = HashMap::default();
        for (id, fw) in forward_seqs {
            let rc = reverse_seqs.remove(&id).ok_or_else(|| {
                anyhow::anyhow!(
                    "target {} missing from reverse genome {}",
                    id,
                    reverse.display()
                )
            })?;
            seqs.insert(
                id,
                ReferenceSeq::Halves {
                    forward: fw,
                    reverse: rc,
                },
            );
        }
        if !reverse_seqs.is_empty() {
            tracing::warn!(
                extra_targets = reverse_seqs.len(),
                "reverse genome has targets absent from the forward genome"
            );
        }

        Ok(Self { seqs })
    }

    pub fn from_sequences<I, N, S>(seqs: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: AsRef<[u8]>,
    {
        let seqs = seqs
            .into_iter()
            .map(|(id, seq)| (id.into(), ReferenceSeq::Whole(seq.as_ref().to_ascii_uppercase())))
            .collect();
        Self { seqs }
    }

    pub fn from_halves<I, N, S>(seqs: I) -> Self
    where
        I: IntoIterator<Item = (N, S, S)>,
        N: Into<String>,
        S: AsRef<[u8]>,
    {
        let seqs = seqs
            .into_iter()
            .map(|(id, fw, rc)| {
                (
                    id.into(),
                    ReferenceSeq::Halves {
                        forward: fw.as_ref().to_ascii_uppercase(),
                        reverse: rc.as_ref().to_ascii_uppercase(),
                    },
                )
            })
            .collect();
        Self { seqs }
    }

    pub fn get(&self, target: &str, orientation: Orientation) -> Option<&[u8]> {
        self.seqs
            .get(target)
            .map(|seq| seq.for_orientation(orientation))
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    /// Slice `[position - 2, position + span + 2)` (1-based `position`) out of
    /// the target. Bases outside the contig are returned as `N` so offsets into
    /// the window stay aligned with the read.
    pub fn window(
        &self,
        target: &str,
        orientation: Orientation,
        position: u32,
        span: usize,
    ) -> Option<ReferenceWindow> {
        let seq = self.get(target, orientation)?;
        if position == 0 {
            return None;
        }

        let start = position as i64 - 1 - WINDOW_PAD as i64;
        let len = span + 2 * WINDOW_PAD;
        let bases = (0..len as i64)
            .map(|i| {
                usize::try_from(start + i)
                    .ok()
                    .and_then(|idx| seq.get(idx))
                    .copied()
                    .unwrap_or(b'N')
            })
            .collect();

        Some(ReferenceWindow { bases })
    }
}

/// Reference bases around one alignment, padded by [`WINDOW_PAD`] on each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceWindow {
    bases: Vec<u8>,
}

impl ReferenceWindow {
    pub fn from_bases(bases: impl Into<Vec<u8>>) -> Self {
        Self {
            bases: bases.into(),
        }
    }

    /// Full padded window.
    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    /// Window without the padding: the reference starting at the alignment position.
    pub fn core(&self) -> &[u8] {
        let end = self.bases.len().saturating_sub(WINDOW_PAD);
        self.bases.get(WINDOW_PAD..end).unwrap_or(&[])
    }
}

/// Human-readable target names used at emission time.
#[derive(Debug, Default)]
pub struct ReferenceNames {
    names: HashMap<String, String>,
}

impl ReferenceNames {
    /// Parse a `target_id<TAB>name` table. Blank lines and `#` comments are ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read name table {}", path.display()))?;
        let mut names = HashMap::default();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (id, name) = line.split_once('\t').ok_or_else(|| {
                anyhow::anyhow!("{}:{}: expected id<TAB>name", path.display(), lineno + 1)
            })?;
            names.insert(id.to_string(), name.to_string());
        }
        Ok(Self { names })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            names: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Display name of `target`, or the id itself when the table has no entry.
    pub fn resolve<'a>(&'a self, target: &'a str) -> &'a str {
        self.names.get(target).map(String::as_str).unwrap_or(target)
    }
}

fn read_fasta(path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let mut reader = parse_fastx_file(path)
        .map_err(|e| anyhow::anyhow!("failed to open FASTA {}: {}", path.display(), e))?;
    let mut seqs = Vec::new();

    while let Some(result) = reader.next() {
        let record =
            result.map_err(|e| anyhow::anyhow!("failed to parse FASTA record: {}", e))?;
        let id = String::from_utf8_lossy(record.id());
        let id = id.split_whitespace().next().unwrap_or("").to_string();
        seqs.push((id, record.seq().to_ascii_uppercase()));
    }

    Ok(seqs)
}
