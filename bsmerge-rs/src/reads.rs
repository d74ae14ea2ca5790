use crate::types::HashMap;
use anyhow::Result;
use needletail::parse_fastx_file;
use std::path::Path;

/// Read names as the aligner reports them: first whitespace token, with a
/// trailing `/1` or `/2` mate suffix removed.
pub fn normalize_read_name(name: &str) -> &str {
    let token = name.split_whitespace().next().unwrap_or("");
    token
        .strip_suffix("/1")
        .or_else(|| token.strip_suffix("/2"))
        .unwrap_or(token)
}

/// Raw (unconverted) bisulfite reads of one chunk, in file order.
#[derive(Debug, Default)]
pub struct ReadStore {
    order: Vec<String>,
    seqs: HashMap<String, Vec<u8>>,
}

impl ReadStore {
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = parse_fastx_file(path)
            .map_err(|e| anyhow::anyhow!("failed to open reads {}: {}", path.display(), e))?;
        let mut store = Self::default();

        while let Some(result) = reader.next() {
            let record = result.map_err(|e| {
                anyhow::anyhow!("failed to parse read record in {}: {}", path.display(), e)
            })?;
            let id = String::from_utf8_lossy(record.id());
            let name = normalize_read_name(&id).to_string();
            store.insert(name, record.seq().to_ascii_uppercase());
        }

        Ok(store)
    }

    /// Build a store from in-memory `(name, sequence)` pairs.
    pub fn from_records<I, N, S>(records: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<[u8]>,
    {
        let mut store = Self::default();
        for (name, seq) in records {
            store.insert(
                normalize_read_name(name.as_ref()).to_string(),
                seq.as_ref().to_ascii_uppercase(),
            );
        }
        store
    }

    fn insert(&mut self, name: String, seq: Vec<u8>) {
        if self.seqs.insert(name.clone(), seq).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.seqs.get(name).map(Vec::as_slice)
    }

    /// Read names in the order they appear in the read file.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

