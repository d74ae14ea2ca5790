//! Restriction-fragment lookup for reduced-representation libraries.

use crate::strand::Orientation;
use crate::types::HashMap;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

/// One entry of the index as stored on disk: two boundary coordinates whose
/// meaning depends on the orientation the entry was recorded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub first: u32,
    pub second: u32,
    pub id: u32,
}

/// Fragment coordinates as reported in the YF/YS/YE tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentBounds {
    pub id: u32,
    pub start: u32,
    pub end: u32,
}

impl FragmentBounds {
    pub fn size(&self) -> i64 {
        i64::from(self.end) - i64::from(self.start)
    }
}

impl Fragment {
    pub fn bounds(&self, orientation: Orientation) -> FragmentBounds {
        match orientation {
            Orientation::Forward => FragmentBounds {
                id: self.id,
                start: self.first,
                end: self.second,
            },
            Orientation::Reverse => FragmentBounds {
                id: self.id,
                start: self.second,
                end: self.first,
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct FragmentIndex {
    by_target: HashMap<(String, Orientation), HashMap<u32, Fragment>>,
}

impl FragmentIndex {
    /// Parse `target<TAB>F|R<TAB>lookup<TAB>first<TAB>second<TAB>fragment_id` lines.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read fragment index {}", path.display()))?;
        let mut index = Self::default();

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 6 {
                bail!(
                    "{}:{}: expected 6 tab-separated fields, found {}",
                    path.display(),
                    lineno + 1,
                    fields.len()
                );
            }
            let orientation = match fields[1] {
                "F" => Orientation::Forward,
                "R" => Orientation::Reverse,
                other => bail!(
                    "{}:{}: invalid orientation '{}'",
                    path.display(),
                    lineno + 1,
                    other
                ),
            };
            let parse = |s: &str| -> Result<u32> {
                s.parse::<u32>()
                    .with_context(|| format!("{}:{}: invalid number '{}'", path.display(), lineno + 1, s))
            };
            index.insert(
                fields[0],
                orientation,
                parse(fields[2])?,
                Fragment {
                    first: parse(fields[3])?,
                    second: parse(fields[4])?,
                    id: parse(fields[5])?,
                },
            );
        }

        Ok(index)
    }

    pub fn insert(&mut self, target: &str, orientation: Orientation, lookup: u32, fragment: Fragment) {
        self.by_target
            .entry((target.to_string(), orientation))
            .or_default()
            .insert(lookup, fragment);
    }

    pub fn lookup(&self, target: &str, orientation: Orientation, position: u32) -> Option<FragmentBounds> {
        self.by_target
            .get(&(target.to_string(), orientation))?
            .get(&position)
            .map(|fragment| fragment.bounds(orientation))
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}
