//! Cross-strand ambiguity resolution.
//!
//! A read may be reported on several conversion strands. The lowest edit
//! distance at which the read has any hit decides: the strands compete on
//! their best score at that tier and the read survives only on a unique
//! winner. In a non-directional library a strand without a hit at the tier
//! scores 0. Reads tied at the decisive tier are dropped and never
//! reconsidered at a higher tier.
//!
//! The input sets are not mutated while scanning. Winners and ambiguous
//! reads are computed first; the next generation of sets is then built by
//! filtering.

use crate::loader::{Candidate, PerReadAlignmentSet, ReadAlignments, StrandCollection};
use crate::strand::Library;
use crate::types::{HashMap, HashSet, Score};
use std::cmp::Ordering;

#[derive(Debug)]
pub struct Resolved<A> {
    pub collection: StrandCollection<A>,
    /// Reads removed as ambiguous, across strands or within the winning one.
    pub ambiguous: HashSet<String>,
}

/// Decision for one read present on more than one strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    /// Index of the winning strand set.
    Winner(usize),
    Ambiguous,
}

fn directional<A: Candidate>(sets: &[PerReadAlignmentSet<A>]) -> HashMap<String, Verdict> {
    let mut verdicts = HashMap::default();
    let (fw, rc) = (&sets[0], &sets[1]);

    for (name, a) in fw.iter() {
        let Some(b) = rc.get(name) else {
            continue;
        };
        let tiers = a.histogram.len().max(b.histogram.len());
        for d in 0..tiers as u32 {
            let verdict = match (a.count_at(d) > 0, b.count_at(d) > 0) {
                (false, false) => continue,
                (true, false) => Verdict::Winner(0),
                (false, true) => Verdict::Winner(1),
                (true, true) => {
                    let sa = a.first().map(Candidate::score);
                    let sb = b.first().map(Candidate::score);
                    match sa.cmp(&sb) {
                        Ordering::Equal => Verdict::Ambiguous,
                        Ordering::Greater => Verdict::Winner(0),
                        Ordering::Less => Verdict::Winner(1),
                    }
                }
            };
            verdicts.insert(name.to_string(), verdict);
            break;
        }
    }

    verdicts
}

fn non_directional<A: Candidate>(sets: &[PerReadAlignmentSet<A>]) -> HashMap<String, Verdict> {
    let mut seen: HashMap<&str, usize> = HashMap::default();
    for set in sets {
        for name in set.read_names() {
            *seen.entry(name).or_default() += 1;
        }
    }

    let mut verdicts = HashMap::default();
    for (name, _) in seen.into_iter().filter(|(_, n)| *n >= 2) {
        let hits: Vec<Option<&ReadAlignments<A>>> = sets.iter().map(|s| s.get(name)).collect();
        let tiers = hits
            .iter()
            .flatten()
            .map(|a| a.histogram.len())
            .max()
            .unwrap_or(0);

        for d in 0..tiers as u32 {
            if hits.iter().flatten().all(|a| a.count_at(d) == 0) {
                continue;
            }
            // Strands without a hit at this tier compete with a score of 0.
            let scores: Vec<Score> = hits
                .iter()
                .map(|&hit| {
                    hit.filter(|a| a.count_at(d) > 0)
                        .and_then(|a| a.best_score_at(d))
                        .unwrap_or(0)
                })
                .collect();
            let max = scores.iter().copied().max().unwrap_or(0);

            let mut best = scores.iter().enumerate().filter(|(_, s)| **s == max);
            let verdict = match (best.next(), best.next()) {
                // A strand that never saw the read cannot hold it.
                (Some((i, _)), None) if hits[i].is_some() => Verdict::Winner(i),
                _ => Verdict::Ambiguous,
            };
            verdicts.insert(name.to_string(), verdict);
            break;
        }
    }

    verdicts
}

/// Keep the single best-scored hit of a read. `None` when the best score is
/// shared and `keep_ambiguous` is off.
fn prune<A: Candidate>(mut alignments: ReadAlignments<A>, keep_ambiguous: bool) -> Option<ReadAlignments<A>> {
    if alignments.records.len() <= 1 {
        return Some(alignments);
    }
    let max = alignments.records.iter().map(Candidate::score).max()?;
    let mut best = alignments
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.score() == max)
        .map(|(i, _)| i);
    let first = best.next()?;
    if best.next().is_some() && !keep_ambiguous {
        return None;
    }
    let winner = alignments.records.swap_remove(first);
    alignments.records = vec![winner];
    Some(alignments)
}

/// Reduce the collection to at most one hit per read across all strands.
pub fn resolve<A: Candidate>(collection: StrandCollection<A>, keep_ambiguous: bool) -> Resolved<A> {
    let library = collection.library;
    let verdicts = match library {
        Library::Directional => directional(collection.sets()),
        Library::NonDirectional => non_directional(collection.sets()),
    };

    let mut ambiguous: HashSet<String> = verdicts
        .iter()
        .filter(|(_, v)| **v == Verdict::Ambiguous)
        .map(|(name, _)| name.clone())
        .collect();

    let sets = collection
        .into_sets()
        .into_iter()
        .enumerate()
        .map(|(idx, set)| {
            set.filter_map(|name, alignments| {
                match verdicts.get(name) {
                    Some(Verdict::Ambiguous) => return None,
                    Some(Verdict::Winner(w)) if *w != idx => return None,
                    _ => {}
                }
                let pruned = prune(alignments, keep_ambiguous);
                if pruned.is_none() {
                    ambiguous.insert(name.to_string());
                }
                pruned
            })
        })
        .collect();

    let collection = StrandCollection::from_parts(library, sets);

    tracing::debug!(
        library = %library,
        contested = verdicts.len(),
        ambiguous = ambiguous.len(),
        "resolved strand collection"
    );

    Resolved {
        collection,
        ambiguous,
    }
}
