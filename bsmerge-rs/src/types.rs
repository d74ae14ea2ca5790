/// Edit distance (NM) or recomputed mismatch count of one alignment.
pub type EditDistance = u32;
/// Heuristic alignment score used to rank candidates of the same read.
pub type Score = i32;

// AHash-backed maps keyed by read name or target; build them with `::default()`.
pub type HashMap<K, V> = ahash::HashMap<K, V>;
pub type HashSet<K> = ahash::HashSet<K>;
