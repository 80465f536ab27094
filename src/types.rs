use rustc_hash::{FxHashMap, FxHashSet};

pub type HashMap<K, V> = FxHashMap<K, V>;

pub type HashSet<K> = FxHashSet<K>;

/// Index of a node in the network arena.
pub type NodeId = usize;

/// Index of an edge in the network arena.
pub type EdgeId = usize;
