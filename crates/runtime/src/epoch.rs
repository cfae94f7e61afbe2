use std::collections::BTreeMap;

/// Generation tag for an in-flight fetch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Epoch(pub u64);

/// Per-key fetch generations.
///
/// There is no cancellation for in-flight backend fetches; instead each fetch
/// is tagged with the key's epoch at start, and a completion carrying a stale
/// epoch is discarded by the caller.
#[derive(Debug)]
pub struct EpochMap<K: Ord> {
    current: BTreeMap<K, u64>,
}

// Derived Default would require K: Default.
impl<K: Ord> Default for EpochMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> EpochMap<K> {
    pub fn new() -> Self {
        Self {
            current: BTreeMap::new(),
        }
    }

    /// Advances the key's generation and returns the new epoch.
    ///
    /// Any fetch started under an earlier epoch for this key is now stale.
    pub fn begin(&mut self, key: K) -> Epoch {
        let entry = self.current.entry(key).or_insert(0);
        *entry += 1;
        Epoch(*entry)
    }

    pub fn is_current(&self, key: &K, epoch: Epoch) -> bool {
        self.current.get(key).copied() == Some(epoch.0)
    }
}
