use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Last observed state of each logic, keyed by logic identifier.
///
/// Cloning yields another handle to the same map. Entries are never evicted;
/// an identifier that was never reported reads as `None`.
#[derive(Debug, Clone, Default)]
pub struct LogicStore {
    states: Arc<RwLock<HashMap<u16, bool>>>,
}

impl LogicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the state of a logic.
    pub fn set(&self, logic_id: u16, state: bool) {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(logic_id, state);
    }

    /// Cached state, or `None` if the logic was never reported.
    pub fn get(&self, logic_id: u16) -> Option<bool> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&logic_id)
            .copied()
    }

    /// All known states, sorted by logic identifier.
    pub fn snapshot(&self) -> Vec<(u16, bool)> {
        let mut entries: Vec<_> = self
            .states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, state)| (*id, *state))
            .collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries
    }

    pub fn len(&self) -> usize {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_until_set() {
        let store = LogicStore::new();
        assert_eq!(store.get(5), None);
        assert!(store.is_empty());
    }

    #[test]
    fn set_overwrites() {
        let store = LogicStore::new();
        store.set(5, true);
        assert_eq!(store.get(5), Some(true));
        store.set(5, false);
        assert_eq!(store.get(5), Some(false));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clones_share_state() {
        let store = LogicStore::new();
        let handle = store.clone();
        handle.set(u16::MAX, true);
        assert_eq!(store.get(u16::MAX), Some(true));
    }

    #[test]
    fn snapshot_is_sorted() {
        let store = LogicStore::new();
        store.set(300, false);
        store.set(2, true);
        store.set(40, true);
        assert_eq!(store.snapshot(), vec![(2, true), (40, true), (300, false)]);
    }
}
