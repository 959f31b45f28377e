//! Bounded keyed persistence for navigation snapshots.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::env::{HistoryStore, SessionStore};
use crate::state::NavigationState;

/// Maximum number of snapshots kept in the session store.
pub const MAX_TRACKED_STATES: usize = 50;

/// Namespace prefix for session keys, so the adapter can share a store with
/// unrelated code and `clear_all` only touches its own records.
const KEY_PREFIX: &str = "waymark:";

/// Persistence layer over the two stores a snapshot lives in: the
/// session-scoped key/value store and the current history entry's state slot.
///
/// Capacity is enforced FIFO by insertion order, tracked here rather than
/// inferred from the `timestamp` field; re-saving a key updates in place
/// without moving it in the queue, evicting anything, or changing the count.
/// Every failure mode of the underlying stores is absorbed into a boolean or
/// `None`; nothing in this adapter panics.
pub struct StorageAdapter<S, H> {
    session: Rc<S>,
    history: Rc<H>,
    order: RefCell<VecDeque<String>>,
}

impl<S: SessionStore, H: HistoryStore> StorageAdapter<S, H> {
    pub fn new(session: Rc<S>, history: Rc<H>) -> Self {
        Self {
            session,
            history,
            order: RefCell::new(VecDeque::new()),
        }
    }

    fn storage_key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }

    /// Write or update the snapshot stored under `key`.
    ///
    /// A new key at capacity evicts the single oldest entry first. Returns
    /// `false` when the store is unavailable or the write fails; a failed
    /// write never registers the key.
    pub fn save_to_session(&self, key: &str, state: &NavigationState) -> bool {
        if !self.session.is_available() {
            tracing::debug!(key, "session store unavailable, snapshot not persisted");
            return false;
        }
        let Ok(payload) = state.to_json() else {
            return false;
        };

        let known = self.order.borrow().iter().any(|k| k == key);
        if !known && self.order.borrow().len() >= MAX_TRACKED_STATES {
            let oldest = self.order.borrow_mut().pop_front();
            if let Some(oldest) = oldest {
                self.session.remove(&Self::storage_key(&oldest));
                tracing::debug!(evicted = %oldest, "snapshot cap reached, evicted oldest entry");
            }
        }

        if !self.session.set(&Self::storage_key(key), &payload) {
            tracing::debug!(key, "session write failed, snapshot not persisted");
            return false;
        }
        if !known {
            self.order.borrow_mut().push_back(key.to_owned());
        }
        true
    }

    /// Read the snapshot stored under `key`. Absent keys and unparsable
    /// payloads both come back as `None`.
    pub fn get_from_session(&self, key: &str) -> Option<NavigationState> {
        let raw = self.session.get(&Self::storage_key(key))?;
        NavigationState::from_json(&raw).ok()
    }

    /// Best-effort write of the snapshot into the current history entry.
    pub fn save_to_history(&self, state: &NavigationState) -> bool {
        let Ok(payload) = state.to_json() else {
            return false;
        };
        self.history.replace_state(&payload)
    }

    /// Read the snapshot out of the current history entry, if one is there.
    pub fn get_from_history(&self) -> Option<NavigationState> {
        let raw = self.history.read_state()?;
        NavigationState::from_json(&raw).ok()
    }

    /// Number of snapshots currently tracked.
    pub fn storage_count(&self) -> usize {
        self.order.borrow().len()
    }

    /// Whether the session store is usable at all.
    pub fn is_available(&self) -> bool {
        self.session.is_available()
    }

    /// Drop every tracked snapshot.
    pub fn clear_all(&self) {
        for key in self.order.borrow_mut().drain(..) {
            self.session.remove(&Self::storage_key(&key));
        }
    }
}

impl<S, H> fmt::Debug for StorageAdapter<S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAdapter")
            .field("count", &self.order.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mem::{MemoryHistory, MemoryStore};
    use crate::state::generate_state_key;

    fn adapter() -> (StorageAdapter<MemoryStore, MemoryHistory>, Rc<MemoryStore>) {
        let store = Rc::new(MemoryStore::new());
        let history = Rc::new(MemoryHistory::new());
        (StorageAdapter::new(Rc::clone(&store), history), store)
    }

    fn snapshot(key: &str, scroll_y: f64) -> NavigationState {
        NavigationState {
            key: key.to_owned(),
            scroll_y,
            scroll_x: 0.0,
            timestamp: 1_234.0,
            route: key.to_owned(),
            hash: None,
            section_id: None,
        }
    }

    #[test]
    fn round_trips_a_snapshot() {
        let (adapter, _) = adapter();
        let state = snapshot("/test", 500.0);

        assert!(adapter.save_to_session("/test", &state));
        let restored = adapter.get_from_session("/test").unwrap();
        assert_eq!(restored.scroll_y, 500.0);
        assert_eq!(restored, state);
    }

    #[test]
    fn missing_key_reads_back_as_none() {
        let (adapter, _) = adapter();
        assert_eq!(adapter.get_from_session("/nowhere"), None);
    }

    #[test]
    fn evicts_fifo_beyond_capacity() {
        let (adapter, _) = adapter();

        for i in 0..55 {
            let key = generate_state_key(&format!("/page-{i}"), "");
            assert!(adapter.save_to_session(&key, &snapshot(&key, f64::from(i))));
        }

        assert_eq!(adapter.storage_count(), MAX_TRACKED_STATES);
        for i in 0..5 {
            assert_eq!(adapter.get_from_session(&format!("/page-{i}")), None);
        }
        for i in 5..55 {
            assert!(adapter.get_from_session(&format!("/page-{i}")).is_some());
        }
    }

    #[test]
    fn resaving_a_key_updates_in_place() {
        let (adapter, _) = adapter();

        adapter.save_to_session("/products", &snapshot("/products", 100.0));
        adapter.save_to_session("/products", &snapshot("/products", 900.0));

        assert_eq!(adapter.storage_count(), 1);
        let stored = adapter.get_from_session("/products").unwrap();
        assert_eq!(stored.scroll_y, 900.0);
    }

    #[test]
    fn updating_a_key_at_capacity_evicts_nothing() {
        let (adapter, _) = adapter();

        for i in 0..MAX_TRACKED_STATES {
            let key = format!("/page-{i}");
            adapter.save_to_session(&key, &snapshot(&key, 0.0));
        }
        adapter.save_to_session("/page-0", &snapshot("/page-0", 42.0));

        assert_eq!(adapter.storage_count(), MAX_TRACKED_STATES);
        assert!(adapter.get_from_session("/page-0").is_some());
    }

    #[test]
    fn unavailable_store_degrades_to_false() {
        let (adapter, store) = adapter();
        store.set_available(false);

        assert!(!adapter.save_to_session("/test", &snapshot("/test", 10.0)));
        assert!(!adapter.is_available());
        assert_eq!(adapter.storage_count(), 0);
    }

    #[test]
    fn failed_write_leaves_count_untouched() {
        let (adapter, store) = adapter();
        adapter.save_to_session("/a", &snapshot("/a", 1.0));
        store.fail_writes(true);

        assert!(!adapter.save_to_session("/b", &snapshot("/b", 2.0)));
        assert_eq!(adapter.storage_count(), 1);
        assert_eq!(adapter.get_from_session("/b"), None);
    }

    #[test]
    fn history_slot_round_trips() {
        let store = Rc::new(MemoryStore::new());
        let history = Rc::new(MemoryHistory::new());
        let adapter = StorageAdapter::new(store, Rc::clone(&history));
        let state = snapshot("/blog?page=2", 250.0);

        assert!(adapter.save_to_history(&state));
        assert_eq!(adapter.get_from_history(), Some(state));

        history.fail_writes(true);
        assert!(!adapter.save_to_history(&snapshot("/other", 0.0)));
    }

    #[test]
    fn clear_all_empties_the_store() {
        let (adapter, store) = adapter();
        for i in 0..3 {
            let key = format!("/page-{i}");
            adapter.save_to_session(&key, &snapshot(&key, 0.0));
        }

        adapter.clear_all();
        assert_eq!(adapter.storage_count(), 0);
        assert!(store.is_empty());
        assert_eq!(adapter.get_from_session("/page-0"), None);
    }
}
