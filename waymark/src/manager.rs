//! The application-facing façade over capture, restoration, storage, and
//! focus.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::capture::StateCaptureService;
use crate::env::{Dom, HistoryStore, Scheduler, SessionStore};
use crate::focus::FocusManager;
use crate::queue::OperationQueue;
use crate::restore::StateRestorationService;
use crate::state::{NavigationState, StorageInfo};
use crate::storage::{MAX_TRACKED_STATES, StorageAdapter};

/// Orchestrates the navigation-state subsystem: captures outgoing state,
/// restores incoming state, and serializes the asynchronous operations
/// through a strict-FIFO queue so rapid navigations cannot race each other.
///
/// Every operation is gated on [`NavigationManager::is_ready`]: before
/// `initialize` (and after `destroy`) the manager answers `None`/`false`
/// instead of panicking.
pub struct NavigationManager<D, S, K, H> {
    capture: StateCaptureService<D, S>,
    restoration: StateRestorationService<D, S>,
    storage: StorageAdapter<K, H>,
    focus: FocusManager<D>,
    queue: OperationQueue,
    ready: Cell<bool>,
}

impl<D, S, K, H> NavigationManager<D, S, K, H>
where
    D: Dom + 'static,
    S: Scheduler,
    K: SessionStore,
    H: HistoryStore,
{
    pub fn new(dom: Rc<D>, scheduler: Rc<S>, session: Rc<K>, history: Rc<H>) -> Self {
        Self {
            capture: StateCaptureService::new(Rc::clone(&dom), Rc::clone(&scheduler)),
            restoration: StateRestorationService::new(Rc::clone(&dom), scheduler),
            storage: StorageAdapter::new(session, history),
            focus: FocusManager::new(dom),
            queue: OperationQueue::new(),
            ready: Cell::new(false),
        }
    }

    /// Adjust the fixed-header allowance used for element scroll targets.
    pub fn with_header_height(self, px: f64) -> Self {
        Self {
            restoration: self.restoration.with_header_height(px),
            ..self
        }
    }

    pub fn initialize(&self) {
        self.capture.initialize();
        self.ready.set(true);
    }

    pub fn destroy(&self) {
        self.capture.destroy();
        self.ready.set(false);
    }

    /// Whether `initialize` has run and `destroy` has not.
    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    /// Snapshot the current document state and persist it to both stores
    /// (session store, plus best-effort history entry). The focused element's
    /// id is captured at the same moment for the eventual restoration.
    ///
    /// `None` only when the manager is not ready; a degraded session store
    /// still yields the snapshot, it just is not persisted.
    pub fn capture_state(&self) -> Option<NavigationState> {
        if !self.ready.get() {
            return None;
        }
        let state = self.capture.capture_current_state();
        self.focus.capture_focus();
        self.storage.save_to_session(&state.key, &state);
        self.storage.save_to_history(&state);
        Some(state)
    }

    /// Restore position (and, if one was captured, focus) for `state`.
    ///
    /// Queued: concurrent restorations execute strictly in submission order.
    /// Focus is restored after the scroll passes resolve so a focus-induced
    /// native scroll cannot fight the restoration target.
    pub async fn restore_state(&self, state: NavigationState) -> bool {
        if !self.ready.get() {
            return false;
        }
        self.queue
            .run("restore-state", async {
                let result = self.restoration.restore_state(&state).await;
                if let Some(id) = self.focus.take_captured() {
                    self.focus.restore_focus(&id);
                }
                result.success
            })
            .await
    }

    /// Look up the stored snapshot for a state key, if any survived eviction.
    pub fn stored_state(&self, key: &str) -> Option<NavigationState> {
        self.storage.get_from_session(key)
    }

    /// Snapshot carried by the current history entry, if any.
    pub fn history_state(&self) -> Option<NavigationState> {
        self.storage.get_from_history()
    }

    /// Diagnostics for the session-scoped store.
    pub fn get_storage_info(&self) -> StorageInfo {
        StorageInfo {
            count: self.storage.storage_count(),
            capacity: MAX_TRACKED_STATES,
            available: self.storage.is_available(),
        }
    }

    /// Drop every stored snapshot.
    pub fn clear_all_states(&self) {
        self.storage.clear_all();
    }

    /// The capture service, for wiring scroll listeners into the debounce.
    pub fn capture_service(&self) -> &StateCaptureService<D, S> {
        &self.capture
    }

    /// The restoration service, for callers that resolve strategies
    /// themselves.
    pub fn restoration_service(&self) -> &StateRestorationService<D, S> {
        &self.restoration
    }

    #[cfg(test)]
    pub(crate) async fn queue_operation<T, F>(&self, label: &str, op: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        self.queue.run(label, op).await
    }
}

impl<D, S, K, H> fmt::Debug for NavigationManager<D, S, K, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationManager")
            .field("ready", &self.ready.get())
            .finish()
    }
}
