//! `sessionStorage` and History-API bindings of the storage traits.

use wasm_bindgen::JsValue;

use waymark::env::{HistoryStore, SessionStore};

const PROBE_KEY: &str = "waymark:probe";

/// Session-scoped storage backed by `window.sessionStorage`.
///
/// Privacy mode and quota failures surface as `false`/`None`; every JS
/// exception is absorbed here.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStorageStore;

impl SessionStorageStore {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.session_storage().ok().flatten()
    }
}

impl SessionStore for SessionStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        Self::storage().is_some_and(|storage| storage.set_item(key, value).is_ok())
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }

    fn is_available(&self) -> bool {
        // Reading capabilities lie in privacy mode; a probe write is the
        // only reliable check.
        let Some(storage) = Self::storage() else {
            return false;
        };
        if storage.set_item(PROBE_KEY, "1").is_err() {
            return false;
        }
        let _ = storage.remove_item(PROBE_KEY);
        true
    }
}

/// The state slot of the current history entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserHistory;

impl BrowserHistory {
    pub fn new() -> Self {
        Self
    }

    fn history() -> Option<web_sys::History> {
        web_sys::window()?.history().ok()
    }
}

impl HistoryStore for BrowserHistory {
    fn replace_state(&self, payload: &str) -> bool {
        Self::history().is_some_and(|history| {
            history
                .replace_state(&JsValue::from_str(payload), "")
                .is_ok()
        })
    }

    fn read_state(&self) -> Option<String> {
        Self::history()?.state().ok()?.as_string()
    }
}
