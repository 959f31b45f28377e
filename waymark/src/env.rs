//! Environment seams between the navigation engine and the browser.
//!
//! Every browser touchpoint the engine needs (scroll offsets, location
//! parts, element lookup, focus, storage, timers) goes through one of these
//! traits. Production binds them to `web-sys` in `waymark_web`; tests and
//! server-side rendering bind the in-memory versions in [`crate::mem`].

use futures_util::future::LocalBoxFuture;

/// Viewport-relative bounds of one `data-section` element.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRect {
    /// Section marker value.
    pub id: String,
    /// Top edge relative to the viewport, in px. Negative when scrolled past.
    pub top: f64,
    /// Bottom edge relative to the viewport, in px.
    pub bottom: f64,
}

/// Read/write access to the live document and window.
///
/// Hash values cross this boundary without the leading `#`; implementations
/// trim it. All lookups are taken fresh at the moment of the call; the
/// engine never caches DOM reads across a debounce window.
pub trait Dom {
    /// Current horizontal scroll offset.
    fn scroll_x(&self) -> f64;
    /// Current vertical scroll offset.
    fn scroll_y(&self) -> f64;
    /// Scroll the viewport. Returns `false` when the scroll API is unusable
    /// (non-browser context); that is the only restoration failure mode.
    fn scroll_to(&self, x: f64, y: f64, smooth: bool) -> bool;
    /// Pathname of the current location.
    fn pathname(&self) -> String;
    /// Query string of the current location, without the leading `?`.
    fn search(&self) -> String;
    /// Fragment of the current location, without the leading `#`.
    fn hash(&self) -> String;
    /// Document-relative top of the element with the given id, if present.
    fn element_top(&self, id: &str) -> Option<f64>;
    /// Document-relative top of the section with the given marker, if present.
    fn section_top(&self, id: &str) -> Option<f64>;
    /// Viewport-relative bounds of every section marker, in document order.
    fn section_rects(&self) -> Vec<SectionRect>;
    /// Height of the viewport in px.
    fn viewport_height(&self) -> f64;
    /// Id of the currently focused element; `None` when nothing is focused
    /// or the focused element carries no id.
    fn active_element_id(&self) -> Option<String>;
    /// Move focus to the element with the given id. `false` when absent.
    fn focus(&self, id: &str) -> bool;
    /// Whether the user asked for reduced motion.
    fn prefers_reduced_motion(&self) -> bool;
}

/// Session-scoped key/value store (browser `sessionStorage` in production).
///
/// Implementations catch their own exceptions (privacy mode, quota) and
/// report them as `false`/`None`; nothing here panics.
pub trait SessionStore {
    /// Read a value, `None` when absent or the store is unusable.
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value. `false` when the store is unusable or the write failed.
    fn set(&self, key: &str, value: &str) -> bool;
    /// Remove a value. Missing keys are a silent no-op.
    fn remove(&self, key: &str);
    /// Probe whether the store is usable at all.
    fn is_available(&self) -> bool;
}

/// The state slot of the current history entry.
pub trait HistoryStore {
    /// Replace the current entry's state payload. Best effort.
    fn replace_state(&self, payload: &str) -> bool;
    /// Read the current entry's state payload, if any.
    fn read_state(&self) -> Option<String>;
}

/// Timer source for debounce windows and the restoration settle pass.
///
/// Abstracting the timer is what lets the 150 ms debounce window and the
/// settle delay run under a controllable clock in tests.
pub trait Scheduler {
    /// Current instant in milliseconds. Only ever compared, never absolute.
    fn now_ms(&self) -> f64;
    /// Run `f` once after `delay_ms`. Fire and forget.
    fn schedule(&self, delay_ms: u32, f: Box<dyn FnOnce()>);
    /// Awaitable pause of `delay_ms`.
    fn sleep(&self, delay_ms: u32) -> LocalBoxFuture<'static, ()>;
}
