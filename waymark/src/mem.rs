//! In-memory bindings of the environment traits.
//!
//! These back the unit tests and double as the server-side rendering
//! environment, where every browser call degrades to a defined no-op. The
//! scheduler is driven manually so debounce behavior is deterministic.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;

use futures_util::future::LocalBoxFuture;

use crate::env::{Dom, HistoryStore, Scheduler, SectionRect, SessionStore};

#[derive(Debug, Clone, PartialEq)]
struct MemoryElement {
    id: String,
    top: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct MemorySection {
    id: String,
    top: f64,
    height: f64,
}

/// One recorded `scroll_to` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollCall {
    pub x: f64,
    pub y: f64,
    pub smooth: bool,
}

/// A document that lives entirely in memory.
///
/// Elements and sections are registered with document-relative tops; the
/// viewport-relative rects handed to the engine are derived from the current
/// scroll offset, the same way `getBoundingClientRect` behaves.
#[derive(Debug)]
pub struct MemoryDom {
    scroll: Cell<(f64, f64)>,
    scroll_api_available: Cell<bool>,
    scroll_log: RefCell<Vec<ScrollCall>>,
    pathname: RefCell<String>,
    search: RefCell<String>,
    hash: RefCell<String>,
    elements: RefCell<Vec<MemoryElement>>,
    sections: RefCell<Vec<MemorySection>>,
    viewport_height: Cell<f64>,
    focused: RefCell<Option<String>>,
    reduced_motion: Cell<bool>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        Self {
            scroll: Cell::new((0.0, 0.0)),
            scroll_api_available: Cell::new(true),
            scroll_log: RefCell::new(Vec::new()),
            pathname: RefCell::new("/".to_owned()),
            search: RefCell::new(String::new()),
            hash: RefCell::new(String::new()),
            elements: RefCell::new(Vec::new()),
            sections: RefCell::new(Vec::new()),
            viewport_height: Cell::new(800.0),
            focused: RefCell::new(None),
            reduced_motion: Cell::new(false),
        }
    }

    /// Point the document at a new location. `search` and `hash` are taken
    /// without their `?`/`#` prefixes.
    pub fn set_location(&self, pathname: &str, search: &str, hash: &str) {
        *self.pathname.borrow_mut() = pathname.to_owned();
        *self.search.borrow_mut() = search.to_owned();
        *self.hash.borrow_mut() = hash.trim_start_matches('#').to_owned();
    }

    pub fn set_scroll(&self, x: f64, y: f64) {
        self.scroll.set((x, y));
    }

    pub fn set_viewport_height(&self, px: f64) {
        self.viewport_height.set(px);
    }

    pub fn set_reduced_motion(&self, on: bool) {
        self.reduced_motion.set(on);
    }

    /// Simulate a non-browser context where scrolling is impossible.
    pub fn disable_scroll_api(&self) {
        self.scroll_api_available.set(false);
    }

    /// Register an element with a document-relative top.
    pub fn add_element(&self, id: &str, top: f64) {
        self.elements.borrow_mut().push(MemoryElement {
            id: id.to_owned(),
            top,
        });
    }

    /// Move a registered element (a late-loading layout shift).
    pub fn move_element(&self, id: &str, top: f64) {
        if let Some(el) = self.elements.borrow_mut().iter_mut().find(|el| el.id == id) {
            el.top = top;
        }
    }

    pub fn remove_element(&self, id: &str) {
        self.elements.borrow_mut().retain(|el| el.id != id);
    }

    /// Register a section marker with a document-relative top and height.
    pub fn add_section(&self, id: &str, top: f64, height: f64) {
        self.sections.borrow_mut().push(MemorySection {
            id: id.to_owned(),
            top,
            height,
        });
    }

    pub fn remove_section(&self, id: &str) {
        self.sections.borrow_mut().retain(|s| s.id != id);
    }

    /// Drop focus from whatever currently holds it.
    pub fn blur(&self) {
        *self.focused.borrow_mut() = None;
    }

    /// Every `scroll_to` call seen so far, oldest first.
    pub fn scroll_calls(&self) -> Vec<ScrollCall> {
        self.scroll_log.borrow().clone()
    }
}

impl Dom for MemoryDom {
    fn scroll_x(&self) -> f64 {
        self.scroll.get().0
    }

    fn scroll_y(&self) -> f64 {
        self.scroll.get().1
    }

    fn scroll_to(&self, x: f64, y: f64, smooth: bool) -> bool {
        if !self.scroll_api_available.get() {
            return false;
        }
        self.scroll.set((x, y));
        self.scroll_log.borrow_mut().push(ScrollCall { x, y, smooth });
        true
    }

    fn pathname(&self) -> String {
        self.pathname.borrow().clone()
    }

    fn search(&self) -> String {
        self.search.borrow().clone()
    }

    fn hash(&self) -> String {
        self.hash.borrow().clone()
    }

    fn element_top(&self, id: &str) -> Option<f64> {
        self.elements
            .borrow()
            .iter()
            .find(|el| el.id == id)
            .map(|el| el.top)
    }

    fn section_top(&self, id: &str) -> Option<f64> {
        self.sections
            .borrow()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.top)
    }

    fn section_rects(&self) -> Vec<SectionRect> {
        let scroll_y = self.scroll.get().1;
        self.sections
            .borrow()
            .iter()
            .map(|s| SectionRect {
                id: s.id.clone(),
                top: s.top - scroll_y,
                bottom: s.top + s.height - scroll_y,
            })
            .collect()
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height.get()
    }

    fn active_element_id(&self) -> Option<String> {
        self.focused.borrow().clone()
    }

    fn focus(&self, id: &str) -> bool {
        let exists = self.elements.borrow().iter().any(|el| el.id == id);
        if exists {
            *self.focused.borrow_mut() = Some(id.to_owned());
        }
        exists
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion.get()
    }
}

/// Session store backed by a `HashMap`, with switches for the failure modes
/// a browser store exhibits (disabled storage, quota-exceeded writes).
#[derive(Debug)]
pub struct MemoryStore {
    map: RefCell<HashMap<String, String>>,
    available: Cell<bool>,
    fail_writes: Cell<bool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            map: RefCell::new(HashMap::new()),
            available: Cell::new(true),
            fail_writes: Cell::new(false),
        }
    }

    /// Simulate privacy mode: the store stops answering entirely.
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    /// Simulate quota exhaustion: reads keep working, writes fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Raw entry count, bypassing the adapter's bookkeeping.
    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        if !self.available.get() {
            return None;
        }
        self.map.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        if !self.available.get() || self.fail_writes.get() {
            return false;
        }
        self.map.borrow_mut().insert(key.to_owned(), value.to_owned());
        true
    }

    fn remove(&self, key: &str) {
        if self.available.get() {
            self.map.borrow_mut().remove(key);
        }
    }

    fn is_available(&self) -> bool {
        self.available.get()
    }
}

/// History state slot backed by a single cell.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    slot: RefCell<Option<String>>,
    fail: Cell<bool>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail.set(fail);
    }
}

impl HistoryStore for MemoryHistory {
    fn replace_state(&self, payload: &str) -> bool {
        if self.fail.get() {
            return false;
        }
        *self.slot.borrow_mut() = Some(payload.to_owned());
        true
    }

    fn read_state(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

struct PendingTimer {
    deadline: f64,
    callback: Box<dyn FnOnce()>,
}

/// A scheduler under manual control.
///
/// `schedule` timers fire when [`ManualScheduler::advance`] moves the clock
/// past their deadline. `sleep` resolves immediately so awaiting code runs to
/// completion in tests, but each requested delay is recorded and an optional
/// `on_sleep` hook runs first; that hook is how tests inject a layout shift
/// between the two restoration passes.
///
/// The clock starts at an arbitrary nonzero instant so captured timestamps
/// are always positive.
pub struct ManualScheduler {
    now: Cell<f64>,
    timers: RefCell<Vec<PendingTimer>>,
    sleeps: RefCell<Vec<u32>>,
    on_sleep: RefCell<Option<Box<dyn Fn(u32)>>>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            now: Cell::new(1_000.0),
            timers: RefCell::new(Vec::new()),
            sleeps: RefCell::new(Vec::new()),
            on_sleep: RefCell::new(None),
        }
    }

    /// Move the clock forward, firing every timer whose deadline passes, in
    /// scheduling order. Timers scheduled by a firing callback are honored
    /// within the same advance when they fall inside the window.
    pub fn advance(&self, ms: f64) {
        let target = self.now.get() + ms;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.deadline <= target)
                    .min_by(|(ai, a), (bi, b)| {
                        a.deadline
                            .partial_cmp(&b.deadline)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then(ai.cmp(bi))
                    })
                    .map(|(i, _)| i);
                due.map(|i| timers.remove(i))
            };
            match next {
                Some(timer) => {
                    self.now.set(timer.deadline.max(self.now.get()));
                    (timer.callback)();
                }
                None => break,
            }
        }
        self.now.set(target);
    }

    /// Number of timers still pending.
    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Every delay handed to `sleep` so far.
    pub fn requested_sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().clone()
    }

    /// Run `hook` whenever `sleep` is requested, before it resolves.
    pub fn on_sleep<F: Fn(u32) + 'static>(&self, hook: F) {
        *self.on_sleep.borrow_mut() = Some(Box::new(hook));
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now.get())
            .field("pending_timers", &self.timers.borrow().len())
            .finish()
    }
}

impl Scheduler for ManualScheduler {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    fn schedule(&self, delay_ms: u32, f: Box<dyn FnOnce()>) {
        self.timers.borrow_mut().push(PendingTimer {
            deadline: self.now.get() + f64::from(delay_ms),
            callback: f,
        });
    }

    fn sleep(&self, delay_ms: u32) -> LocalBoxFuture<'static, ()> {
        self.sleeps.borrow_mut().push(delay_ms);
        if let Some(hook) = self.on_sleep.borrow().as_ref() {
            hook(delay_ms);
        }
        Box::pin(futures_util::future::ready(()))
    }
}
