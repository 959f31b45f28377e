//! Snapshot construction and capture gating.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::env::{Dom, Scheduler};
use crate::state::{NavigationState, generate_state_key};

/// Window within which repeated scroll triggers collapse to one capture.
pub const SCROLL_DEBOUNCE_MS: u32 = 150;

#[derive(Default)]
struct CaptureInner {
    initialized: bool,
    last_captured_scroll_y: Option<f64>,
    debounce_pending: bool,
    // Bumped on destroy so an already-scheduled debounce timer firing later
    // is recognized as stale and ignored.
    epoch: u64,
}

/// Builds [`NavigationState`] snapshots from the live document and decides
/// when a navigation event is worth capturing at all.
///
/// Scroll sampling is debounced: at most one effective capture per
/// [`SCROLL_DEBOUNCE_MS`] window, and only when the vertical offset actually
/// changed since the last capture; capture is position-change-gated, not
/// just time-gated.
pub struct StateCaptureService<D, S> {
    dom: Rc<D>,
    scheduler: Rc<S>,
    inner: Rc<RefCell<CaptureInner>>,
}

impl<D: Dom + 'static, S: Scheduler> StateCaptureService<D, S> {
    pub fn new(dom: Rc<D>, scheduler: Rc<S>) -> Self {
        Self {
            dom,
            scheduler,
            inner: Rc::new(RefCell::new(CaptureInner::default())),
        }
    }

    /// Start accepting captures. Idempotent; resets the memoized scroll
    /// position and any pending debounce.
    pub fn initialize(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.initialized = true;
        inner.last_captured_scroll_y = None;
        inner.debounce_pending = false;
    }

    /// Stop accepting captures and invalidate any in-flight debounce timer.
    /// Idempotent.
    pub fn destroy(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.initialized = false;
        inner.last_captured_scroll_y = None;
        inner.debounce_pending = false;
        inner.epoch += 1;
    }

    /// Snapshot the current document state. Always fully populated.
    pub fn capture_current_state(&self) -> NavigationState {
        let pathname = self.dom.pathname();
        let search = self.dom.search();
        let scroll_y = self.dom.scroll_y().max(0.0);
        let scroll_x = self.dom.scroll_x().max(0.0);
        let hash = self.dom.hash();
        let hash = hash.trim_start_matches('#');

        let state = NavigationState {
            key: generate_state_key(&pathname, &search),
            scroll_y,
            scroll_x,
            timestamp: self.scheduler.now_ms(),
            route: pathname,
            hash: (!hash.is_empty()).then(|| hash.to_owned()),
            section_id: self.current_section_id(),
        };
        self.inner.borrow_mut().last_captured_scroll_y = Some(scroll_y);
        tracing::debug!(key = %state.key, scroll_y, "captured navigation state");
        state
    }

    /// Marker of the section most visible in the viewport right now.
    ///
    /// "Most visible" is the largest intersection height with the viewport;
    /// ties go to the first section in document order. `None` when no section
    /// is present or none is on screen. Deterministic for identical
    /// document/scroll state.
    pub fn current_section_id(&self) -> Option<String> {
        let viewport = self.dom.viewport_height();
        let mut best: Option<(String, f64)> = None;
        for rect in self.dom.section_rects() {
            let visible = rect.bottom.min(viewport) - rect.top.max(0.0);
            if visible <= 0.0 {
                continue;
            }
            let beaten = best.as_ref().is_some_and(|(_, b)| *b >= visible);
            if !beaten {
                best = Some((rect.id, visible));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Whether a navigation toward `destination` warrants a capture.
    ///
    /// External destinations never do, and neither do purely in-page hash
    /// jumps on the same route.
    #[allow(clippy::unused_self)]
    pub fn should_capture_state(
        &self,
        destination: &str,
        is_external: bool,
        is_same_hash_navigation: bool,
    ) -> bool {
        if is_external {
            tracing::trace!(destination, "external destination, skipping capture");
            return false;
        }
        if is_same_hash_navigation {
            tracing::trace!(destination, "same-route hash jump, skipping capture");
            return false;
        }
        true
    }

    /// Schedule `callback` behind the debounce window.
    ///
    /// Calls landing while a window is open are dropped, so any burst
    /// collapses to at most one execution; when the timer fires, the callback
    /// only runs if the vertical scroll offset moved since the last capture.
    pub fn debounce_scroll_capture<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        let epoch = {
            let mut inner = self.inner.borrow_mut();
            if !inner.initialized || inner.debounce_pending {
                return;
            }
            inner.debounce_pending = true;
            inner.epoch
        };

        let inner = Rc::clone(&self.inner);
        let dom = Rc::clone(&self.dom);
        self.scheduler.schedule(
            SCROLL_DEBOUNCE_MS,
            Box::new(move || {
                {
                    let mut inner = inner.borrow_mut();
                    if inner.epoch != epoch {
                        return;
                    }
                    inner.debounce_pending = false;
                    let y = dom.scroll_y().max(0.0);
                    if inner.last_captured_scroll_y == Some(y) {
                        return;
                    }
                    inner.last_captured_scroll_y = Some(y);
                }
                callback();
            }),
        );
    }
}

impl<D, S> fmt::Debug for StateCaptureService<D, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("StateCaptureService")
            .field("initialized", &inner.initialized)
            .field("debounce_pending", &inner.debounce_pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::mem::{ManualScheduler, MemoryDom};

    fn service() -> (
        StateCaptureService<MemoryDom, ManualScheduler>,
        Rc<MemoryDom>,
        Rc<ManualScheduler>,
    ) {
        let dom = Rc::new(MemoryDom::new());
        let scheduler = Rc::new(ManualScheduler::new());
        let service = StateCaptureService::new(Rc::clone(&dom), Rc::clone(&scheduler));
        service.initialize();
        (service, dom, scheduler)
    }

    #[test]
    fn captured_state_is_fully_populated() {
        let (service, dom, _) = service();
        dom.set_location("/products", "category=cocoa", "");
        dom.set_scroll(12.0, 340.0);

        let state = service.capture_current_state();
        assert_eq!(state.key, "/products?category=cocoa");
        assert_eq!(state.route, "/products");
        assert_eq!(state.scroll_y, 340.0);
        assert_eq!(state.scroll_x, 12.0);
        assert!(state.timestamp > 0.0);
        assert_eq!(state.hash, None);
        assert_eq!(state.section_id, None);
    }

    #[test]
    fn capture_picks_up_hash_and_section() {
        let (service, dom, _) = service();
        dom.set_location("/about", "", "#team");
        dom.add_section("history", 0.0, 600.0);

        let state = service.capture_current_state();
        assert_eq!(state.hash.as_deref(), Some("team"));
        assert_eq!(state.section_id.as_deref(), Some("history"));
    }

    #[test]
    fn negative_scroll_offsets_are_clamped() {
        let (service, dom, _) = service();
        dom.set_scroll(-4.0, -120.0);

        let state = service.capture_current_state();
        assert_eq!(state.scroll_x, 0.0);
        assert_eq!(state.scroll_y, 0.0);
    }

    #[test]
    fn external_and_same_hash_navigations_are_not_capture_worthy() {
        let (service, _, _) = service();

        assert!(!service.should_capture_state("https://example.com", true, false));
        assert!(!service.should_capture_state("https://example.com", true, true));
        assert!(!service.should_capture_state("/products#pricing", false, true));
        assert!(service.should_capture_state("/products", false, false));
    }

    #[test]
    fn most_visible_section_wins() {
        let (service, dom, _) = service();
        // Viewport is 800px tall. First section shows its tail, second is
        // fully visible, third barely peeks in.
        dom.add_section("hero", -400.0, 600.0);
        dom.add_section("catalog", 200.0, 500.0);
        dom.add_section("contact", 750.0, 400.0);

        assert_eq!(service.current_section_id().as_deref(), Some("catalog"));
    }

    #[test]
    fn section_ties_go_to_document_order() {
        let (service, dom, _) = service();
        dom.add_section("first", 0.0, 400.0);
        dom.add_section("second", 400.0, 400.0);

        assert_eq!(service.current_section_id().as_deref(), Some("first"));
    }

    #[test]
    fn offscreen_sections_yield_none() {
        let (service, dom, _) = service();
        dom.add_section("below-the-fold", 2_000.0, 500.0);

        assert_eq!(service.current_section_id(), None);
    }

    #[test]
    fn rapid_debounce_calls_collapse_to_one() {
        let (service, dom, scheduler) = service();
        dom.set_scroll(0.0, 250.0);
        let calls = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let calls = Rc::clone(&calls);
            service.debounce_scroll_capture(move || calls.set(calls.get() + 1));
        }

        assert_eq!(calls.get(), 0);
        scheduler.advance(200.0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unchanged_scroll_position_never_fires_the_callback() {
        let (service, dom, scheduler) = service();
        dom.set_scroll(0.0, 250.0);
        service.capture_current_state();

        let calls = Rc::new(Cell::new(0));
        let calls_in = Rc::clone(&calls);
        service.debounce_scroll_capture(move || calls_in.set(calls_in.get() + 1));
        scheduler.advance(200.0);

        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn a_new_window_opens_after_the_previous_fires() {
        let (service, dom, scheduler) = service();
        dom.set_scroll(0.0, 100.0);
        let calls = Rc::new(Cell::new(0));

        let calls_in = Rc::clone(&calls);
        service.debounce_scroll_capture(move || calls_in.set(calls_in.get() + 1));
        scheduler.advance(200.0);
        assert_eq!(calls.get(), 1);

        dom.set_scroll(0.0, 400.0);
        let calls_in = Rc::clone(&calls);
        service.debounce_scroll_capture(move || calls_in.set(calls_in.get() + 1));
        scheduler.advance(200.0);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn destroy_invalidates_a_pending_timer() {
        let (service, dom, scheduler) = service();
        dom.set_scroll(0.0, 500.0);
        let calls = Rc::new(Cell::new(0));

        let calls_in = Rc::clone(&calls);
        service.debounce_scroll_capture(move || calls_in.set(calls_in.get() + 1));
        service.destroy();
        scheduler.advance(300.0);

        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn lifecycle_is_idempotent() {
        let (service, _, _) = service();
        service.initialize();
        service.initialize();
        service.destroy();
        service.destroy();

        // A destroyed service drops debounce requests outright.
        let calls = Rc::new(Cell::new(0));
        let calls_in = Rc::clone(&calls);
        service.debounce_scroll_capture(move || calls_in.set(calls_in.get() + 1));
        assert_eq!(calls.get(), 0);
    }
}
