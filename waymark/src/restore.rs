//! Restoration strategy resolution and execution.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::env::{Dom, Scheduler};
use crate::state::{NavigationState, RestorationResult, RestorationType};

/// Breathing room left between the header allowance and an element target.
pub const SCROLL_MARGIN_PX: f64 = 16.0;

/// Default allowance for a fixed page header when targeting an element.
pub const DEFAULT_HEADER_HEIGHT_PX: f64 = 80.0;

/// Delay before the settle pass re-applies the restoration target.
pub const SETTLE_DELAY_MS: u32 = 100;

/// Decides how to restore position on arrival at a route and carries it out.
///
/// Strategy selection is a strict fallback chain (hash target, remembered
/// section, stored scroll offset, top of page), and a target element that
/// disappeared since capture falls through to the next tier instead of
/// erroring. Execution runs in two passes: an immediate application, then a
/// re-resolved re-application after [`SETTLE_DELAY_MS`] to absorb layout
/// shifts from late-loading content.
pub struct StateRestorationService<D, S> {
    dom: Rc<D>,
    scheduler: Rc<S>,
    header_height: Cell<f64>,
}

impl<D: Dom, S: Scheduler> StateRestorationService<D, S> {
    pub fn new(dom: Rc<D>, scheduler: Rc<S>) -> Self {
        Self {
            dom,
            scheduler,
            header_height: Cell::new(DEFAULT_HEADER_HEIGHT_PX),
        }
    }

    /// Adjust the fixed-header allowance used for element targets.
    pub fn with_header_height(self, px: f64) -> Self {
        self.header_height.set(px);
        self
    }

    /// Scroll-target Y for an element whose document-relative top is
    /// `element_top`: the top minus the header allowance minus
    /// [`SCROLL_MARGIN_PX`], floored at zero.
    pub fn calculate_element_offset(&self, element_top: f64) -> f64 {
        (element_top - self.header_height.get() - SCROLL_MARGIN_PX).max(0.0)
    }

    /// Animated scrolling is a presentation detail; it is switched off when
    /// the user asked for reduced motion. The destination is identical
    /// either way.
    pub fn should_use_smooth(&self) -> bool {
        !self.dom.prefers_reduced_motion()
    }

    /// Resolve which tier of the fallback chain applies for `state` and the
    /// incoming URL's hash.
    pub fn determine_priority(
        &self,
        state: &NavigationState,
        incoming_hash: &str,
    ) -> RestorationType {
        self.resolve(state, incoming_hash).0
    }

    fn resolve(&self, state: &NavigationState, incoming_hash: &str) -> (RestorationType, f64, f64) {
        let hash = incoming_hash.trim_start_matches('#');
        if !hash.is_empty() {
            if let Some(top) = self.dom.element_top(hash) {
                return (RestorationType::Hash, 0.0, self.calculate_element_offset(top));
            }
        }
        if let Some(section) = state.section_id.as_deref() {
            if let Some(top) = self.dom.section_top(section) {
                return (
                    RestorationType::Section,
                    0.0,
                    self.calculate_element_offset(top),
                );
            }
        }
        if state.scroll_y > 0.0 {
            return (
                RestorationType::Scroll,
                state.scroll_x.max(0.0),
                state.scroll_y,
            );
        }
        (RestorationType::Top, 0.0, 0.0)
    }

    // Re-resolve the target for an already-chosen strategy. Element lookups
    // happen fresh so the settle pass tracks layout shifts; a target that
    // vanished since the strategy was chosen degrades down the chain.
    fn resolve_target(
        &self,
        state: &NavigationState,
        kind: RestorationType,
    ) -> (RestorationType, f64, f64) {
        match kind {
            RestorationType::Hash => self.resolve(state, &self.dom.hash()),
            RestorationType::Section => self.resolve(state, ""),
            RestorationType::Scroll => (
                RestorationType::Scroll,
                state.scroll_x.max(0.0),
                state.scroll_y.max(0.0),
            ),
            RestorationType::Top => (RestorationType::Top, 0.0, 0.0),
        }
    }

    fn apply(&self, state: &NavigationState, kind: RestorationType) -> RestorationResult {
        let (kind, x, y) = self.resolve_target(state, kind);
        let success = self.dom.scroll_to(x, y, self.should_use_smooth());
        RestorationResult {
            success,
            kind,
            target_y: y,
        }
    }

    /// Restore position for `state` on the current document.
    ///
    /// Resolves the strategy against the incoming URL's hash and executes it
    /// through the two-pass mechanism. "Nothing to restore" is a valid
    /// outcome: the Top tier resolves `success: true` with `target_y: 0`.
    /// `success: false` is reserved for an unusable scroll API.
    pub async fn restore_state(&self, state: &NavigationState) -> RestorationResult {
        let incoming = self.dom.hash();
        let kind = self.determine_priority(state, &incoming);
        tracing::debug!(key = %state.key, ?kind, "restoring navigation state");
        self.perform_two_pass_restoration(state, kind).await
    }

    /// Execute `kind` now, then once more after the settle delay.
    ///
    /// The first pass handles the common case where layout is already
    /// stable; the second compensates for content that loads after first
    /// paint and shifts the target. Both passes aim at the same element or
    /// offset, so the re-application is a no-op when nothing moved.
    pub async fn perform_two_pass_restoration(
        &self,
        state: &NavigationState,
        kind: RestorationType,
    ) -> RestorationResult {
        let first = self.apply(state, kind);
        self.scheduler.sleep(SETTLE_DELAY_MS).await;
        let second = self.apply(state, kind);
        if second.target_y != first.target_y {
            tracing::debug!(
                from = first.target_y,
                to = second.target_y,
                "settle pass corrected for a layout shift"
            );
        }
        second
    }
}

impl<D, S> fmt::Debug for StateRestorationService<D, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateRestorationService")
            .field("header_height", &self.header_height.get())
            .finish()
    }
}
