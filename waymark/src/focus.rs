//! Keyboard-focus capture and restoration, independent of scroll state.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::env::Dom;

/// Remembers which interactive element held focus when a snapshot was taken
/// and puts focus back on it after the return navigation.
///
/// The focus id travels alongside a [`crate::state::NavigationState`] rather
/// than inside it: it is captured at the same moment and consumed exactly
/// once during restoration.
pub struct FocusManager<D> {
    dom: Rc<D>,
    captured: RefCell<Option<String>>,
}

impl<D: Dom> FocusManager<D> {
    pub fn new(dom: Rc<D>) -> Self {
        Self {
            dom,
            captured: RefCell::new(None),
        }
    }

    /// Record and return the id of the currently focused element.
    ///
    /// `None` when nothing is focused or the focused element has no id; a
    /// `None` capture clears any previously remembered id.
    pub fn capture_focus(&self) -> Option<String> {
        let id = self.dom.active_element_id();
        self.captured.borrow_mut().clone_from(&id);
        id
    }

    /// Hand out the remembered id, at most once per capture.
    pub fn take_captured(&self) -> Option<String> {
        self.captured.borrow_mut().take()
    }

    /// Move focus to the element with the given id.
    ///
    /// A missing target is an expected, silent outcome (`false`), not an
    /// error; no other focus state is touched.
    pub fn restore_focus(&self, id: &str) -> bool {
        self.dom.focus(id)
    }
}

impl<D> fmt::Debug for FocusManager<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusManager")
            .field("captured", &self.captured.borrow())
            .finish()
    }
}
