//! Page-level wiring: a global manager plus the scroll/popstate listeners.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::AddEventListenerOptions;

use waymark::env::Dom;
use waymark::state::{NavigationState, generate_state_key};
use waymark::NavigationManager;

use crate::classify::classify_destination;
use crate::dom::BrowserDom;
use crate::scheduler::BrowserScheduler;
use crate::session::{BrowserHistory, SessionStorageStore};

/// The manager type produced by [`install`].
pub type PageManager =
    NavigationManager<BrowserDom, BrowserScheduler, SessionStorageStore, BrowserHistory>;

thread_local! {
    static MANAGER: RefCell<Option<Rc<PageManager>>> = const { RefCell::new(None) };
}

/// Build the page-global manager, initialize it, and attach the listeners.
/// Calling it again is a no-op; the first installation wins.
pub fn install() {
    let already = MANAGER.with(|slot| slot.borrow().is_some());
    if already {
        return;
    }

    let dom = Rc::new(BrowserDom::new());
    let manager = Rc::new(NavigationManager::new(
        dom,
        Rc::new(BrowserScheduler::new()),
        Rc::new(SessionStorageStore::new()),
        Rc::new(BrowserHistory::new()),
    ));
    manager.initialize();
    attach_listeners(&manager);
    MANAGER.with(|slot| *slot.borrow_mut() = Some(manager));
}

/// The installed page-global manager, if [`install`] has run.
pub fn manager() -> Option<Rc<PageManager>> {
    MANAGER.with(|slot| slot.borrow().clone())
}

/// Tear the page-global manager down (test hook; listeners stay attached but
/// turn into no-ops through the readiness gate).
pub fn uninstall() {
    MANAGER.with(|slot| {
        if let Some(manager) = slot.borrow_mut().take() {
            manager.destroy();
        }
    });
}

/// Hook for the link layer: call with the destination `href` before pushing
/// history. Captures outgoing state when the destination warrants it and
/// returns the snapshot that was captured.
pub fn navigate_hint(href: &str) -> Option<NavigationState> {
    let manager = manager()?;
    let dom = BrowserDom::new();
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default();
    let current = generate_state_key(&dom.pathname(), &dom.search());

    let class = classify_destination(&origin, &current, href);
    if !manager
        .capture_service()
        .should_capture_state(href, class.is_external, class.is_same_hash_navigation)
    {
        return None;
    }
    manager.capture_state()
}

/// Kick off restoration for wherever the document currently points. Called
/// by the popstate listener; also callable by a router once its route
/// transition has committed.
pub fn restore_current_location() {
    let Some(manager) = manager() else {
        return;
    };
    restore_current(&manager);
}

fn restore_current(manager: &Rc<PageManager>) {
    let dom = BrowserDom::new();
    let key = generate_state_key(&dom.pathname(), &dom.search());

    // The history entry travels with back/forward and wins when it matches
    // this location; the session store covers everything else. With neither,
    // a blank snapshot resolves through the normal chain (hash or top).
    let state = manager
        .history_state()
        .filter(|s| s.key == key)
        .or_else(|| manager.stored_state(&key))
        .unwrap_or_else(|| NavigationState {
            key: key.clone(),
            scroll_y: 0.0,
            scroll_x: 0.0,
            timestamp: js_sys::Date::now(),
            route: dom.pathname(),
            hash: None,
            section_id: None,
        });

    let manager = Rc::clone(manager);
    wasm_bindgen_futures::spawn_local(async move {
        manager.restore_state(state).await;
    });
}

fn attach_listeners(manager: &Rc<PageManager>) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let scroll_manager = Rc::clone(manager);
    let on_scroll = Closure::wrap(Box::new(move |_event: web_sys::Event| {
        let capture = Rc::clone(&scroll_manager);
        scroll_manager
            .capture_service()
            .debounce_scroll_capture(move || {
                capture.capture_state();
            });
    }) as Box<dyn FnMut(web_sys::Event)>);
    let options = AddEventListenerOptions::new();
    options.set_passive(true);
    if let Err(err) = window.add_event_listener_with_callback_and_add_event_listener_options(
        "scroll",
        on_scroll.as_ref().unchecked_ref(),
        &options,
    ) {
        web_sys::console::warn_1(&err);
    }
    on_scroll.forget();

    let pop_manager = Rc::clone(manager);
    let on_popstate = Closure::wrap(Box::new(move |_event: web_sys::PopStateEvent| {
        restore_current(&pop_manager);
    }) as Box<dyn FnMut(web_sys::PopStateEvent)>);
    if let Err(err) = window
        .add_event_listener_with_callback("popstate", on_popstate.as_ref().unchecked_ref())
    {
        web_sys::console::warn_1(&err);
    }
    on_popstate.forget();
}
