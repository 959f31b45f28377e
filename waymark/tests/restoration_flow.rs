//! End-to-end flows through the public API: capture on the way out, restore
//! on the way back, with only the in-memory environment underneath.

use std::rc::Rc;

use waymark::mem::{ManualScheduler, MemoryDom, MemoryHistory, MemoryStore};
use waymark::prelude::*;

struct Page {
    manager: NavigationManager<MemoryDom, ManualScheduler, MemoryStore, MemoryHistory>,
    dom: Rc<MemoryDom>,
}

fn page() -> Page {
    let dom = Rc::new(MemoryDom::new());
    let scheduler = Rc::new(ManualScheduler::new());
    let store = Rc::new(MemoryStore::new());
    let history = Rc::new(MemoryHistory::new());
    let manager = NavigationManager::new(Rc::clone(&dom), scheduler, store, history);
    manager.initialize();
    Page { manager, dom }
}

#[tokio::test]
async fn leaving_and_returning_restores_the_scroll_offset() {
    let page = page();
    page.dom.set_location("/test", "", "");
    page.dom.set_scroll(0.0, 500.0);

    // Leaving /test.
    let captured = page.manager.capture_state().unwrap();
    assert_eq!(captured.key, "/test");

    // Away on another route, then back.
    page.dom.set_location("/products", "", "");
    page.dom.set_scroll(0.0, 0.0);
    page.dom.set_location("/test", "", "");

    let stored = page.manager.stored_state("/test").expect("state survived");
    assert_eq!(stored.scroll_y, 500.0);

    assert!(page.manager.restore_state(stored).await);
    assert_eq!(page.dom.scroll_y(), 500.0);

    let calls = page.dom.scroll_calls();
    assert!(calls.iter().all(|c| c.y == 500.0));
}

#[tokio::test]
async fn unknown_route_restores_to_top_instead_of_failing() {
    let page = page();
    assert_eq!(page.manager.stored_state("/nonexistent"), None);

    // No snapshot: the caller falls back to a blank state, which resolves
    // to the Top tier rather than an error.
    let blank = NavigationState {
        key: "/nonexistent".to_owned(),
        scroll_y: 0.0,
        scroll_x: 0.0,
        timestamp: 1.0,
        route: "/nonexistent".to_owned(),
        hash: None,
        section_id: None,
    };
    assert!(page.manager.restore_state(blank).await);
    assert_eq!(page.dom.scroll_y(), 0.0);
}

#[tokio::test]
async fn hash_arrival_outranks_the_stored_offset() {
    let page = page();
    page.dom.set_location("/guide", "", "");
    page.dom.set_scroll(0.0, 1_000.0);
    page.manager.capture_state().unwrap();

    // Coming back to /guide#shipping with the anchor present in the DOM.
    page.dom.set_location("/guide", "", "shipping");
    page.dom.add_element("shipping", 700.0);

    let stored = page.manager.stored_state("/guide").unwrap();
    let result = page
        .manager
        .restoration_service()
        .restore_state(&stored)
        .await;
    assert_eq!(result.kind, RestorationType::Hash);
    assert_eq!(result.target_y, 604.0);
}

#[tokio::test]
async fn long_sessions_keep_only_the_newest_fifty_routes() {
    let page = page();

    for i in 0..55 {
        page.dom.set_location(&format!("/page-{i}"), "", "");
        page.dom.set_scroll(0.0, f64::from(i * 10));
        page.manager.capture_state().unwrap();
    }

    let info = page.manager.get_storage_info();
    assert_eq!(info.count, 50);
    assert_eq!(info.capacity, MAX_TRACKED_STATES);

    for i in 0..5 {
        assert_eq!(page.manager.stored_state(&format!("/page-{i}")), None);
    }
    assert!(page.manager.stored_state("/page-54").is_some());

    page.manager.clear_all_states();
    assert_eq!(page.manager.get_storage_info().count, 0);
}

#[tokio::test]
async fn section_memory_survives_when_the_offset_is_useless() {
    let page = page();
    page.dom.set_location("/catalog", "", "");
    page.dom.add_section("pepper", 300.0, 500.0);
    page.dom.set_scroll(0.0, 350.0);
    page.manager.capture_state().unwrap();

    // The page re-renders taller after the return navigation; the stored
    // offset would land in the wrong place, but the section is findable.
    let stored = page.manager.stored_state("/catalog").unwrap();
    assert_eq!(stored.section_id.as_deref(), Some("pepper"));

    page.dom.set_scroll(0.0, 0.0);
    let result = page
        .manager
        .restoration_service()
        .restore_state(&stored)
        .await;
    assert_eq!(result.kind, RestorationType::Section);
    assert_eq!(result.target_y, 204.0);
}
