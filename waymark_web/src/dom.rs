//! `web-sys` binding of the `Dom` trait.

use wasm_bindgen::JsCast;
use web_sys::{ScrollBehavior, ScrollToOptions};

use waymark::env::{Dom, SectionRect};

/// Attribute that marks a content section; its value is the section id
/// (falling back to the element's own id when the value is empty).
pub const SECTION_ATTRIBUTE: &str = "data-section";

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// The live document and window. Stateless; every call reads the DOM fresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserDom;

impl BrowserDom {
    pub fn new() -> Self {
        Self
    }

    fn window() -> Option<web_sys::Window> {
        web_sys::window()
    }

    fn document() -> Option<web_sys::Document> {
        Self::window().and_then(|w| w.document())
    }

    fn document_top(element: &web_sys::Element) -> f64 {
        let viewport_top = element.get_bounding_client_rect().top();
        let scroll_y = Self::window().and_then(|w| w.scroll_y().ok()).unwrap_or(0.0);
        viewport_top + scroll_y
    }

    fn section_marker(element: &web_sys::Element) -> Option<String> {
        let marker = element
            .get_attribute(SECTION_ATTRIBUTE)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| element.id());
        (!marker.is_empty()).then_some(marker)
    }

    fn sections() -> Vec<web_sys::Element> {
        let Some(document) = Self::document() else {
            return Vec::new();
        };
        let Ok(list) = document.query_selector_all(&format!("[{SECTION_ATTRIBUTE}]")) else {
            return Vec::new();
        };
        let mut elements = Vec::with_capacity(list.length() as usize);
        for i in 0..list.length() {
            if let Some(node) = list.item(i) {
                if let Some(element) = node.dyn_ref::<web_sys::Element>() {
                    elements.push(element.clone());
                }
            }
        }
        elements
    }
}

impl Dom for BrowserDom {
    fn scroll_x(&self) -> f64 {
        Self::window().and_then(|w| w.scroll_x().ok()).unwrap_or(0.0)
    }

    fn scroll_y(&self) -> f64 {
        Self::window().and_then(|w| w.scroll_y().ok()).unwrap_or(0.0)
    }

    fn scroll_to(&self, x: f64, y: f64, smooth: bool) -> bool {
        let Some(window) = Self::window() else {
            return false;
        };
        let options = ScrollToOptions::new();
        options.set_left(x);
        options.set_top(y);
        options.set_behavior(if smooth {
            ScrollBehavior::Smooth
        } else {
            ScrollBehavior::Auto
        });
        window.scroll_to_with_scroll_to_options(&options);
        true
    }

    fn pathname(&self) -> String {
        Self::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_else(|| "/".to_owned())
    }

    fn search(&self) -> String {
        Self::window()
            .and_then(|w| w.location().search().ok())
            .map(|s| s.trim_start_matches('?').to_owned())
            .unwrap_or_default()
    }

    fn hash(&self) -> String {
        Self::window()
            .and_then(|w| w.location().hash().ok())
            .map(|h| h.trim_start_matches('#').to_owned())
            .unwrap_or_default()
    }

    fn element_top(&self, id: &str) -> Option<f64> {
        let element = Self::document()?.get_element_by_id(id)?;
        Some(Self::document_top(&element))
    }

    fn section_top(&self, id: &str) -> Option<f64> {
        Self::sections()
            .iter()
            .find(|el| Self::section_marker(el).as_deref() == Some(id))
            .map(Self::document_top)
    }

    fn section_rects(&self) -> Vec<SectionRect> {
        Self::sections()
            .iter()
            .filter_map(|element| {
                let id = Self::section_marker(element)?;
                let rect = element.get_bounding_client_rect();
                Some(SectionRect {
                    id,
                    top: rect.top(),
                    bottom: rect.bottom(),
                })
            })
            .collect()
    }

    fn viewport_height(&self) -> f64 {
        Self::window()
            .and_then(|w| w.inner_height().ok())
            .and_then(|h| h.as_f64())
            .unwrap_or(0.0)
    }

    fn active_element_id(&self) -> Option<String> {
        let element = Self::document()?.active_element()?;
        let id = element.id();
        (!id.is_empty()).then_some(id)
    }

    fn focus(&self, id: &str) -> bool {
        let Some(document) = Self::document() else {
            return false;
        };
        let Some(element) = document.get_element_by_id(id) else {
            return false;
        };
        match element.dyn_ref::<web_sys::HtmlElement>() {
            Some(html) => html.focus().is_ok(),
            None => false,
        }
    }

    fn prefers_reduced_motion(&self) -> bool {
        Self::window()
            .and_then(|w| w.match_media(REDUCED_MOTION_QUERY).ok())
            .flatten()
            .is_some_and(|query| query.matches())
    }
}
