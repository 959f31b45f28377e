//! `setTimeout`-backed binding of the `Scheduler` trait.

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use waymark::env::Scheduler;
use waymark::futures_util::future::LocalBoxFuture;

/// Timers via `window.setTimeout`, instants via `Date.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserScheduler;

impl BrowserScheduler {
    pub fn new() -> Self {
        Self
    }

    fn set_timeout(callback: &js_sys::Function, delay_ms: u32) {
        if let Some(window) = web_sys::window() {
            if let Err(err) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback,
                delay_ms as i32,
            ) {
                web_sys::console::warn_1(&err);
            }
        }
    }
}

impl Scheduler for BrowserScheduler {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    fn schedule(&self, delay_ms: u32, f: Box<dyn FnOnce()>) {
        let closure = Closure::once(f);
        Self::set_timeout(closure.as_ref().unchecked_ref(), delay_ms);
        // The browser owns the timer now; the closure must outlive this call.
        closure.forget();
    }

    fn sleep(&self, delay_ms: u32) -> LocalBoxFuture<'static, ()> {
        Box::pin(async move {
            let promise = js_sys::Promise::new(&mut |resolve, _reject| {
                Self::set_timeout(&resolve, delay_ms);
            });
            let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
        })
    }
}
