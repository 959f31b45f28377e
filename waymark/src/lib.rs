#![allow(missing_docs)]

//! Scroll, section, and focus restoration for client-side navigation.
//!
//! waymark makes the position a visitor left a route in (scroll offsets, the
//! section they were reading, the control they had focused) durable across
//! client-side navigations, and puts it back accurately once the destination
//! document is ready:
//!
//! - snapshots are captured per navigation point and stored twice (session
//!   store + history entry), bounded at 50 entries with FIFO eviction;
//! - scroll sampling is debounced to one effective capture per 150 ms, and
//!   only when the position actually moved;
//! - restoration resolves a strict priority chain (URL hash > remembered
//!   section > stored offset > top) and applies it in two passes so
//!   late-loading content cannot leave the viewport in the wrong place;
//! - concurrent capture/restore requests are serialized strictly FIFO.
//!
//! Every browser touchpoint goes through the traits in [`env`], so the whole
//! engine runs (and is tested) without a browser; the `waymark_web` crate
//! binds those traits to `web-sys` and wires up page listeners.

pub use futures_util;

pub mod capture;
pub mod env;
pub mod focus;
pub mod manager;
pub mod mem;
pub mod prelude;
mod queue;
pub mod restore;
pub mod state;
pub mod storage;

pub use manager::NavigationManager;
pub use state::{NavigationState, RestorationResult, RestorationType, StorageInfo};
