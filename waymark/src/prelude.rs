pub use crate::capture::{SCROLL_DEBOUNCE_MS, StateCaptureService};
pub use crate::env::{Dom, HistoryStore, Scheduler, SectionRect, SessionStore};
pub use crate::focus::FocusManager;
pub use crate::manager::NavigationManager;
pub use crate::restore::{
    DEFAULT_HEADER_HEIGHT_PX, SCROLL_MARGIN_PX, SETTLE_DELAY_MS, StateRestorationService,
};
pub use crate::state::{
    NavigationState, RestorationResult, RestorationType, StorageInfo, generate_state_key,
};
pub use crate::storage::{MAX_TRACKED_STATES, StorageAdapter};
