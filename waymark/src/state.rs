use serde::{Deserialize, Serialize};

/// Derive the canonical storage key for a navigation point.
///
/// The key is a pure function of the location: the pathname alone when the
/// query string is empty, otherwise `pathname?search`. The same inputs always
/// produce the same key, which is what makes stored snapshots addressable on
/// the return navigation.
pub fn generate_state_key(pathname: &str, search: &str) -> String {
    if search.is_empty() {
        pathname.to_owned()
    } else {
        format!("{pathname}?{search}")
    }
}

/// A snapshot of one navigation point: where the viewport was, which route it
/// belonged to, and (optionally) the in-page anchor and dominant section at
/// capture time.
///
/// Snapshots are immutable once captured; a new navigation produces a new
/// snapshot, and re-saving a key replaces the stored value wholesale. The
/// serialized form is camelCase JSON, which is what ends up in the session
/// store and the history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    /// Canonical identifier, from [`generate_state_key`].
    pub key: String,
    /// Vertical scroll offset at capture time, always >= 0.
    pub scroll_y: f64,
    /// Horizontal scroll offset at capture time, always >= 0.
    pub scroll_x: f64,
    /// Capture instant in milliseconds.
    pub timestamp: f64,
    /// Pathname the snapshot belongs to.
    pub route: String,
    /// In-page anchor fragment active at capture time, without the leading `#`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Marker of the dominant visible section at capture time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
}

impl NavigationState {
    /// Serialize to the JSON form stored in the session store and history entry.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a stored JSON form back into a snapshot.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Strategy selected to restore position on arrival at a route.
///
/// The variants are a strict fallback chain: a hash target wins over a
/// remembered section, which wins over a plain scroll offset, which wins over
/// the top of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorationType {
    /// Scroll to the element named by the incoming URL fragment.
    Hash,
    /// Scroll to the section remembered in the snapshot.
    Section,
    /// Scroll to the stored offsets.
    Scroll,
    /// Scroll to the top of the page.
    Top,
}

/// Outcome of one restoration attempt. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestorationResult {
    /// Whether the scroll was applied. `false` only when the scroll API
    /// itself is unusable; "nothing to restore" resolves as a successful
    /// [`RestorationType::Top`].
    pub success: bool,
    /// Strategy that was actually executed.
    pub kind: RestorationType,
    /// Vertical offset the restoration targeted.
    pub target_y: f64,
}

/// Diagnostic view of the session-scoped store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageInfo {
    /// Number of snapshots currently stored.
    pub count: usize,
    /// Maximum number of snapshots kept before FIFO eviction kicks in.
    pub capacity: usize,
    /// Whether the underlying session store is usable at all.
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(key: &str) -> NavigationState {
        NavigationState {
            key: key.to_owned(),
            scroll_y: 500.0,
            scroll_x: 0.0,
            timestamp: 1_700.0,
            route: key.to_owned(),
            hash: None,
            section_id: None,
        }
    }

    #[test]
    fn key_includes_query_string_when_present() {
        assert_eq!(
            generate_state_key("/products", "category=electronics"),
            "/products?category=electronics"
        );
    }

    #[test]
    fn key_is_pathname_when_search_empty() {
        assert_eq!(generate_state_key("/products", ""), "/products");
        assert_eq!(generate_state_key("/about", ""), "/about");
    }

    #[test]
    fn key_is_deterministic() {
        let a = generate_state_key("/blog", "page=2");
        let b = generate_state_key("/blog", "page=2");
        assert_eq!(a, b);
    }

    #[test]
    fn json_round_trip_preserves_optional_fields() {
        let mut state = snapshot("/products?page=2");
        state.hash = Some("pricing".to_owned());
        state.section_id = Some("catalog".to_owned());

        let json = state.to_json().unwrap();
        let restored = NavigationState::from_json(&json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn json_omits_absent_optionals_and_uses_camel_case() {
        let json = snapshot("/about").to_json().unwrap();
        assert!(json.contains("\"scrollY\""));
        assert!(!json.contains("\"sectionId\""));
        assert!(!json.contains("\"hash\""));

        let restored = NavigationState::from_json(&json).unwrap();
        assert_eq!(restored.hash, None);
        assert_eq!(restored.section_id, None);
    }

    #[test]
    fn malformed_json_is_an_error_not_a_panic() {
        assert!(NavigationState::from_json("not json").is_err());
        assert!(NavigationState::from_json("{}").is_err());
    }
}
