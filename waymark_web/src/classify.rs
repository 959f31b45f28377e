//! Destination classification for the link layer.
//!
//! Link components call [`classify_destination`] before pushing history, and
//! feed the result to `StateCaptureService::should_capture_state`: external
//! destinations and same-route hash jumps never warrant a capture.

/// How a navigation destination relates to the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestinationClass {
    /// The destination leaves the site (other origin, or a non-navigational
    /// scheme like `mailto:`).
    pub is_external: bool,
    /// The destination is a purely in-page hash jump on the current route.
    pub is_same_hash_navigation: bool,
}

/// Classify `href` against the current origin and the current
/// `pathname?search` (as produced by `generate_state_key`).
///
/// Same-origin absolute URLs are treated as their path form; anything with a
/// foreign scheme or protocol-relative host is external.
pub fn classify_destination(origin: &str, current: &str, href: &str) -> DestinationClass {
    let rest = if !origin.is_empty() && href.starts_with(origin) {
        &href[origin.len()..]
    } else {
        href
    };

    if points_off_site(rest) {
        return DestinationClass {
            is_external: true,
            is_same_hash_navigation: false,
        };
    }

    let (base, fragment) = match rest.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (rest, None),
    };
    let same_hash = fragment.is_some() && (base.is_empty() || base == current);

    DestinationClass {
        is_external: false,
        is_same_hash_navigation: same_hash,
    }
}

// A destination is off-site when it is protocol-relative or carries a scheme
// (a ':' appearing before any '/', '?' or '#').
fn points_off_site(href: &str) -> bool {
    if href.starts_with("//") {
        return true;
    }
    match href.find([':', '/', '?', '#']) {
        Some(i) => href.as_bytes()[i] == b':',
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://exporter.example";

    #[test]
    fn foreign_origins_are_external() {
        let class = classify_destination(ORIGIN, "/products", "https://elsewhere.example/page");
        assert!(class.is_external);
        assert!(!class.is_same_hash_navigation);
    }

    #[test]
    fn non_navigational_schemes_are_external() {
        assert!(classify_destination(ORIGIN, "/", "mailto:sales@exporter.example").is_external);
        assert!(classify_destination(ORIGIN, "/", "tel:+3312345678").is_external);
        assert!(classify_destination(ORIGIN, "/", "//cdn.example/asset.js").is_external);
    }

    #[test]
    fn same_origin_absolute_urls_are_internal() {
        let class = classify_destination(ORIGIN, "/products", "https://exporter.example/blog");
        assert!(!class.is_external);
        assert!(!class.is_same_hash_navigation);
    }

    #[test]
    fn bare_fragments_are_same_route_hash_jumps() {
        let class = classify_destination(ORIGIN, "/products", "#pricing");
        assert!(!class.is_external);
        assert!(class.is_same_hash_navigation);
    }

    #[test]
    fn a_hash_on_the_current_route_is_a_hash_jump() {
        let class = classify_destination(ORIGIN, "/products", "/products#pricing");
        assert!(class.is_same_hash_navigation);

        let with_query = classify_destination(
            ORIGIN,
            "/products?category=coffee",
            "/products?category=coffee#origins",
        );
        assert!(with_query.is_same_hash_navigation);
    }

    #[test]
    fn a_hash_on_another_route_is_a_real_navigation() {
        let class = classify_destination(ORIGIN, "/products", "/about#team");
        assert!(!class.is_external);
        assert!(!class.is_same_hash_navigation);
    }

    #[test]
    fn plain_internal_paths_are_plain() {
        let class = classify_destination(ORIGIN, "/products", "/blog?page=2");
        assert!(!class.is_external);
        assert!(!class.is_same_hash_navigation);
    }
}
