//! URL construction for management API calls.
//!
//! Org segment and route parameters are joined here so handlers never build
//! upstream URLs by hand.

/// Org-scoped base: `root + "/" + org`. The root is used exactly as
/// configured, so the default root's trailing slash yields `.../o//org`.
pub fn org_base_url(upstream_root: &str, org: &str) -> String {
    format!("{}/{}", upstream_root, org)
}

/// Appends a path suffix (which carries its own leading slash) to a base.
pub fn rewrite_url(upstream_base: &str, path_suffix: &str) -> String {
    format!("{}{}", upstream_base, path_suffix)
}

/// Percent-encodes a route parameter so it stays a single path segment.
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
