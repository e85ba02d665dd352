//! Per-request upstream routing and credentials.
//!
//! Every proxied handler takes an [`UpstreamContext`] argument, so the org
//! and token live only as long as the request that supplied them.

use std::fmt;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::proxy::transform::{org_base_url, rewrite_url};
use crate::AppState;

pub const ORG_HEADER: &str = "x-apigee-org";
pub const AUTHORIZATION_HEADER: &str = "authorization";

#[derive(Clone)]
pub struct UpstreamContext {
    org: String,
    base_url: String,
    auth_token: String,
}

impl UpstreamContext {
    /// Validates the routing headers and derives the org-scoped base URL.
    /// The org header is checked first.
    pub fn from_headers(upstream_root: &str, headers: &HeaderMap) -> Result<Self, AppError> {
        let org = header_str(headers, ORG_HEADER).ok_or(AppError::MissingOrganization)?;
        let auth_token =
            header_str(headers, AUTHORIZATION_HEADER).ok_or(AppError::MissingAuthorization)?;

        let base_url = org_base_url(upstream_root, org);
        tracing::debug!("This is the upstream base url: {}", base_url);

        Ok(Self {
            org: org.to_string(),
            base_url,
            auth_token: auth_token.to_string(),
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Value forwarded verbatim as the upstream `Authorization` header.
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn url(&self, path_suffix: &str) -> String {
        rewrite_url(&self.base_url, path_suffix)
    }
}

impl fmt::Debug for UpstreamContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamContext")
            .field("org", &self.org)
            .field("base_url", &self.base_url)
            .field("auth_token", &mask(&self.auth_token))
            .finish()
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for UpstreamContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        UpstreamContext::from_headers(&state.config.upstream_root, &parts.headers)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
}

/// Keeps the first and last four characters of long secrets for log
/// correlation; short ones are hidden entirely.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const ROOT: &str = "https://api.enterprise.apigee.com/v1/o/";

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn test_context_from_valid_headers() {
        let ctx = UpstreamContext::from_headers(
            ROOT,
            &headers(&[("x-apigee-org", "acme"), ("authorization", "Bearer t1")]),
        )
        .unwrap();

        assert_eq!(ctx.org(), "acme");
        assert_eq!(ctx.base_url(), "https://api.enterprise.apigee.com/v1/o//acme");
        assert_eq!(ctx.auth_token(), "Bearer t1");
        assert_eq!(
            ctx.url("/apps"),
            "https://api.enterprise.apigee.com/v1/o//acme/apps"
        );
    }

    #[test]
    fn test_missing_org_header() {
        let err = UpstreamContext::from_headers(ROOT, &headers(&[("authorization", "Bearer t1")]))
            .unwrap_err();
        assert!(matches!(err, AppError::MissingOrganization));
    }

    #[test]
    fn test_org_checked_before_authorization() {
        let err = UpstreamContext::from_headers(ROOT, &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AppError::MissingOrganization));
    }

    #[test]
    fn test_blank_org_header_is_missing() {
        let err = UpstreamContext::from_headers(
            ROOT,
            &headers(&[("x-apigee-org", "  "), ("authorization", "Bearer t1")]),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::MissingOrganization));
    }

    #[test]
    fn test_missing_authorization_header() {
        let err = UpstreamContext::from_headers(ROOT, &headers(&[("x-apigee-org", "acme")]))
            .unwrap_err();
        assert!(matches!(err, AppError::MissingAuthorization));
    }

    #[test]
    fn test_authorization_forwarded_verbatim() {
        let ctx = UpstreamContext::from_headers(
            ROOT,
            &headers(&[("x-apigee-org", "acme"), ("authorization", "Basic dXNlcjpwYXNz")]),
        )
        .unwrap();
        assert_eq!(ctx.auth_token(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_debug_masks_token() {
        let ctx = UpstreamContext::from_headers(
            ROOT,
            &headers(&[
                ("x-apigee-org", "acme"),
                ("authorization", "Bearer abcdefghijklmnop"),
            ]),
        )
        .unwrap();
        let rendered = format!("{:?}", ctx);
        assert!(!rendered.contains("abcdefghijklmnop"));
        assert!(rendered.contains("Bear…mnop"));
    }
}
