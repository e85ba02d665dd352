//! Credential-scrubbing reverse proxy for the Apigee Edge management API.
//!
//! Library crate: the binary in `main.rs` and the integration tests in
//! `tests/` both build the router from here.

pub mod api;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod proxy;

/// Shared application state passed to handlers and middleware.
///
/// Read-only after startup: per-request org and token never live here.
pub struct AppState {
    pub config: config::Config,
    pub upstream: proxy::upstream::UpstreamClient,
}

impl AppState {
    pub fn new(config: config::Config) -> anyhow::Result<Self> {
        let upstream = proxy::upstream::UpstreamClient::new(&config)?;
        Ok(Self { config, upstream })
    }
}
