//! HTTP client for the management API.
//! One pooled `reqwest::Client` is shared by every request; per-request
//! routing and credentials arrive as an `UpstreamContext`. No retries.
use anyhow::Context;
use axum::body::Bytes;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::errors::AppError;
use crate::middleware::context::UpstreamContext;

pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(32)
            .timeout(cfg.upstream_timeout)
            .connect_timeout(cfg.upstream_connect_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// GET `ctx.base_url + path_suffix` and parse the JSON body.
    pub async fn call(&self, ctx: &UpstreamContext, path_suffix: &str) -> Result<Value, AppError> {
        self.send(ctx, Method::GET, path_suffix, None, Bytes::new())
            .await
    }

    /// Like [`call`](Self::call), decoding into `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        ctx: &UpstreamContext,
        path_suffix: &str,
    ) -> Result<T, AppError> {
        let value = self.call(ctx, path_suffix).await?;
        serde_json::from_value(value)
            .map_err(|e| AppError::MalformedResponse(format!("{}: {}", path_suffix, e)))
    }

    /// Replays an inbound request against the management API, keeping its
    /// method, path, query and body.
    pub async fn forward(
        &self,
        ctx: &UpstreamContext,
        method: Method,
        path_and_query: &str,
        content_type: Option<HeaderValue>,
        body: Bytes,
    ) -> Result<Value, AppError> {
        self.send(ctx, method, path_and_query, content_type, body)
            .await
    }

    async fn send(
        &self,
        ctx: &UpstreamContext,
        method: Method,
        path_suffix: &str,
        content_type: Option<HeaderValue>,
        body: Bytes,
    ) -> Result<Value, AppError> {
        let url = ctx.url(path_suffix);
        tracing::info!("Calling API with url: {} {}", method, url);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(ctx.auth_token()).map_err(|_| AppError::MissingAuthorization)?,
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let mut request = self.client.request(method, &url).headers(headers);
        if !body.is_empty() {
            if let Some(ct) = content_type {
                request = request.header(header::CONTENT_TYPE, ct);
            }
            request = request.body(body);
        }

        let resp = request.send().await.map_err(transport_error)?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(transport_error)?;

        tracing::debug!("URL {}: responded {} ({} bytes)", url, status, bytes.len());

        if !status.is_success() {
            tracing::warn!("Upstream {} returned {}", url, status);
            return Err(AppError::upstream(status, &bytes));
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::MalformedResponse(format!("{}: body is not JSON: {}", path_suffix, e)))
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        tracing::warn!("Upstream request timed out: {}", e);
        AppError::UpstreamTimeout
    } else {
        tracing::warn!("Upstream request failed: {}", e);
        AppError::UpstreamUnreachable(e.to_string())
    }
}
