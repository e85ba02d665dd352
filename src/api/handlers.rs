use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, Method, Uri},
    Json,
};
use futures::{StreamExt, TryStreamExt};
use serde_json::Value;

use crate::api::extract::{Path, Query};
use crate::errors::AppError;
use crate::middleware::context::UpstreamContext;
use crate::middleware::redact::{redact, scrub_secrets};
use crate::models::app::{App, AppSummary};
use crate::proxy::stats::{stats_path, StatsParams};
use crate::proxy::transform::segment;
use crate::AppState;

// ── Handlers ─────────────────────────────────────────────────

/// GET /healthz — liveness only; never touches the management API.
pub async fn healthz() -> &'static str {
    "ok"
}

/// GET /apps — name/appId of every app in the org, in listing order.
///
/// Each app is fetched (and redacted) individually; fetches overlap up to the
/// configured concurrency, and `buffered` hands results back in input order.
#[tracing::instrument(skip(state, ctx), fields(org = %ctx.org()))]
pub async fn list_apps(
    State(state): State<Arc<AppState>>,
    ctx: UpstreamContext,
) -> Result<Json<Vec<AppSummary>>, AppError> {
    tracing::info!("Entering /apps request");

    let app_ids: Vec<String> = state.upstream.call_as(&ctx, "/apps").await?;

    let apps: Vec<App> = futures::stream::iter(app_ids)
        .map(|id| {
            let state = state.clone();
            let ctx = ctx.clone();
            async move { fetch_app(&state, &ctx, &id).await }
        })
        .buffered(state.config.app_fetch_concurrency.max(1))
        .try_collect()
        .await?;

    tracing::debug!("Apps fetched: {}", apps.len());
    Ok(Json(apps.iter().map(AppSummary::from).collect()))
}

/// GET /apps/:appName
#[tracing::instrument(skip(state, ctx), fields(org = %ctx.org()))]
pub async fn get_app(
    State(state): State<Arc<AppState>>,
    ctx: UpstreamContext,
    Path(app_name): Path<String>,
) -> Result<Json<App>, AppError> {
    tracing::info!("Entering /apps/:appName request");
    let app: App = state
        .upstream
        .call_as(&ctx, &format!("/apps/{}", segment(&app_name)))
        .await?;
    Ok(Json(redact(app)))
}

/// GET /developers/:developer/apps/:appName
#[tracing::instrument(skip(state, ctx), fields(org = %ctx.org()))]
pub async fn get_developer_app(
    State(state): State<Arc<AppState>>,
    ctx: UpstreamContext,
    Path((developer, app_name)): Path<(String, String)>,
) -> Result<Json<App>, AppError> {
    tracing::info!("Entering /developers/{}/apps/{} request", developer, app_name);
    let app: App = state
        .upstream
        .call_as(
            &ctx,
            &format!(
                "/developers/{}/apps/{}",
                segment(&developer),
                segment(&app_name)
            ),
        )
        .await?;
    let app = redact(app);
    tracing::debug!("App fetched: {}", app.app_id);
    Ok(Json(app))
}

/// GET /environments/:env/stats/:dimension?hours=N&select=..&timeUnit=..
///
/// Stats payloads carry no credentials and are returned as received.
#[tracing::instrument(skip(state, ctx, params), fields(org = %ctx.org()))]
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    ctx: UpstreamContext,
    Path((env, dimension)): Path<(String, String)>,
    Query(params): Query<StatsParams>,
) -> Result<Json<Value>, AppError> {
    let suffix = stats_path(&env, &dimension, &params, chrono::Utc::now())?;
    tracing::info!("Entering stats request: {}", suffix);
    let stats = state.upstream.call(&ctx, &suffix).await?;
    Ok(Json(stats))
}

/// Non-GET methods on `/healthz`.
pub async fn method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed(method)
}

/// Everything else: replay method, path, query and body against the org,
/// masking any consumer secret found in the reply.
#[tracing::instrument(skip(state, ctx, headers, body), fields(org = %ctx.org()))]
pub async fn passthrough(
    State(state): State<Arc<AppState>>,
    ctx: UpstreamContext,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, AppError> {
    tracing::info!("Entering catchall request");
    let body = body?;

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    let mut value = state
        .upstream
        .forward(
            &ctx,
            method,
            path_and_query,
            headers.get(header::CONTENT_TYPE).cloned(),
            body,
        )
        .await?;

    let masked = scrub_secrets(&mut value);
    if masked > 0 {
        tracing::info!("masked {} consumer secrets in passthrough response", masked);
    }
    Ok(Json(value))
}

async fn fetch_app(state: &AppState, ctx: &UpstreamContext, app_id: &str) -> Result<App, AppError> {
    tracing::info!("fetching app with id: {}", app_id);
    let app: App = state
        .upstream
        .call_as(ctx, &format!("/apps/{}", segment(app_id)))
        .await?;
    Ok(redact(app))
}
