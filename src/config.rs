use std::time::Duration;

/// Default upstream root. The org is appended as `root + "/" + org`, so the
/// effective base keeps the double slash callers have always seen.
pub const DEFAULT_UPSTREAM_ROOT: &str = "https://api.enterprise.apigee.com/v1/o/";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Raw verbosity as given in `DEBUG` (e.g. "info", "verbose", "silly").
    pub log_level: String,
    /// Emit JSON log lines instead of the human-readable format.
    pub log_json: bool,
    /// Management API root the org segment is appended to.
    /// Set via APIGEE_MGMT_BASE_URL. Default: the Apigee Edge public endpoint.
    pub upstream_root: String,
    /// Total time allowed for one upstream call (connect + body).
    pub upstream_timeout: Duration,
    pub upstream_connect_timeout: Duration,
    /// Upper bound on concurrent per-app fetches made by `GET /apps`.
    pub app_fetch_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            log_level: "info".into(),
            log_json: false,
            upstream_root: DEFAULT_UPSTREAM_ROOT.into(),
            upstream_timeout: Duration::from_secs(30),
            upstream_connect_timeout: Duration::from_secs(5),
            app_fetch_concurrency: 8,
        }
    }
}

impl Config {
    /// Translates the configured verbosity into an `EnvFilter` directive for
    /// this crate and the HTTP tracing layer.
    pub fn filter_directive(&self) -> String {
        let level = tracing_level(&self.log_level);
        format!("mgmt_api_proxy={level},tower_http={level}")
    }

    /// Rejects settings the proxy cannot run with. Call after CLI overrides.
    pub fn validate(&self) -> anyhow::Result<()> {
        let root = &self.upstream_root;
        if !root.starts_with("http://") && !root.starts_with("https://") {
            anyhow::bail!("upstream root must be an http(s) URL, got '{}'", root);
        }
        Ok(())
    }
}

/// Maps a verbosity name to a tracing level. Accepts tracing's own names plus
/// the npm-style `verbose`, `http` and `silly` levels older deployments set.
pub fn tracing_level(raw: &str) -> &'static str {
    match raw.trim().to_ascii_lowercase().as_str() {
        "error" => "error",
        "warn" | "warning" => "warn",
        "debug" | "verbose" | "http" => "debug",
        "trace" | "silly" => "trace",
        "off" => "off",
        _ => "info",
    }
}

/// Reads settings from the environment (and `.env`). Values are not checked
/// here; see [`Config::validate`].
pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let defaults = Config::default();

    let upstream_root = std::env::var("APIGEE_MGMT_BASE_URL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(defaults.upstream_root);

    Ok(Config {
        port: std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port),
        log_level: std::env::var("DEBUG").unwrap_or(defaults.log_level),
        log_json: std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false),
        upstream_root,
        upstream_timeout: std::env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.upstream_timeout),
        upstream_connect_timeout: std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.upstream_connect_timeout),
        app_fetch_concurrency: std::env::var("APP_FETCH_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|n| n.max(1))
            .unwrap_or(defaults.app_fetch_concurrency),
    })
}
