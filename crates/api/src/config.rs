use std::str::FromStr;
use std::time::Duration;

use bizprofile_core::media::DEFAULT_MAX_PHOTO_BYTES;
use bizprofile_graph::api::{GraphConfig, DEFAULT_API_VERSION, DEFAULT_BASE_URL};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Remote Graph API connection settings.
    pub graph: GraphConfig,
    /// App identifier used to open upload sessions. Requests may override it
    /// with the `x-app-id` header.
    pub app_id: Option<String>,
    /// Largest accepted profile photo, in bytes.
    pub max_photo_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                       |
    /// |------------------------|-------------------------------|
    /// | `HOST`                 | `0.0.0.0`                     |
    /// | `PORT`                 | `3000`                        |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`       |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                          |
    /// | `GRAPH_BASE_URL`       | `https://graph.facebook.com`  |
    /// | `GRAPH_API_VERSION`    | `v21.0`                       |
    /// | `GRAPH_TIMEOUT_SECS`   | `30`                          |
    /// | `META_APP_ID`          | unset                         |
    /// | `MAX_PHOTO_BYTES`      | `5242880`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = parse_env("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_env("REQUEST_TIMEOUT_SECS", 30);

        let graph = GraphConfig {
            base_url: std::env::var("GRAPH_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            api_version: std::env::var("GRAPH_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.into()),
            timeout: Duration::from_secs(parse_env("GRAPH_TIMEOUT_SECS", 30)),
        };

        let app_id = std::env::var("META_APP_ID")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let max_photo_bytes: usize = parse_env("MAX_PHOTO_BYTES", DEFAULT_MAX_PHOTO_BYTES);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            graph,
            app_id,
            max_photo_bytes,
        }
    }
}

/// Read `key` and parse it, falling back to `default` when unset.
///
/// Panics on a present but unparsable value so misconfiguration fails at
/// startup.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
