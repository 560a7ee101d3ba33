//! Environment configuration.

use std::env;

/// Runtime configuration for the monolith deployment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Root directory for sources and derived HLS artifacts
    pub media_root: String,
    /// Bearer token accepted by the HTTP surface
    pub api_token: String,
    /// Number of transcoding workers
    pub workers: usize,
    /// Upper bound for a single rendition encode, in seconds
    pub encode_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("127.0.0.1")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("8000")),
            media_root: env::var("MEDIA_ROOT").unwrap_or_else(|_| String::from("./media")),
            api_token: env::var("API_TOKEN").unwrap_or_else(|_| String::from("dev-secret")),
            workers: env::var("WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            encode_timeout_secs: env::var("ENCODE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        }
    }
}
