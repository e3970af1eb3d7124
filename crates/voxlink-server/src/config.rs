//! Server configuration.

use serde::{Deserialize, Serialize};

/// Port used when neither the CLI nor `$PORT` provides one.
pub const DEFAULT_PORT: u16 = 5000;

/// Configuration for the relay server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"0.0.0.0"` — the page is meant to be opened
    /// from other devices on the network).
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Bound on the outbound TCP connect to the peer, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            connect_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Resolve the listening port: an explicit value wins, else `$PORT`,
    /// else [`DEFAULT_PORT`]. Hosted platforms inject `$PORT`.
    pub fn resolve_port(explicit: Option<u16>) -> u16 {
        explicit
            .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(DEFAULT_PORT)
    }
}
