//! `/api/*` handlers — the request surface the browser polls and posts to.
//!
//! Every endpoint answers HTTP 200 with a structured JSON body; operation
//! failures travel as `{success: false, message}` rather than as transport
//! errors. Handlers perform a single read or mutate of the link session
//! and never block on the peer socket.

use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use voxlink_core::LinkError;
use voxlink_peer::LinkSnapshot;

use crate::server::AppState;

/// Structured outcome for every mutating API call.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    /// Whether the operation took effect.
    pub success: bool,
    /// Display text for the browser: a confirmation or the failure reason.
    pub message: String,
}

impl ApiResponse {
    fn ok(message: &str) -> Json<Self> {
        Json(Self { success: true, message: message.to_owned() })
    }

    fn err(error: &LinkError) -> Json<Self> {
        if error.is_fatal() {
            warn!(%error, "link operation tore the connection down");
        }
        Json(Self { success: false, message: error.to_string() })
    }
}

/// POST `/api/connect` body. Both fields are optional; the session's
/// stored target fills the gaps, mirroring the browser form's defaults.
#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    /// Peer host.
    pub host: Option<String>,
    /// Peer port. The browser form posts this as a string, so it is
    /// accepted as either a JSON number or a numeric string.
    pub port: Option<Value>,
}

/// POST `/api/send` body.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// The recognized text to forward. Empty (or absent) is rejected.
    #[serde(default)]
    pub text: String,
}

/// Coerce a JSON port value into a `u16`.
///
/// A non-coercible port reports as a connection failure, not a 4xx — the
/// surface never pre-validates what the connect attempt would reject.
fn coerce_port(value: &Value) -> Result<u16, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| format!("invalid port: {n}")),
        Value::String(s) => s.trim().parse().map_err(|_| format!("invalid port: {s:?}")),
        other => Err(format!("invalid port: {other}")),
    }
}

/// POST `/api/connect`
pub async fn connect(
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> Json<ApiResponse> {
    let stored = state.link.snapshot();
    let host = req.host.unwrap_or(stored.host);
    let port = match req.port.as_ref().map_or(Ok(stored.port), coerce_port) {
        Ok(port) => port,
        Err(reason) => {
            return Json(ApiResponse {
                success: false,
                message: format!("Connection failed: {reason}"),
            });
        }
    };

    match state.link.connect(&host, port).await {
        Ok(()) => ApiResponse::ok("Connected successfully"),
        Err(e) => ApiResponse::err(&e),
    }
}

/// POST `/api/disconnect`
pub async fn disconnect(State(state): State<AppState>) -> Json<ApiResponse> {
    match state.link.disconnect().await {
        Ok(()) => ApiResponse::ok("Disconnected"),
        Err(e) => ApiResponse::err(&e),
    }
}

/// GET `/api/status` — never fails.
pub async fn status(State(state): State<AppState>) -> Json<LinkSnapshot> {
    Json(state.link.snapshot())
}

/// POST `/api/send`
pub async fn send(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Json<ApiResponse> {
    match state.link.send(&req.text).await {
        Ok(()) => ApiResponse::ok("Text sent"),
        Err(e) => ApiResponse::err(&e),
    }
}
