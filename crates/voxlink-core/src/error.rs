//! Error taxonomy for link operations.

use thiserror::Error;

/// Failures surfaced by the connect / disconnect / send operations.
///
/// Every variant maps to a structured `{success: false, message}` API
/// response; none of them abort the HTTP request. The `Display` text is
/// the exact message the browser sees.
#[derive(Debug, Error)]
pub enum LinkError {
    /// A link is already established; the existing one is left untouched.
    #[error("Already connected")]
    AlreadyConnected,

    /// No link is established.
    #[error("Not connected")]
    NotConnected,

    /// `send` was called with an empty payload.
    #[error("No text provided")]
    EmptyText,

    /// The outbound TCP connect did not produce a usable stream.
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// Writing to the peer failed; the link is torn down as a side effect.
    #[error("Failed to send: {0}")]
    SendFailed(String),
}

impl LinkError {
    /// Whether the failure tore the link down (as opposed to a precondition
    /// check that left state untouched).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SendFailed(_))
    }
}
