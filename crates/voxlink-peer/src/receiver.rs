//! Background receiver task.
//!
//! One task per link. It owns the read half of the socket, decodes inbound
//! frames, stores `speak` texts into the session, and tears the link down
//! on cancellation, peer close, or any read/decode failure. Every
//! termination is final — a fresh connect creates a new task.

use std::sync::Arc;

use futures::StreamExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use voxlink_core::PeerMessage;

use crate::codec::FrameCodec;
use crate::session::LinkSession;

/// Why the read loop stopped.
enum Exit {
    /// Cancelled by a disconnect or a failed send; the cancelling party
    /// already set the final status.
    Cancelled,
    /// The peer closed the stream.
    PeerClosed,
    /// A read or decode failure.
    Failed(String),
}

/// Read frames until cancellation, EOF, or an error, then clean up.
///
/// Cleanup runs exactly once per task regardless of exit path: the write
/// half is dropped if a disconnect has not already taken it (so the two
/// paths cannot double-close), and the session is marked stopped.
pub(crate) async fn run(
    session: Arc<LinkSession>,
    mut frames: FramedRead<OwnedReadHalf, FrameCodec>,
    cancel: CancellationToken,
) {
    let exit = loop {
        tokio::select! {
            () = cancel.cancelled() => break Exit::Cancelled,
            frame = frames.next() => match frame {
                None => break Exit::PeerClosed,
                Some(Err(e)) => break Exit::Failed(e.to_string()),
                Some(Ok(payload)) => match serde_json::from_slice(&payload) {
                    Ok(value) => store_payload(&session, value),
                    Err(e) => break Exit::Failed(format!("malformed payload: {e}")),
                },
            },
        }
    };

    drop(session.writer.lock().await.take());

    match exit {
        Exit::Cancelled => session.mark_stopped(None),
        Exit::PeerClosed => {
            debug!("peer closed the connection");
            session.mark_stopped(Some("Disconnected".to_owned()));
        }
        Exit::Failed(reason) => {
            warn!(%reason, "receive loop failed");
            session.mark_stopped(Some(format!("Error: {reason}")));
        }
    }
}

/// Classify one decoded payload and store it if it is a speak message.
/// Anything else well-formed is logged and ignored, not an error.
fn store_payload(session: &LinkSession, value: serde_json::Value) {
    match PeerMessage::classify(value) {
        PeerMessage::Speak { text } => {
            debug!(%text, "speak message received");
            session.push_speak(text);
        }
        other => debug!(?other, "ignoring peer message"),
    }
}
