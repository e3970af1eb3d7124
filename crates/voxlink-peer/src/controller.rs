//! Connect / disconnect / send operations on the link session.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use voxlink_core::{LinkError, PeerMessage};

use crate::codec::FrameCodec;
use crate::receiver;
use crate::session::{LinkSession, LinkSnapshot, ReceiverHandle};

/// Default bound on the outbound TCP connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Drives the process-wide [`LinkSession`]: at most one live peer link,
/// opened and closed on behalf of the HTTP surface.
pub struct LinkController {
    session: Arc<LinkSession>,
    connect_timeout: Duration,
    /// Serializes connect and disconnect so one cannot interleave with the
    /// other's multi-step setup or teardown. Sends only contend on the
    /// writer lock.
    lifecycle: tokio::sync::Mutex<()>,
}

impl LinkController {
    /// Create a controller over a fresh, disconnected session.
    pub fn new() -> Self {
        Self {
            session: Arc::new(LinkSession::new()),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            lifecycle: tokio::sync::Mutex::new(()),
        }
    }

    /// Override the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Snapshot the session for the status endpoint. Never fails.
    pub fn snapshot(&self) -> LinkSnapshot {
        self.session.snapshot()
    }

    /// Open the link to `host:port` and start its receiver task.
    ///
    /// Fails with [`LinkError::AlreadyConnected`] while a link is live,
    /// leaving the existing link (and its recorded target) untouched.
    /// On a failed attempt the requested target is still recorded so the
    /// browser form repopulates from it.
    pub async fn connect(&self, host: &str, port: u16) -> Result<(), LinkError> {
        let _lifecycle = self.lifecycle.lock().await;
        if self.session.is_running() {
            return Err(LinkError::AlreadyConnected);
        }

        self.session.set_target(host, port);
        let addr = format!("{host}:{port}");
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| LinkError::ConnectFailed(format!("timed out connecting to {addr}")))?
            .map_err(|e| LinkError::ConnectFailed(e.to_string()))?;

        // Claim the session under its state lock; a lost claim drops the
        // fresh stream.
        if !self.session.try_begin(host, port) {
            return Err(LinkError::AlreadyConnected);
        }

        let (read_half, write_half) = stream.into_split();
        *self.session.writer.lock().await = Some(FramedWrite::new(write_half, FrameCodec));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(receiver::run(
            self.session.clone(),
            FramedRead::new(read_half, FrameCodec),
            cancel.clone(),
        ));
        self.session.install_task(ReceiverHandle { handle, cancel });

        info!(%host, port, "link established");
        Ok(())
    }

    /// Close the link and join its receiver task.
    ///
    /// The running flag and status flip before the socket closes so the
    /// receiver's cleanup, racing with its own failed read, keeps this
    /// status rather than recording an error.
    pub async fn disconnect(&self) -> Result<(), LinkError> {
        let _lifecycle = self.lifecycle.lock().await;
        if !self.session.try_stop() {
            return Err(LinkError::NotConnected);
        }

        let task = self.session.take_task();
        if let Some(task) = &task {
            task.cancel.cancel();
        }
        drop(self.session.writer.lock().await.take());

        if let Some(task) = task {
            if let Err(e) = task.handle.await {
                warn!(error = %e, "receiver task join failed");
            }
        }

        info!("link closed");
        Ok(())
    }

    /// Frame-encode the recognized text and write it to the peer.
    ///
    /// A write failure tears the link down: the status keeps the reason
    /// and the receiver task is cancelled.
    pub async fn send(&self, text: &str) -> Result<(), LinkError> {
        if !self.session.is_running() {
            return Err(LinkError::NotConnected);
        }
        if text.is_empty() {
            return Err(LinkError::EmptyText);
        }

        let payload = serde_json::to_vec(&PeerMessage::Text { text: text.to_owned() })
            .map_err(|e| LinkError::SendFailed(e.to_string()))?;

        let mut writer = self.session.writer.lock().await;
        let Some(sink) = writer.as_mut() else {
            // Receiver cleanup raced us between the running check and here.
            return Err(LinkError::NotConnected);
        };

        if let Err(e) = sink.send(Bytes::from(payload)).await {
            let reason = e.to_string();
            drop(writer);
            self.session.mark_stopped(Some(format!("Error: {reason}")));
            self.session.cancel_task();
            warn!(%reason, "send to peer failed");
            return Err(LinkError::SendFailed(reason));
        }

        Ok(())
    }
}

impl Default for LinkController {
    fn default() -> Self {
        Self::new()
    }
}
