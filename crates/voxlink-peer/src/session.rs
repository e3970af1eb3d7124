//! Process-wide link session state.
//!
//! One [`LinkSession`] exists for the lifetime of the process. Every HTTP
//! handler and the receiver task mutate it concurrently: plain fields sit
//! behind a `parking_lot::Mutex`, the async write half behind a
//! `tokio::sync::Mutex` so sends can await without holding the state lock.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;

use crate::codec::FrameCodec;

/// How many received speak messages are retained, newest first.
pub const MESSAGE_CAP: usize = 10;

/// Peer target the session starts out with.
pub const DEFAULT_HOST: &str = "192.168.1.9";
/// Default peer port.
pub const DEFAULT_PORT: u16 = 12345;

/// Framed write half of the peer connection.
pub(crate) type FrameWriter = FramedWrite<OwnedWriteHalf, FrameCodec>;

/// Owned handle to a spawned receiver task.
pub(crate) struct ReceiverHandle {
    /// Joined on disconnect so no receiver outlives its link.
    pub handle: JoinHandle<()>,
    /// Cancelling this stops the read loop at its next iteration.
    pub cancel: CancellationToken,
}

/// Plain mutable fields, guarded together by one lock.
struct LinkState {
    /// True iff a connection is believed live and a receiver task is (or
    /// was just) active for it.
    running: bool,
    /// Last-requested peer host; persists across disconnect.
    host: String,
    /// Last-requested peer port; persists across disconnect.
    port: u16,
    /// Human-readable status, displayed verbatim by the browser.
    status: String,
    /// Received speak texts, newest first, at most [`MESSAGE_CAP`].
    recent_messages: VecDeque<String>,
}

/// The single shared record of connection state, target address, and
/// recently received messages.
pub struct LinkSession {
    state: Mutex<LinkState>,
    pub(crate) writer: AsyncMutex<Option<FrameWriter>>,
    pub(crate) task: Mutex<Option<ReceiverHandle>>,
}

/// Point-in-time copy of the session for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LinkSnapshot {
    /// Whether a link is currently believed live.
    pub connected: bool,
    /// Current status text.
    pub status: String,
    /// Last-requested peer host.
    pub host: String,
    /// Last-requested peer port.
    pub port: u16,
    /// Up to [`MESSAGE_CAP`] received messages, newest first.
    pub received_messages: Vec<String>,
}

impl LinkSession {
    /// Create the session in its disconnected initial state.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LinkState {
                running: false,
                host: DEFAULT_HOST.to_owned(),
                port: DEFAULT_PORT,
                status: "Disconnected".to_owned(),
                recent_messages: VecDeque::new(),
            }),
            writer: AsyncMutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Whether a link is currently believed live.
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Snapshot every field for the status endpoint. Never fails.
    pub fn snapshot(&self) -> LinkSnapshot {
        let state = self.state.lock();
        LinkSnapshot {
            connected: state.running,
            status: state.status.clone(),
            host: state.host.clone(),
            port: state.port,
            received_messages: state.recent_messages.iter().cloned().collect(),
        }
    }

    /// Record the requested target. Called before the connect attempt so the
    /// address survives a failed attempt for the UI to repopulate from.
    pub(crate) fn set_target(&self, host: &str, port: u16) {
        let mut state = self.state.lock();
        state.host = host.to_owned();
        state.port = port;
    }

    /// Atomically claim the session for a fresh link.
    ///
    /// Returns false if another connect won the race; the caller must then
    /// drop its stream and report `AlreadyConnected`.
    pub(crate) fn try_begin(&self, host: &str, port: u16) -> bool {
        let mut state = self.state.lock();
        if state.running {
            return false;
        }
        state.running = true;
        state.status = format!("Connected to {host}:{port}");
        true
    }

    /// Atomically release the session for a clean disconnect.
    ///
    /// Returns false if no link was running. Sets the status before the
    /// receiver task is cancelled so the task's cleanup cannot clobber it.
    pub(crate) fn try_stop(&self) -> bool {
        let mut state = self.state.lock();
        if !state.running {
            return false;
        }
        state.running = false;
        state.status = "Disconnected".to_owned();
        true
    }

    /// Mark the link dead, recording this exit's status unless a stopping
    /// party already set a final one.
    ///
    /// The status is only written while the link still counts as running: a
    /// concurrent disconnect (or failed send) set its own status first, and
    /// this cleanup must not clobber it.
    pub(crate) fn mark_stopped(&self, status: Option<String>) {
        let mut state = self.state.lock();
        match status {
            Some(status) if state.running => state.status = status,
            _ => {}
        }
        state.running = false;
    }

    /// Prepend a received speak text, dropping the oldest past the cap.
    pub(crate) fn push_speak(&self, text: String) {
        let mut state = self.state.lock();
        state.recent_messages.push_front(text);
        state.recent_messages.truncate(MESSAGE_CAP);
    }

    /// Install the receiver handle for a fresh link, dropping any finished
    /// predecessor.
    pub(crate) fn install_task(&self, handle: ReceiverHandle) {
        let mut slot = self.task.lock();
        if let Some(old) = slot.take() {
            old.cancel.cancel();
        }
        *slot = Some(handle);
    }

    /// Take ownership of the receiver handle, if any.
    pub(crate) fn take_task(&self) -> Option<ReceiverHandle> {
        self.task.lock().take()
    }

    /// Cancel the receiver task without taking ownership of its handle.
    pub(crate) fn cancel_task(&self) {
        if let Some(task) = self.task.lock().as_ref() {
            task.cancel.cancel();
        }
    }
}

impl Default for LinkSession {
    fn default() -> Self {
        Self::new()
    }
}
