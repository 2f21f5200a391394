//! Transport seam between the browser messaging channel and the router.
//!
//! The gateway never registers an ambient global listener. Its owner
//! feeds transport events into a channel, attaches the router to the
//! receiving end, and drops the returned handle to stop listening — the
//! lifecycle belongs to the owner, not to a process-wide singleton.

use std::{fmt, sync::Arc};

use {serde_json::Value, tokio::sync::mpsc};

use palisade_protocol::ReplyEnvelope;

// ── Reply port ───────────────────────────────────────────────────────────────

/// Reply-capable handle to the window that sent a message, captured per
/// message by the transport. Replies go to this handle and nowhere else.
pub trait ReplyPort: Send + Sync {
    /// Post a reply without blocking. Returns `false` when the consumer
    /// is gone or its buffer is full; the frame is dropped in that case.
    /// Stray or dropped replies are harmless — correlation is the
    /// caller's own bookkeeping, and it ignores what it no longer waits
    /// for.
    fn post(&self, reply: &ReplyEnvelope) -> bool;
}

/// Reply port over a bounded channel.
pub struct MpscReplyPort {
    tx: mpsc::Sender<ReplyEnvelope>,
}

impl MpscReplyPort {
    pub fn new(tx: mpsc::Sender<ReplyEnvelope>) -> Self {
        Self { tx }
    }
}

impl ReplyPort for MpscReplyPort {
    fn post(&self, reply: &ReplyEnvelope) -> bool {
        self.tx.try_send(reply.clone()).is_ok()
    }
}

// ── Inbound events ───────────────────────────────────────────────────────────

/// One message delivered by the transport.
pub struct InboundEvent {
    /// Raw body as received. Not yet trusted to be a gateway request.
    pub data: Value,
    /// Sending origin, set by the transport — never by the payload.
    pub origin: String,
    /// Where the reply, if any, is posted.
    pub source: Arc<dyn ReplyPort>,
}

impl fmt::Debug for InboundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundEvent")
            .field("data", &self.data)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

// ── Listener lifecycle ───────────────────────────────────────────────────────

/// Detaches the gateway from its transport when stopped or dropped.
/// Handlers already dispatched keep running to completion; in-flight
/// requests are never cancelled.
pub struct ListenerHandle {
    task: tokio::task::JoinHandle<()>,
}

impl ListenerHandle {
    pub(crate) fn new(task: tokio::task::JoinHandle<()>) -> Self {
        Self { task }
    }

    /// Stop accepting new messages.
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
