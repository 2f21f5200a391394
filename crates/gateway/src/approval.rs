//! Channel-backed confirmation gate.
//!
//! The blocking `confirm()` primitive is modeled as an awaited future,
//! not an OS-level block: the wallet UI owns the receiving end of a
//! channel, renders each [`ConfirmationRequest`], and answers its
//! responder. Only the request being confirmed suspends; everything else
//! the gateway is doing keeps running. An unanswered prompt leaves that
//! one reply unresolved indefinitely — the core enforces no timeout.

use {
    async_trait::async_trait,
    tokio::sync::{mpsc, oneshot},
    tracing::warn,
    uuid::Uuid,
};

use crate::services::ConfirmationGate;

/// A pending permission prompt handed to the UI owner.
#[derive(Debug)]
pub struct ConfirmationRequest {
    pub id: Uuid,
    pub prompt: String,
    responder: oneshot::Sender<bool>,
}

impl ConfirmationRequest {
    /// Answer the prompt. Consumes the request; a prompt is answered at
    /// most once.
    pub fn answer(self, accept: bool) {
        let _ = self.responder.send(accept);
    }
}

/// Gate that parks each confirmation on a oneshot answered by whoever
/// holds the receiving end.
pub struct ChannelConfirmationGate {
    tx: mpsc::Sender<ConfirmationRequest>,
}

impl ChannelConfirmationGate {
    /// Returns the gate and the stream of prompts for the UI to answer.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ConfirmationRequest>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ConfirmationGate for ChannelConfirmationGate {
    async fn confirm(&self, prompt: &str) -> bool {
        let (responder, answer) = oneshot::channel();
        let request = ConfirmationRequest {
            id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            responder,
        };
        if self.tx.send(request).await.is_err() {
            warn!("confirmation channel closed, denying permission prompt");
            return false;
        }
        // A dropped responder (the UI went away mid-prompt) counts as
        // deny; a grant must never fall through by accident.
        answer.await.unwrap_or(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accept_round_trip() {
        let (gate, mut prompts) = ChannelConfirmationGate::new(4);
        let pending = tokio::spawn(async move { gate.confirm("grant?").await });

        let request = prompts.recv().await.unwrap();
        assert_eq!(request.prompt, "grant?");
        request.answer(true);

        assert!(pending.await.unwrap());
    }

    #[tokio::test]
    async fn deny_round_trip() {
        let (gate, mut prompts) = ChannelConfirmationGate::new(4);
        let pending = tokio::spawn(async move { gate.confirm("grant?").await });
        prompts.recv().await.unwrap().answer(false);
        assert!(!pending.await.unwrap());
    }

    #[tokio::test]
    async fn closed_channel_denies() {
        let (gate, prompts) = ChannelConfirmationGate::new(4);
        drop(prompts);
        assert!(!gate.confirm("grant?").await);
    }

    #[tokio::test]
    async fn dropped_request_denies() {
        let (gate, mut prompts) = ChannelConfirmationGate::new(4);
        let pending = tokio::spawn(async move { gate.confirm("grant?").await });
        drop(prompts.recv().await.unwrap());
        assert!(!pending.await.unwrap());
    }
}
