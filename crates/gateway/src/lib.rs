//! Cross-window RPC gateway for the Palisade wallet.
//!
//! Untrusted pages post JSON request envelopes over the browser's
//! cross-origin messaging channel; the gateway validates the sending
//! origin against an allow-list, dispatches on a closed method set, and
//! posts exactly one reply correlated by the caller's own `uuid`.
//!
//! The gateway itself is stateless per message. Everything with real
//! state — the identity store, the signing backend, the metadata and
//! permission store, the confirmation UI — is injected through
//! [`services::GatewayServices`].

pub mod approval;
pub mod config;
pub mod origin;
pub mod router;
pub mod services;
pub mod transport;

pub use {
    approval::{ChannelConfirmationGate, ConfirmationRequest},
    config::GatewayConfig,
    origin::OriginValidator,
    router::MessageRouter,
    services::{
        ConfirmationGate, GatewayServices, IdentityService, ServiceError, ServiceResult,
        SigningRequest, SigningService,
    },
    transport::{InboundEvent, ListenerHandle, MpscReplyPort, ReplyPort},
};
