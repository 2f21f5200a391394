use std::sync::Arc;

use {async_trait::async_trait, serde::Serialize, serde_json::Value};

use palisade_protocol::{ErrorPayload, error_codes};
use palisade_storage::{MemoryMetadataStore, MetadataStore};

// ── Service errors ───────────────────────────────────────────────────────────

/// Fault raised by a collaborator call. Converted into a reply at the one
/// call site that produced it; never propagated past the router.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Storage(#[from] palisade_storage::Error),

    #[error("{operation} backend unavailable")]
    Unavailable { operation: &'static str },
}

impl From<String> for ServiceError {
    fn from(msg: String) -> Self {
        Self::Message(msg)
    }
}

/// Every fault crossing the wire goes through this projection, so replies
/// carry plain structured values and never a raw fault object.
impl From<&ServiceError> for ErrorPayload {
    fn from(err: &ServiceError) -> Self {
        match err {
            ServiceError::Storage(inner) => ErrorPayload::from(inner),
            ServiceError::Unavailable { .. } => {
                ErrorPayload::new(err.to_string()).with_code(error_codes::UNAVAILABLE)
            },
            ServiceError::Message(_) => {
                ErrorPayload::new(err.to_string()).with_code(error_codes::INTERNAL)
            },
        }
    }
}

pub type ServiceResult = Result<Value, ServiceError>;

// ── Service traits ───────────────────────────────────────────────────────────

/// Public-address source — the key/identity store seam. Only the active
/// identity's address is ever consulted.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn active_address(&self) -> Option<String>;
}

/// What the wallet backend is asked to sign, tagged with the requesting
/// app (its origin).
#[derive(Debug, Clone, Serialize)]
pub struct SigningRequest {
    pub payload: Value,
    #[serde(rename = "appName")]
    pub app_name: String,
}

/// Asynchronous signing operations of the wallet backend. Either call may
/// take arbitrarily long (user review, hardware signer); the router
/// suspends only the request awaiting it.
#[async_trait]
pub trait SigningService: Send + Sync {
    async fn sign_transaction(&self, request: SigningRequest) -> ServiceResult;
    async fn sign_personal_message(&self, request: SigningRequest) -> ServiceResult;
}

/// Interactive checkpoint for permission grants: the one operation with
/// real authorization consequence gets an unbypassable human answer.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    /// Present `prompt` and wait for the user's answer. Suspends only the
    /// request being confirmed.
    async fn confirm(&self, prompt: &str) -> bool;
}

// ── Noop impls ───────────────────────────────────────────────────────────────

/// No active identity.
pub struct NoopIdentityService;

#[async_trait]
impl IdentityService for NoopIdentityService {
    async fn active_address(&self) -> Option<String> {
        None
    }
}

/// Fails every signing call.
pub struct NoopSigningService;

#[async_trait]
impl SigningService for NoopSigningService {
    async fn sign_transaction(&self, _request: SigningRequest) -> ServiceResult {
        Err(ServiceError::Unavailable {
            operation: "signTransaction",
        })
    }

    async fn sign_personal_message(&self, _request: SigningRequest) -> ServiceResult {
        Err(ServiceError::Unavailable {
            operation: "signPersonalMessage",
        })
    }
}

/// Denies every prompt. The safe default: a grant must be an explicit
/// decision by a real gate.
pub struct DenyAllGate;

#[async_trait]
impl ConfirmationGate for DenyAllGate {
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

// ── Aggregate ────────────────────────────────────────────────────────────────

/// Collaborators the router calls into. `noop()` wires inert stand-ins —
/// no identity, a failing signer, a denying gate, a fresh in-memory
/// store — and production wiring swaps in live services with the `with_*`
/// builders.
#[derive(Clone)]
pub struct GatewayServices {
    pub identity: Arc<dyn IdentityService>,
    pub signing: Arc<dyn SigningService>,
    pub confirmation: Arc<dyn ConfirmationGate>,
    pub metadata: Arc<dyn MetadataStore>,
}

impl GatewayServices {
    pub fn noop() -> Self {
        Self {
            identity: Arc::new(NoopIdentityService),
            signing: Arc::new(NoopSigningService),
            confirmation: Arc::new(DenyAllGate),
            metadata: Arc::new(MemoryMetadataStore::new()),
        }
    }

    #[must_use]
    pub fn with_identity(mut self, identity: Arc<dyn IdentityService>) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn with_signing(mut self, signing: Arc<dyn SigningService>) -> Self {
        self.signing = signing;
        self
    }

    #[must_use]
    pub fn with_confirmation(mut self, confirmation: Arc<dyn ConfirmationGate>) -> Self {
        self.confirmation = confirmation;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataStore>) -> Self {
        self.metadata = metadata;
        self
    }
}
