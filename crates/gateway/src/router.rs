use std::sync::Arc;

use {
    serde_json::Value,
    tokio::sync::mpsc,
    tracing::{debug, warn},
};

use palisade_protocol::{
    ErrorPayload, MetadataRead, MetadataWrite, RawEnvelope, ReplyEnvelope, WalletRequest,
};
use palisade_storage::{CapabilitySet, NamespacePair, normalize_permission_json};

use crate::{
    config::GatewayConfig,
    origin::OriginValidator,
    services::{GatewayServices, ServiceResult, SigningRequest},
    transport::{InboundEvent, ListenerHandle},
};

/// The gateway core: validates the origin, classifies the method,
/// dispatches to the matching handler, and posts exactly one correlated
/// reply — or none, for foreign messages, unauthorized origins, and
/// unrecognized methods.
///
/// The router holds no per-request state. Correlation is delegated
/// entirely to the caller: the request's `uuid` is echoed on the reply
/// and nothing is tracked on this side.
pub struct MessageRouter {
    validator: OriginValidator,
    services: GatewayServices,
}

impl MessageRouter {
    pub fn new(config: &GatewayConfig, services: GatewayServices) -> anyhow::Result<Self> {
        Ok(Self {
            validator: OriginValidator::from_config(config)?,
            services,
        })
    }

    /// Attach to a transport. One task per message keeps in-flight
    /// requests independent: a pending confirmation or a slow backend
    /// stalls only its own reply, never the loop.
    pub fn attach(self: Arc<Self>, mut rx: mpsc::Receiver<InboundEvent>) -> ListenerHandle {
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let router = Arc::clone(&self);
                tokio::spawn(async move { router.handle(event).await });
            }
        });
        ListenerHandle::new(task)
    }

    /// Handle one inbound message. Side effect: at most one posted reply.
    pub async fn handle(&self, event: InboundEvent) {
        let Some(envelope) = RawEnvelope::parse(&event.data) else {
            // No uuid: not a gateway request. Another protocol may share
            // the channel, so this is not even worth a log line.
            return;
        };
        if !self.validator.is_authorized(&event.origin) {
            // Silent toward the caller: an unauthorized origin must not
            // learn whether a listener exists.
            warn!(origin = %event.origin, "dropping message from unauthorized origin");
            return;
        }

        let request = match WalletRequest::classify(&envelope.method, envelope.payload) {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!(method = %envelope.method, "ignoring unrecognized method");
                return;
            },
            Err(err) => {
                let reply =
                    ReplyEnvelope::failure(envelope.uuid, &envelope.method, ErrorPayload::from(&err));
                event.source.post(&reply);
                return;
            },
        };

        let reply = self.dispatch(envelope.uuid, &event.origin, request).await;
        if !event.source.post(&reply) {
            debug!(origin = %event.origin, "caller window went away, dropping reply");
        }
    }

    async fn dispatch(&self, uuid: Value, origin: &str, request: WalletRequest) -> ReplyEnvelope {
        let method = request.method();
        match request {
            WalletRequest::GetAccounts => self.get_accounts(uuid, method).await,
            WalletRequest::HandShake => ReplyEnvelope::ok(uuid, method, Value::Null),
            WalletRequest::SignTransaction(tx) => {
                let result = self
                    .services
                    .signing
                    .sign_transaction(SigningRequest {
                        payload: tx,
                        app_name: origin.to_string(),
                    })
                    .await;
                signing_reply(uuid, method, result)
            },
            WalletRequest::SignPersonalMessage(msg) => {
                let result = self
                    .services
                    .signing
                    .sign_personal_message(SigningRequest {
                        payload: msg,
                        app_name: origin.to_string(),
                    })
                    .await;
                signing_reply(uuid, method, result)
            },
            WalletRequest::StoreMetadata(write) => {
                self.store_metadata(uuid, method, origin, write).await
            },
            WalletRequest::ReadMetadata(read) => {
                self.read_metadata(uuid, method, origin, read).await
            },
            WalletRequest::RequestPermissions(raw) => {
                self.request_permissions(uuid, method, origin, raw).await
            },
        }
    }

    // ── Handlers ─────────────────────────────────────────────────────────────

    /// Never errors: the reply is the active identity's address as a
    /// one-element sequence, or an empty one.
    async fn get_accounts(&self, uuid: Value, method: &str) -> ReplyEnvelope {
        let accounts: Vec<String> = self
            .services
            .identity
            .active_address()
            .await
            .into_iter()
            .collect();
        ReplyEnvelope::ok(uuid, method, serde_json::json!(accounts))
    }

    async fn store_metadata(
        &self,
        uuid: Value,
        method: &str,
        origin: &str,
        write: MetadataWrite,
    ) -> ReplyEnvelope {
        let pair = NamespacePair::resolve(origin, write.namespace.as_deref());
        match self
            .services
            .metadata
            .store_metadata(&pair, &write.key, write.value)
            .await
        {
            Ok(success) => {
                ReplyEnvelope::ok(uuid, method, serde_json::json!({ "success": success }))
            },
            Err(err) => ReplyEnvelope::failure(uuid, method, ErrorPayload::from(&err)),
        }
    }

    async fn read_metadata(
        &self,
        uuid: Value,
        method: &str,
        origin: &str,
        read: MetadataRead,
    ) -> ReplyEnvelope {
        let pair = NamespacePair::resolve(origin, read.namespace.as_deref());
        match self.services.metadata.read_metadata(&pair, &read.key).await {
            Ok(value) => ReplyEnvelope::ok(
                uuid,
                method,
                serde_json::json!({ "success": true, "key": read.key, "value": value }),
            ),
            Err(err) => ReplyEnvelope::failure(uuid, method, ErrorPayload::from(&err)),
        }
    }

    /// `Requested → {Granted, Denied}` — terminal either way, one prompt
    /// per call. Nothing touches the ledger before the user answers.
    async fn request_permissions(
        &self,
        uuid: Value,
        method: &str,
        origin: &str,
        raw: Value,
    ) -> ReplyEnvelope {
        let normalized = match normalize_permission_json(&raw) {
            Ok(set) => set,
            Err(err) => return ReplyEnvelope::failure(uuid, method, ErrorPayload::from(&err)),
        };

        let prompt = permission_prompt(origin, &normalized);
        if !self.services.confirmation.confirm(&prompt).await {
            return ReplyEnvelope::ok(uuid, method, serde_json::json!({ "success": false }));
        }

        match self
            .services
            .metadata
            .grant_permissions(origin, &normalized)
            .await
        {
            Ok(result) => ReplyEnvelope::ok(
                uuid,
                method,
                serde_json::json!({ "success": true, "result": result }),
            ),
            Err(err) => ReplyEnvelope::failure(uuid, method, ErrorPayload::from(&err)),
        }
    }
}

fn signing_reply(uuid: Value, method: &str, result: ServiceResult) -> ReplyEnvelope {
    match result {
        Ok(payload) => ReplyEnvelope::ok(uuid, method, payload),
        // Both signing operations project faults through the structured
        // error type; a raw fault never crosses the wire.
        Err(err) => ReplyEnvelope::err(uuid, method, ErrorPayload::from(&err)),
    }
}

/// What the user is shown before a grant is persisted: the requesting
/// namespace and the normalized capability set, verbatim.
fn permission_prompt(origin: &str, set: &CapabilitySet) -> String {
    let rendered = serde_json::to_string_pretty(set).unwrap_or_else(|_| "[]".into());
    format!("Give the app {origin} the following permissions?\n\n{rendered}")
}
