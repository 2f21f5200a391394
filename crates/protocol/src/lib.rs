//! Wallet window RPC protocol definitions.
//!
//! All communication uses JSON envelopes over the browser's cross-origin
//! messaging channel. The caller mints an opaque `uuid` and the wallet
//! echoes it verbatim on the reply; that echo is the only correlation
//! mechanism — there is no pending-request table on the wallet side.
//!
//! Envelope types:
//! - [`RawEnvelope`]   — untrusted page → wallet request
//! - [`ReplyEnvelope`] — wallet → page reply, correlated by `uuid`

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

// ── Constants ────────────────────────────────────────────────────────────────

/// Suffix appended to a request method to form its reply method.
pub const REPLY_SUFFIX: &str = "Return";

// ── Methods ──────────────────────────────────────────────────────────────────

pub mod methods {
    pub const GET_ACCOUNTS: &str = "getAccounts";
    pub const SIGN_TRANSACTION: &str = "signTransaction";
    pub const SIGN_PERSONAL_MESSAGE: &str = "signPersonalMessage";
    pub const HAND_SHAKE: &str = "handShake";
    pub const STORE_METADATA: &str = "storeMetadata";
    pub const READ_METADATA: &str = "readMetadata";
    pub const REQUEST_PERMISSIONS: &str = "requestPermissions";

    /// Every method the gateway dispatches.
    pub const ALL: &[&str] = &[
        GET_ACCOUNTS,
        SIGN_TRANSACTION,
        SIGN_PERSONAL_MESSAGE,
        HAND_SHAKE,
        STORE_METADATA,
        READ_METADATA,
        REQUEST_PERMISSIONS,
    ];
}

// ── Error codes ──────────────────────────────────────────────────────────────

pub mod error_codes {
    pub const INVALID_PAYLOAD: &str = "INVALID_PAYLOAD";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const STORAGE: &str = "STORAGE";
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── Error shape ──────────────────────────────────────────────────────────────

/// JSON-safe projection of a caught fault, built at the failure site and
/// placed on the reply. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

// ── Inbound envelope ─────────────────────────────────────────────────────────

/// An inbound message as it arrives off the transport, before method
/// classification. `origin` and the reply handle are supplied by the
/// transport, never by the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEnvelope {
    /// Opaque correlation id chosen by the caller. Echoed verbatim.
    #[serde(default)]
    pub uuid: Value,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub payload: Value,
}

impl RawEnvelope {
    /// Parse a transport-delivered value.
    ///
    /// `None` means the message is not a gateway request at all — not an
    /// object, or its `uuid` is missing or null. Such messages belong to
    /// unrelated protocols sharing the channel and must be dropped without
    /// a reply.
    pub fn parse(data: &Value) -> Option<Self> {
        let envelope: Self = serde_json::from_value(data.clone()).ok()?;
        if envelope.uuid.is_null() {
            return None;
        }
        Some(envelope)
    }
}

// ── Request union ────────────────────────────────────────────────────────────

/// Payload of a `storeMetadata` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataWrite {
    /// Target namespace; the caller's own origin when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub key: String,
    pub value: Value,
}

/// Payload of a `readMetadata` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataRead {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub key: String,
}

/// The closed set of operations the gateway supports.
///
/// Dispatch is an exhaustive match over this union, so adding or removing
/// a supported method is a compile-time-checked change.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletRequest {
    GetAccounts,
    SignTransaction(Value),
    SignPersonalMessage(Value),
    HandShake,
    StoreMetadata(MetadataWrite),
    ReadMetadata(MetadataRead),
    RequestPermissions(Value),
}

impl WalletRequest {
    /// Resolve a `(method, payload)` pair into a request.
    ///
    /// `Ok(None)` means the method is not one of ours; the caller must drop
    /// the message without replying so that unrecognized methods remain a
    /// forward-compatible no-op. A recognized method with a malformed
    /// payload is an error the caller reports back to the requester.
    pub fn classify(method: &str, payload: Value) -> Result<Option<Self>, ProtocolError> {
        let request = match method {
            methods::GET_ACCOUNTS => Self::GetAccounts,
            methods::SIGN_TRANSACTION => Self::SignTransaction(payload),
            methods::SIGN_PERSONAL_MESSAGE => Self::SignPersonalMessage(payload),
            methods::HAND_SHAKE => Self::HandShake,
            methods::STORE_METADATA => {
                Self::StoreMetadata(decode(methods::STORE_METADATA, payload)?)
            },
            methods::READ_METADATA => Self::ReadMetadata(decode(methods::READ_METADATA, payload)?),
            methods::REQUEST_PERMISSIONS => Self::RequestPermissions(payload),
            _ => return Ok(None),
        };
        Ok(Some(request))
    }

    /// Wire name of the method that produced this request.
    pub fn method(&self) -> &'static str {
        match self {
            Self::GetAccounts => methods::GET_ACCOUNTS,
            Self::SignTransaction(_) => methods::SIGN_TRANSACTION,
            Self::SignPersonalMessage(_) => methods::SIGN_PERSONAL_MESSAGE,
            Self::HandShake => methods::HAND_SHAKE,
            Self::StoreMetadata(_) => methods::STORE_METADATA,
            Self::ReadMetadata(_) => methods::READ_METADATA,
            Self::RequestPermissions(_) => methods::REQUEST_PERMISSIONS,
        }
    }
}

fn decode<T: DeserializeOwned>(method: &'static str, payload: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(payload)
        .map_err(|source| ProtocolError::InvalidPayload { method, source })
}

/// Errors raised while classifying an inbound envelope.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid {method} payload: {source}")]
    InvalidPayload {
        method: &'static str,
        source: serde_json::Error,
    },
}

impl From<&ProtocolError> for ErrorPayload {
    fn from(err: &ProtocolError) -> Self {
        ErrorPayload::new(err.to_string()).with_code(error_codes::INVALID_PAYLOAD)
    }
}

// ── Reply envelope ───────────────────────────────────────────────────────────

/// Reply method name for a request method: `getAccounts` → `getAccountsReturn`.
pub fn reply_method(method: &str) -> String {
    format!("{method}{REPLY_SUFFIX}")
}

/// Wallet → page reply. Exactly one is produced per handled request, with
/// the request's `uuid` copied onto it. `payload` is always present (JSON
/// null included); `error` is omitted when there is none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub uuid: Value,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
    pub payload: Value,
}

impl ReplyEnvelope {
    /// Successful reply for `method`, correlated to `uuid`.
    pub fn ok(uuid: Value, method: &str, payload: Value) -> Self {
        Self {
            uuid,
            method: reply_method(method),
            error: None,
            payload,
        }
    }

    /// Failed reply carrying the fault in the top-level `error` field, as
    /// the signing operations do. `payload` is null.
    pub fn err(uuid: Value, method: &str, error: ErrorPayload) -> Self {
        Self {
            uuid,
            method: reply_method(method),
            error: Some(error),
            payload: Value::Null,
        }
    }

    /// Failed reply on the shared fault path: the fault is carried inside
    /// the payload as `{ success: false, error }`. Used by the metadata
    /// and permission operations.
    pub fn failure(uuid: Value, method: &str, error: ErrorPayload) -> Self {
        Self {
            uuid,
            method: reply_method(method),
            error: None,
            payload: serde_json::json!({ "success": false, "error": error }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ── Inbound parsing ────────────────────────────────────────────────

    #[test]
    fn message_without_uuid_is_foreign() {
        let data = serde_json::json!({ "method": "getAccounts" });
        assert!(RawEnvelope::parse(&data).is_none());
    }

    #[test]
    fn message_with_null_uuid_is_foreign() {
        let data = serde_json::json!({ "uuid": null, "method": "handShake" });
        assert!(RawEnvelope::parse(&data).is_none());
    }

    #[test]
    fn non_object_message_is_foreign() {
        assert!(RawEnvelope::parse(&serde_json::json!("ping")).is_none());
        assert!(RawEnvelope::parse(&serde_json::json!([1, 2])).is_none());
    }

    #[test]
    fn uuid_is_opaque_to_the_gateway() {
        // Callers may mint any JSON value as a correlation id.
        let data = serde_json::json!({ "uuid": 42, "method": "handShake" });
        let envelope = RawEnvelope::parse(&data).unwrap();
        assert_eq!(envelope.uuid, serde_json::json!(42));
    }

    #[test]
    fn missing_payload_defaults_to_null() {
        let data = serde_json::json!({ "uuid": "A1", "method": "getAccounts" });
        let envelope = RawEnvelope::parse(&data).unwrap();
        assert!(envelope.payload.is_null());
    }

    // ── Classification ─────────────────────────────────────────────────

    #[test]
    fn unknown_method_classifies_to_none() {
        let result = WalletRequest::classify("mintTokens", Value::Null).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn sign_transaction_keeps_payload_opaque() {
        let tx = serde_json::json!({ "amount": 10, "recipient": "ak_9x" });
        let request = WalletRequest::classify(methods::SIGN_TRANSACTION, tx.clone())
            .unwrap()
            .unwrap();
        assert_eq!(request, WalletRequest::SignTransaction(tx));
    }

    #[test]
    fn store_metadata_payload_decodes() {
        let payload = serde_json::json!({ "key": "k", "value": "v" });
        let request = WalletRequest::classify(methods::STORE_METADATA, payload)
            .unwrap()
            .unwrap();
        match request {
            WalletRequest::StoreMetadata(write) => {
                assert_eq!(write.key, "k");
                assert!(write.namespace.is_none());
            },
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn store_metadata_without_key_is_invalid() {
        let payload = serde_json::json!({ "value": "v" });
        let err = WalletRequest::classify(methods::STORE_METADATA, payload).unwrap_err();
        let projected = ErrorPayload::from(&err);
        assert_eq!(projected.code.as_deref(), Some(error_codes::INVALID_PAYLOAD));
    }

    #[test]
    fn read_metadata_accepts_explicit_namespace() {
        let payload = serde_json::json!({ "namespace": "https://other.aepps.com", "key": "k" });
        let request = WalletRequest::classify(methods::READ_METADATA, payload)
            .unwrap()
            .unwrap();
        match request {
            WalletRequest::ReadMetadata(read) => {
                assert_eq!(read.namespace.as_deref(), Some("https://other.aepps.com"));
            },
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn every_listed_method_classifies() {
        for method in methods::ALL {
            let payload = match *method {
                methods::STORE_METADATA => serde_json::json!({ "key": "k", "value": 1 }),
                methods::READ_METADATA => serde_json::json!({ "key": "k" }),
                _ => Value::Null,
            };
            let request = WalletRequest::classify(method, payload).unwrap().unwrap();
            assert_eq!(request.method(), *method);
        }
    }

    // ── Reply construction ─────────────────────────────────────────────

    #[test]
    fn ok_reply_omits_error_and_keeps_null_payload() {
        let reply = ReplyEnvelope::ok(serde_json::json!("A2"), methods::HAND_SHAKE, Value::Null);
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["uuid"], "A2");
        assert_eq!(json["method"], "handShakeReturn");
        assert!(!json.as_object().unwrap().contains_key("error"));
        assert!(json["payload"].is_null());
        assert!(json.as_object().unwrap().contains_key("payload"));
    }

    #[test]
    fn err_reply_carries_top_level_error() {
        let reply = ReplyEnvelope::err(
            serde_json::json!("B1"),
            methods::SIGN_TRANSACTION,
            ErrorPayload::new("rejected by user").with_code(error_codes::PERMISSION_DENIED),
        );
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["method"], "signTransactionReturn");
        assert_eq!(json["error"]["message"], "rejected by user");
        assert!(json["payload"].is_null());
    }

    #[test]
    fn failure_reply_nests_error_in_payload() {
        let reply = ReplyEnvelope::failure(
            serde_json::json!("C1"),
            methods::STORE_METADATA,
            ErrorPayload::new("namespace not granted"),
        );
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["method"], "storeMetadataReturn");
        assert_eq!(json["payload"]["success"], false);
        assert_eq!(json["payload"]["error"]["message"], "namespace not granted");
        assert!(!json.as_object().unwrap().contains_key("error"));
    }

    #[test]
    fn reply_round_trips_for_caller_side_decoding() {
        let reply = ReplyEnvelope::ok(
            serde_json::json!("A1"),
            methods::GET_ACCOUNTS,
            serde_json::json!(["ak_123"]),
        );
        let json = serde_json::to_string(&reply).unwrap();
        let parsed: ReplyEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.uuid, serde_json::json!("A1"));
        assert_eq!(parsed.payload, serde_json::json!(["ak_123"]));
        assert!(parsed.error.is_none());
    }

    #[test]
    fn reply_method_appends_suffix() {
        assert_eq!(reply_method(methods::GET_ACCOUNTS), "getAccountsReturn");
        assert_eq!(
            reply_method(methods::REQUEST_PERMISSIONS),
            "requestPermissionsReturn"
        );
    }
}
