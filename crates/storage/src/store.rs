use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::{Error, Result},
    types::{Access, CapabilitySet, NamespacePair},
};

/// Interface the gateway calls. Implementations own the namespace and
/// permission rules — the router never checks access itself — and must be
/// safe under concurrent invocation.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Write `key` in the requested namespace. Returns `true` when the
    /// write was applied.
    async fn store_metadata(&self, pair: &NamespacePair, key: &str, value: Value) -> Result<bool>;

    /// Read `key` from the requested namespace. An absent key reads as
    /// JSON null; absence is not an access violation.
    async fn read_metadata(&self, pair: &NamespacePair, key: &str) -> Result<Value>;

    /// Persist a user-approved grant for `namespace`, merging it into any
    /// existing grant. Returns the effective capability set after the
    /// merge.
    async fn grant_permissions(
        &self,
        namespace: &str,
        set: &CapabilitySet,
    ) -> Result<CapabilitySet>;

    /// Current effective grant for `namespace`, if any.
    async fn granted_permissions(&self, namespace: &str) -> Result<Option<CapabilitySet>>;
}

/// Shared enforcement rule: a caller always reaches its own namespace;
/// any other namespace requires a granted capability with the matching
/// access bit.
pub(crate) fn check_access(
    granted: Option<&CapabilitySet>,
    pair: &NamespacePair,
    access: Access,
) -> Result<()> {
    if pair.is_own() {
        return Ok(());
    }
    match granted {
        Some(set) if set.allows(&pair.requested, access) => Ok(()),
        _ => Err(Error::denied(pair)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::normalize_permission_json;

    #[test]
    fn own_namespace_needs_no_grant() {
        let pair = NamespacePair::resolve("https://a.aepps.com", None);
        check_access(None, &pair, Access::Write).unwrap();
    }

    #[test]
    fn cross_namespace_without_grant_is_denied() {
        let pair = NamespacePair::resolve("https://a.aepps.com", Some("https://b.aepps.com"));
        let err = check_access(None, &pair, Access::Read).unwrap_err();
        assert!(matches!(err, Error::Denied { .. }));
    }

    #[test]
    fn cross_namespace_respects_access_bit() {
        let pair = NamespacePair::resolve("https://a.aepps.com", Some("https://b.aepps.com"));
        let granted = normalize_permission_json(&serde_json::json!({
            "https://b.aepps.com": "read",
        }))
        .unwrap();
        check_access(Some(&granted), &pair, Access::Read).unwrap();
        assert!(check_access(Some(&granted), &pair, Access::Write).is_err());
    }
}
