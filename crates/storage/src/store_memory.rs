use std::collections::HashMap;

use {async_trait::async_trait, dashmap::DashMap, serde_json::Value, tracing::debug};

use crate::{
    error::Result,
    store::{MetadataStore, check_access},
    types::{Access, CapabilitySet, NamespacePair},
};

/// In-memory store. The default for tests and for wallet sessions that
/// do not persist dapp metadata across restarts.
#[derive(Default)]
pub struct MemoryMetadataStore {
    /// requested namespace → key → value
    records: DashMap<String, HashMap<String, Value>>,
    /// requesting namespace → effective grant
    ledger: DashMap<String, CapabilitySet>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn store_metadata(&self, pair: &NamespacePair, key: &str, value: Value) -> Result<bool> {
        let granted = self.ledger.get(&pair.requesting).map(|g| g.value().clone());
        check_access(granted.as_ref(), pair, Access::Write)?;
        self.records
            .entry(pair.requested.clone())
            .or_default()
            .insert(key.to_string(), value);
        Ok(true)
    }

    async fn read_metadata(&self, pair: &NamespacePair, key: &str) -> Result<Value> {
        let granted = self.ledger.get(&pair.requesting).map(|g| g.value().clone());
        check_access(granted.as_ref(), pair, Access::Read)?;
        Ok(self
            .records
            .get(&pair.requested)
            .and_then(|keys| keys.get(key).cloned())
            .unwrap_or(Value::Null))
    }

    async fn grant_permissions(
        &self,
        namespace: &str,
        set: &CapabilitySet,
    ) -> Result<CapabilitySet> {
        let mut entry = self.ledger.entry(namespace.to_string()).or_default();
        entry.value_mut().merge(set);
        let effective = entry.value().clone();
        debug!(namespace, grants = effective.grants.len(), "permission grant updated");
        Ok(effective)
    }

    async fn granted_permissions(&self, namespace: &str) -> Result<Option<CapabilitySet>> {
        Ok(self.ledger.get(namespace).map(|g| g.value().clone()))
    }
}
