use std::{collections::HashMap, fs, path::PathBuf};

use {async_trait::async_trait, serde_json::Value, tokio::sync::Mutex, tracing::debug};

use crate::{
    error::Result,
    store::{MetadataStore, check_access},
    types::{Access, CapabilitySet, NamespacePair},
};

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct FileState {
    #[serde(default)]
    records: HashMap<String, HashMap<String, Value>>,
    #[serde(default)]
    grants: HashMap<String, CapabilitySet>,
}

/// JSON-file-backed store. Concurrent callers are serialized by an
/// internal lock so read-modify-write cycles never interleave.
pub struct FileMetadataStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileMetadataStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Default location under the platform config directory.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "palisade")
            .ok_or_else(|| anyhow::anyhow!("no home directory available"))?;
        Ok(dirs.config_dir().join("metadata.json"))
    }

    fn read_state(&self) -> Result<FileState> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(FileState::default())
        }
    }

    fn write_state(&self, state: &FileState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for FileMetadataStore {
    async fn store_metadata(&self, pair: &NamespacePair, key: &str, value: Value) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state()?;
        check_access(state.grants.get(&pair.requesting), pair, Access::Write)?;
        state
            .records
            .entry(pair.requested.clone())
            .or_default()
            .insert(key.to_string(), value);
        self.write_state(&state)?;
        Ok(true)
    }

    async fn read_metadata(&self, pair: &NamespacePair, key: &str) -> Result<Value> {
        let _guard = self.lock.lock().await;
        let state = self.read_state()?;
        check_access(state.grants.get(&pair.requesting), pair, Access::Read)?;
        Ok(state
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
        let _guard = self.lock.lock().await;
        let mut state = self.read_state()?;
        let entry = state.grants.entry(namespace.to_string()).or_default();
        entry.merge(set);
        let effective = entry.clone();
        self.write_state(&state)?;
        debug!(namespace, grants = effective.grants.len(), "permission grant persisted");
        Ok(effective)
    }

    async fn granted_permissions(&self, namespace: &str) -> Result<Option<CapabilitySet>> {
        let _guard = self.lock.lock().await;
        let state = self.read_state()?;
        Ok(state.grants.get(namespace).cloned())
    }
}
