use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ── Namespace scoping ────────────────────────────────────────────────────────

/// Storage scope of a single request: who is asking, and whose partition
/// they are asking about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePair {
    pub requesting: String,
    pub requested: String,
}

impl NamespacePair {
    /// A caller acts on its own namespace unless the payload explicitly
    /// names another one.
    pub fn resolve(origin: &str, requested: Option<&str>) -> Self {
        Self {
            requesting: origin.to_string(),
            requested: requested.unwrap_or(origin).to_string(),
        }
    }

    /// Whether the caller is acting on its own partition.
    pub fn is_own(&self) -> bool {
        self.requesting == self.requested
    }
}

// ── Capabilities ─────────────────────────────────────────────────────────────

/// Access kind checked against a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// One granted capability: the access a grantee holds on `namespace`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Capability {
    pub namespace: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

/// Normalized, deduplicated, namespace-sorted capability list. This is
/// what the user sees on the confirmation prompt and what the ledger
/// persists — grants are never stored in their raw requested form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CapabilitySet {
    pub grants: Vec<Capability>,
}

impl CapabilitySet {
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    pub fn allows(&self, namespace: &str, access: Access) -> bool {
        self.grants.iter().any(|cap| {
            cap.namespace == namespace
                && match access {
                    Access::Read => cap.read,
                    Access::Write => cap.write,
                }
        })
    }

    /// Merge another set into this one, OR-ing access bits per namespace.
    /// Keeps the set sorted and deduplicated.
    pub fn merge(&mut self, other: &CapabilitySet) {
        for cap in &other.grants {
            self.insert(cap.clone());
        }
    }

    fn insert(&mut self, cap: Capability) {
        if !cap.read && !cap.write {
            return;
        }
        match self
            .grants
            .iter_mut()
            .find(|existing| existing.namespace == cap.namespace)
        {
            Some(existing) => {
                existing.read |= cap.read;
                existing.write |= cap.write;
            },
            None => {
                self.grants.push(cap);
                self.grants.sort();
            },
        }
    }
}

// ── Permission request normalization ─────────────────────────────────────────

/// Normalize a raw requested-permission payload into a canonical
/// [`CapabilitySet`].
///
/// Two shapes are accepted:
/// - a list — entries are either capability objects
///   (`{"namespace": "...", "read": true, "write": false}`) or bare
///   namespace strings, which request read-only access;
/// - a map of namespace → access, where access is `"read"`, `"write"`,
///   `"readwrite"` (or `"rw"`), or a capability object.
///
/// Duplicates are merged by OR-ing their access bits, entries granting
/// nothing are dropped, and the result is sorted by namespace.
pub fn normalize_permission_json(raw: &Value) -> Result<CapabilitySet> {
    let mut set = CapabilitySet::default();
    match raw {
        Value::Array(entries) => {
            for entry in entries {
                set.insert(capability_from_entry(entry)?);
            }
        },
        Value::Object(map) => {
            for (namespace, access) in map {
                set.insert(capability_from_access(namespace, access)?);
            }
        },
        other => {
            return Err(Error::message(format!(
                "unsupported permission request shape: {other}"
            )));
        },
    }
    Ok(set)
}

fn capability_from_entry(entry: &Value) -> Result<Capability> {
    match entry {
        Value::String(namespace) => Ok(Capability {
            namespace: namespace.clone(),
            read: true,
            write: false,
        }),
        Value::Object(_) => {
            let cap: Capability = serde_json::from_value(entry.clone())?;
            Ok(cap)
        },
        other => Err(Error::message(format!(
            "unsupported permission entry: {other}"
        ))),
    }
}

fn capability_from_access(namespace: &str, access: &Value) -> Result<Capability> {
    let (read, write) = match access {
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "read" => (true, false),
            "write" => (false, true),
            "readwrite" | "rw" => (true, true),
            other => {
                return Err(Error::message(format!(
                    "unsupported access level '{other}' for namespace '{namespace}'"
                )));
            },
        },
        Value::Object(map) => (
            map.get("read").and_then(Value::as_bool).unwrap_or(false),
            map.get("write").and_then(Value::as_bool).unwrap_or(false),
        ),
        Value::Bool(true) => (true, false),
        Value::Bool(false) => (false, false),
        other => {
            return Err(Error::message(format!(
                "unsupported access spec for namespace '{namespace}': {other}"
            )));
        },
    };
    Ok(Capability {
        namespace: namespace.to_string(),
        read,
        write,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn namespace_defaults_to_caller_origin() {
        let pair = NamespacePair::resolve("https://app.aepps.com", None);
        assert_eq!(pair.requesting, "https://app.aepps.com");
        assert_eq!(pair.requested, "https://app.aepps.com");
        assert!(pair.is_own());
    }

    #[test]
    fn explicit_namespace_is_kept() {
        let pair = NamespacePair::resolve("https://a.aepps.com", Some("https://b.aepps.com"));
        assert_eq!(pair.requested, "https://b.aepps.com");
        assert!(!pair.is_own());
    }

    #[test]
    fn normalize_map_form() {
        let raw = serde_json::json!({
            "https://b.aepps.com": "readwrite",
            "https://a.aepps.com": "read",
        });
        let set = normalize_permission_json(&raw).unwrap();
        // Sorted by namespace.
        assert_eq!(set.grants[0].namespace, "https://a.aepps.com");
        assert!(set.grants[0].read && !set.grants[0].write);
        assert!(set.grants[1].read && set.grants[1].write);
    }

    #[test]
    fn normalize_list_form_merges_duplicates() {
        let raw = serde_json::json!([
            "https://a.aepps.com",
            { "namespace": "https://a.aepps.com", "write": true },
        ]);
        let set = normalize_permission_json(&raw).unwrap();
        assert_eq!(set.grants.len(), 1);
        assert!(set.grants[0].read && set.grants[0].write);
    }

    #[test]
    fn normalize_drops_empty_grants() {
        let raw = serde_json::json!({ "https://a.aepps.com": false });
        let set = normalize_permission_json(&raw).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn normalize_rejects_scalar_payload() {
        assert!(normalize_permission_json(&serde_json::json!("all")).is_err());
    }

    #[test]
    fn allows_checks_the_right_bit() {
        let set = normalize_permission_json(&serde_json::json!({
            "https://a.aepps.com": "read",
        }))
        .unwrap();
        assert!(set.allows("https://a.aepps.com", Access::Read));
        assert!(!set.allows("https://a.aepps.com", Access::Write));
        assert!(!set.allows("https://b.aepps.com", Access::Read));
    }
}
