//! Namespaced metadata storage and permission ledger for the wallet gateway.
//!
//! Every record lives in a namespace, normally the origin of the page that
//! wrote it. A page may read or write another page's namespace only after
//! the user has granted it the matching capability; the store enforces
//! that rule on every call, so the gateway never has to.

pub mod error;
pub mod store;
pub mod store_file;
pub mod store_memory;
pub mod types;

pub use {
    error::{Error, Result},
    store::MetadataStore,
    store_file::FileMetadataStore,
    store_memory::MemoryMetadataStore,
    types::{Access, Capability, CapabilitySet, NamespacePair, normalize_permission_json},
};
