//! Keyed lookup tables for components and blueprints.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ErrorSeverity, SokolError};

/// Returns true if `id` is non-empty and only contains `[a-z0-9_-]`.
///
/// Component ids, slot keys and system ids all share this charset, so they can
/// be used as path segments and language-table keys without escaping.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-'))
}

/// Errors raised while mutating a [`Registry`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid id `{0}`: ids must match [a-z0-9_-]+")]
    InvalidId(String),

    #[error("id `{0}` is already registered")]
    Duplicate(String),
}

impl SokolError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "REGISTRY_INVALID_ID",
            Self::Duplicate(_) => "REGISTRY_DUPLICATE",
        }
    }
}

/// An object identified by a string id.
pub trait Keyed {
    fn id(&self) -> &str;
}

/// Keyed lookup table.
///
/// Entries are stored behind `Arc` so templates can be shared by every tree
/// that instantiates them. Registries are meant to be mutated during
/// load/reload only; no ordering is guaranteed on [`Registry::values`].
#[derive(Debug)]
pub struct Registry<T> {
    entries: HashMap<String, Arc<T>>,
}

impl<T: Keyed> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers `item`, failing without side effects on a malformed or
    /// duplicate id.
    pub fn register(&mut self, item: impl Into<Arc<T>>) -> Result<Arc<T>, RegistryError> {
        let item = item.into();
        let id = item.id();
        if !is_valid_id(id) {
            return Err(RegistryError::InvalidId(id.to_owned()));
        }
        if self.entries.contains_key(id) {
            return Err(RegistryError::Duplicate(id.to_owned()));
        }

        debug!(target: "sokol::registry", id, "registered");
        self.entries.insert(id.to_owned(), Arc::clone(&item));
        Ok(item)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<T>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Removes and returns the entry registered under `id`.
    pub fn unregister(&mut self, id: &str) -> Option<Arc<T>> {
        let removed = self.entries.remove(id);
        if removed.is_some() {
            debug!(target: "sokol::registry", id, "unregistered");
        }
        removed
    }

    pub fn values(&self) -> impl Iterator<Item = &Arc<T>> + '_ {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Keyed> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
