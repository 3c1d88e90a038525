use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

use super::raster::RasterHandler;
use super::raw::RawHandler;
use super::traits::Handler;
use crate::storage::StorageClient;

/// Type identifier of the built-in pass-through handler
pub const RAW_TYPE: &str = "raw";
/// Type identifier of the built-in raster handler
pub const RASTER_TYPE: &str = "raster";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown type: {0}")]
    UnknownType(String),
}

/// Registry mapping type identifiers to handler instances
///
/// Registration goes through `&self` so the registry can be shared between
/// the framework and its converter; later registrations are visible to both.
#[derive(Default)]
pub struct TypeRegistry {
    handlers: RwLock<BTreeMap<String, Arc<dyn Handler>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `type_id` to `handler`, replacing any previous binding
    pub fn register(&self, type_id: impl Into<String>, handler: Arc<dyn Handler>) -> &Self {
        let type_id = type_id.into();
        let previous = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(type_id.clone(), handler);

        if previous.is_some() {
            tracing::debug!(type_id, "Replaced handler registration");
        }
        self
    }

    pub fn get_handler(&self, type_id: &str) -> Result<Arc<dyn Handler>, RegistryError> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownType(type_id.to_string()))
    }

    pub fn has_handler(&self, type_id: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(type_id)
    }

    /// Currently bound type identifiers, sorted
    pub fn registered_types(&self) -> Vec<String> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Binds the built-in handlers, all reading from `storage`
    pub fn register_defaults(&self, storage: StorageClient) -> &Self {
        self.register(RAW_TYPE, Arc::new(RawHandler::new(storage.clone())))
            .register(RASTER_TYPE, Arc::new(RasterHandler::new(storage)))
    }

    /// Create default registry with built-in handlers
    pub fn with_defaults(storage: StorageClient) -> Self {
        let registry = Self::new();
        registry.register_defaults(storage);
        registry
    }
}
