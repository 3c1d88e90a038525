//! Top-level entry point
//!
//! [`Framework`] composes a [`TypeRegistry`] and a [`Converter`] over it and
//! persists conversion results through a [`SaveListener`].
//!
//! ```rust,ignore
//! use projection::{Format, Framework, Specification, StorageClient};
//!
//! let framework = Framework::new(StorageClient::local("images")?);
//! framework
//!     .convert_with(
//!         &"raster:in.png".parse()?,
//!         &"raster:out/thumb.jpg@128x128".parse()?,
//!         Format::Jpeg,
//!         None,
//!     )
//!     .await?;
//! ```

mod converter;

pub use converter::Converter;

use std::sync::Arc;
use tracing::Dispatch;

use crate::conversion::{ConvertError, Listener, SaveListener};
use crate::encoding::{EncodingOptions, Format};
use crate::handlers::{Handler, RegistryError, TypeRegistry};
use crate::specification::Specification;
use crate::storage::StorageClient;

pub struct Framework {
    registry: Arc<TypeRegistry>,
    converter: Converter,
    storage: StorageClient,
}

impl Framework {
    /// Framework over a registry holding the built-in handlers
    pub fn new(storage: StorageClient) -> Self {
        let registry = TypeRegistry::with_defaults(storage.clone());
        Self::with_registry(registry, storage)
    }

    pub fn with_registry(registry: TypeRegistry, storage: StorageClient) -> Self {
        let registry = Arc::new(registry);
        Self {
            converter: Converter::new(registry.clone()),
            registry,
            storage,
        }
    }

    /// Routes pipeline logging to `logger` instead of discarding it
    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.converter = self.converter.with_logger(logger);
        self
    }

    pub fn handler(&self, type_id: &str) -> Result<Arc<dyn Handler>, RegistryError> {
        self.registry.get_handler(type_id)
    }

    /// Converts `source` into `target` as JPEG with handler-default options
    pub async fn convert(
        &self,
        source: &Specification,
        target: &Specification,
    ) -> Result<(), ConvertError> {
        self.convert_with(source, target, Format::default(), None).await
    }

    pub async fn convert_with(
        &self,
        source: &Specification,
        target: &Specification,
        format: Format,
        options: Option<EncodingOptions>,
    ) -> Result<(), ConvertError> {
        let listener: Arc<dyn Listener> = Arc::new(self.save_listener(format, options));
        let mut conversion = self.converter.create_conversion(source, target, &[]).await?;
        conversion.add_listener(listener);
        conversion.run().await?;
        Ok(())
    }

    /// Converts `source` into every target as JPEG with handler-default options
    pub async fn convert_all(
        &self,
        source: &Specification,
        targets: &[Specification],
    ) -> Result<(), ConvertError> {
        self.convert_all_with(source, targets, Format::default(), None)
            .await
    }

    /// Runs one conversion per target, in order, all saved by a single listener
    pub async fn convert_all_with(
        &self,
        source: &Specification,
        targets: &[Specification],
        format: Format,
        options: Option<EncodingOptions>,
    ) -> Result<(), ConvertError> {
        let conversions = self
            .converter
            .create_conversions(source, targets, &[])
            .await?;
        let listener: Arc<dyn Listener> = Arc::new(self.save_listener(format, options));

        for mut conversion in conversions {
            conversion.add_listener(listener.clone());
            conversion.run().await?;
        }
        Ok(())
    }

    /// Registers a type handler, replacing any existing one
    pub fn register(&self, type_id: impl Into<String>, handler: Arc<dyn Handler>) -> &Self {
        self.registry.register(type_id, handler);
        self
    }

    pub fn registered_types(&self) -> Vec<String> {
        self.registry.registered_types()
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &StorageClient {
        &self.storage
    }

    pub fn save_listener(&self, format: Format, options: Option<EncodingOptions>) -> SaveListener {
        SaveListener::new(self.storage.clone(), format, options)
    }
}
