use async_trait::async_trait;
use bytes::Bytes;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use crate::encoding::{EncodingOptions, Format};
use crate::specification::Specification;
use crate::storage::StorageError;

/// Handler errors
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("read failed for {location}: {reason}")]
    Read { location: String, reason: String },
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(Format),
    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),
    #[error("invalid specification: {0}")]
    InvalidSpecification(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Decoded form of a reader's content, filled by the first handler that
/// decodes it and reused by every later target
#[derive(Default)]
pub struct DecodeCache {
    slot: OnceLock<Arc<dyn Any + Send + Sync>>,
}

impl DecodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value, if one of type `T` is present
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.slot.get()?.clone().downcast::<T>().ok()
    }

    /// Stores `value` unless the slot is already taken, returning whichever
    /// value ends up shared. A slot holding another type keeps it and
    /// `value` is handed back uncached.
    pub fn insert<T: Any + Send + Sync>(&self, value: Arc<T>) -> Arc<T> {
        let stored = self
            .slot
            .get_or_init(|| value.clone() as Arc<dyn Any + Send + Sync>);
        stored.clone().downcast::<T>().unwrap_or(value)
    }
}

impl fmt::Debug for DecodeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeCache")
            .field("filled", &self.slot.get().is_some())
            .finish()
    }
}

/// Decoded source image, shared read-only across every target built from it
pub trait Reader: Send + Sync {
    /// Specification the reader was produced from
    fn specification(&self) -> &Specification;

    /// Source payload as it was read
    fn content(&self) -> Bytes;

    /// Lets a handler recover its own decoded representation
    fn as_any(&self) -> &dyn Any;

    /// Slot where another handler may keep its decoding of `content()`
    fn decode_cache(&self) -> Option<&DecodeCache> {
        None
    }
}

/// Produces the artifact for exactly one target
#[async_trait]
pub trait Generator: Send {
    async fn generate(self: Box<Self>) -> Result<Arc<dyn Artifact>, HandlerError>;
}

/// Generator output, encodable on demand
pub trait Artifact: Send + Sync {
    fn encode(&self, format: Format, options: &EncodingOptions) -> Result<Bytes, HandlerError>;
}

/// Handler-interpreted transformation applied while generating a target
pub trait Filter: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// Type handler: reads sources and builds generators for targets
///
/// Handlers are registered under a type identifier in the
/// [`TypeRegistry`](super::TypeRegistry). The trait is async to allow I/O.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Decode the source described by `spec`
    async fn read(&self, spec: &Specification) -> Result<Arc<dyn Reader>, HandlerError>;

    /// Build a generator for `target` from an already decoded source
    async fn create_generator(
        &self,
        reader: Arc<dyn Reader>,
        target: &Specification,
        filters: &[Arc<dyn Filter>],
    ) -> Result<Box<dyn Generator>, HandlerError>;
}
