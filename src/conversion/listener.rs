use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::encoding::{EncodingOptions, Format};
use crate::handlers::{Artifact, HandlerError};
use crate::specification::Specification;
use crate::storage::{StorageClient, StorageError};

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error(transparent)]
    Encode(#[from] HandlerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("listener failed: {0}")]
    Other(String),
}

/// What a listener is told once a conversion has produced its artifact
pub struct Notification<'a> {
    pub conversion_id: Uuid,
    pub target: &'a Specification,
    pub artifact: &'a dyn Artifact,
}

/// Observer of finished conversions
///
/// One listener instance may be attached to many conversions.
#[async_trait]
pub trait Listener: Send + Sync {
    async fn notify(&self, notification: &Notification<'_>) -> Result<(), ListenerError>;
}

/// Persists each artifact under its target location
#[derive(Clone)]
pub struct SaveListener {
    storage: StorageClient,
    format: Format,
    options: EncodingOptions,
}

impl SaveListener {
    pub fn new(storage: StorageClient, format: Format, options: Option<EncodingOptions>) -> Self {
        Self {
            storage,
            format,
            options: options.unwrap_or_default(),
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn options(&self) -> &EncodingOptions {
        &self.options
    }
}

#[async_trait]
impl Listener for SaveListener {
    async fn notify(&self, notification: &Notification<'_>) -> Result<(), ListenerError> {
        let data = notification.artifact.encode(self.format, &self.options)?;
        let key = notification.target.location();

        self.storage.upload(key, data, &self.format.mime()).await?;

        tracing::debug!(
            conversion_id = %notification.conversion_id,
            key,
            format = %self.format,
            "Saved conversion artifact"
        );
        Ok(())
    }
}
