use async_trait::async_trait;
use bytes::Bytes;
use std::any::Any;
use std::sync::Arc;

use super::traits::{Artifact, DecodeCache, Filter, Generator, Handler, HandlerError, Reader};
use crate::encoding::{EncodingOptions, Format};
use crate::specification::Specification;
use crate::storage::{StorageClient, StorageError};

/// Pass-through handler
///
/// Reads the stored bytes as-is and echoes them into every target. Only
/// [`Format::Raw`] output is supported since nothing is decoded.
#[derive(Clone)]
pub struct RawHandler {
    storage: StorageClient,
}

impl RawHandler {
    pub fn new(storage: StorageClient) -> Self {
        Self { storage }
    }
}

#[derive(Debug)]
pub struct RawReader {
    spec: Specification,
    content: Bytes,
    decoded: DecodeCache,
}

impl RawReader {
    pub fn new(spec: Specification, content: Bytes) -> Self {
        Self {
            spec,
            content,
            decoded: DecodeCache::new(),
        }
    }
}

impl Reader for RawReader {
    fn specification(&self) -> &Specification {
        &self.spec
    }

    fn content(&self) -> Bytes {
        self.content.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn decode_cache(&self) -> Option<&DecodeCache> {
        Some(&self.decoded)
    }
}

struct RawGenerator {
    reader: Arc<dyn Reader>,
}

#[async_trait]
impl Generator for RawGenerator {
    async fn generate(self: Box<Self>) -> Result<Arc<dyn Artifact>, HandlerError> {
        Ok(Arc::new(RawArtifact(self.reader.content())))
    }
}

/// Undecoded bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArtifact(pub Bytes);

impl Artifact for RawArtifact {
    fn encode(&self, format: Format, _options: &EncodingOptions) -> Result<Bytes, HandlerError> {
        match format {
            Format::Raw => Ok(self.0.clone()),
            other => Err(HandlerError::UnsupportedFormat(other)),
        }
    }
}

#[async_trait]
impl Handler for RawHandler {
    async fn read(&self, spec: &Specification) -> Result<Arc<dyn Reader>, HandlerError> {
        let content = self
            .storage
            .download(spec.location())
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => HandlerError::Read {
                    location: spec.location().to_string(),
                    reason: "no such object".to_string(),
                },
                other => other.into(),
            })?;

        Ok(Arc::new(RawReader::new(spec.clone(), content)))
    }

    async fn create_generator(
        &self,
        reader: Arc<dyn Reader>,
        _target: &Specification,
        filters: &[Arc<dyn Filter>],
    ) -> Result<Box<dyn Generator>, HandlerError> {
        if let Some(filter) = filters.first() {
            return Err(HandlerError::UnsupportedFilter(filter.name().to_string()));
        }

        Ok(Box::new(RawGenerator { reader }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::RasterFilter;

    async fn handler_with(key: &str, data: &'static [u8]) -> RawHandler {
        let storage = StorageClient::in_memory();
        storage
            .upload(key, Bytes::from_static(data), &mime::APPLICATION_OCTET_STREAM)
            .await
            .unwrap();
        RawHandler::new(storage)
    }

    #[tokio::test]
    async fn test_raw_handler_echoes_content() {
        let handler = handler_with("in.bin", b"\x00\x01\x02").await;
        let source = Specification::new("raw", "in.bin");
        let target = Specification::new("raw", "out.bin");

        let reader = handler.read(&source).await.unwrap();
        assert_eq!(reader.specification(), &source);

        let generator = handler.create_generator(reader, &target, &[]).await.unwrap();
        let artifact = generator.generate().await.unwrap();
        let bytes = artifact.encode(Format::Raw, &EncodingOptions::default()).unwrap();
        assert_eq!(&bytes[..], b"\x00\x01\x02");
    }

    #[tokio::test]
    async fn test_raw_handler_missing_source() {
        let handler = RawHandler::new(StorageClient::in_memory());
        let result = handler.read(&Specification::new("raw", "missing.bin")).await;
        assert!(matches!(result, Err(HandlerError::Read { .. })));
    }

    #[tokio::test]
    async fn test_raw_handler_rejects_filters() {
        let handler = handler_with("in.bin", b"abc").await;
        let reader = handler.read(&Specification::new("raw", "in.bin")).await.unwrap();
        let filters: Vec<Arc<dyn Filter>> = vec![Arc::new(RasterFilter::Grayscale)];

        let result = handler
            .create_generator(reader, &Specification::new("raw", "out.bin"), &filters)
            .await;
        assert!(matches!(result, Err(HandlerError::UnsupportedFilter(ref name)) if name == "grayscale"));
    }

    #[test]
    fn test_raw_artifact_only_encodes_raw() {
        let artifact = RawArtifact(Bytes::from_static(b"abc"));
        let result = artifact.encode(Format::Jpeg, &EncodingOptions::default());
        assert!(matches!(result, Err(HandlerError::UnsupportedFormat(Format::Jpeg))));
    }
}
