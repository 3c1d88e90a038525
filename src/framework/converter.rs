use std::sync::Arc;
use tracing::{Dispatch, debug};

use crate::conversion::{Conversion, ConvertError};
use crate::handlers::{Filter, Reader, TypeRegistry};
use crate::observability::with_logger;
use crate::specification::{Specification, display_list};

/// Builds conversion pipelines by dispatching specifications to handlers
///
/// The converter does no pixel work; it resolves handlers, reads sources and
/// asks target handlers for generators. Handler errors are returned as-is,
/// tagged with the stage that produced them.
#[derive(Clone)]
pub struct Converter {
    registry: Arc<TypeRegistry>,
    logger: Dispatch,
}

impl Converter {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            logger: Dispatch::none(),
        }
    }

    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.logger = logger;
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Creates the conversion pipeline for a single target
    pub async fn create_conversion(
        &self,
        source: &Specification,
        target: &Specification,
        filters: &[Arc<dyn Filter>],
    ) -> Result<Conversion, ConvertError> {
        with_logger(&self.logger, || {
            debug!(
                source = %source,
                output = %target,
                "Converting {} to target {}", source, target
            )
        });

        let reader = self.reader(source).await?;
        self.instantiate(reader, target, filters).await
    }

    /// Creates one conversion per target, reading the source only once.
    ///
    /// The first failing target aborts the whole batch.
    pub async fn create_conversions(
        &self,
        source: &Specification,
        targets: &[Specification],
        filters: &[Arc<dyn Filter>],
    ) -> Result<Vec<Conversion>, ConvertError> {
        with_logger(&self.logger, || {
            let targets = display_list(targets);
            debug!(
                source = %source,
                targets = %targets,
                "Converting {} to targets {}", source, targets
            )
        });

        let reader = self.reader(source).await?;

        let mut conversions = Vec::with_capacity(targets.len());
        for target in targets {
            conversions.push(self.instantiate(reader.clone(), target, filters).await?);
        }
        Ok(conversions)
    }

    async fn reader(&self, source: &Specification) -> Result<Arc<dyn Reader>, ConvertError> {
        self.registry
            .get_handler(source.type_id())?
            .read(source)
            .await
            .map_err(ConvertError::Read)
    }

    async fn instantiate(
        &self,
        reader: Arc<dyn Reader>,
        target: &Specification,
        filters: &[Arc<dyn Filter>],
    ) -> Result<Conversion, ConvertError> {
        let generator = self
            .registry
            .get_handler(target.type_id())?
            .create_generator(reader, target, filters)
            .await
            .map_err(ConvertError::GeneratorConstruction)?;

        Ok(Conversion::new(target.clone(), generator).with_logger(self.logger.clone()))
    }
}
