//! Conversion pipeline units
//!
//! A [`Conversion`] binds one target to the generator built for it and to the
//! listeners that should see the result. Running it consumes it.

mod error;
mod listener;

pub use error::ConvertError;
pub use listener::{Listener, ListenerError, Notification, SaveListener};

use std::fmt;
use std::sync::Arc;
use tracing::{Dispatch, debug, warn};
use uuid::Uuid;

use crate::handlers::{Artifact, Generator};
use crate::observability::with_logger;
use crate::specification::Specification;

pub struct Conversion {
    id: Uuid,
    target: Specification,
    generator: Box<dyn Generator>,
    listeners: Vec<Arc<dyn Listener>>,
    logger: Dispatch,
}

impl Conversion {
    pub fn new(target: Specification, generator: Box<dyn Generator>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            generator,
            listeners: Vec::new(),
            logger: Dispatch::none(),
        }
    }

    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.logger = logger;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target(&self) -> &Specification {
        &self.target
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners are notified in the order they were added
    pub fn add_listener(&mut self, listener: Arc<dyn Listener>) -> &mut Self {
        self.listeners.push(listener);
        self
    }

    /// Generates the artifact, then notifies every listener in order.
    ///
    /// A generation failure returns before any listener is notified. The first
    /// listener failure stops the remaining notifications and is returned.
    pub async fn run(self) -> Result<Arc<dyn Artifact>, ConvertError> {
        let Conversion {
            id,
            target,
            generator,
            listeners,
            logger,
        } = self;

        with_logger(&logger, || {
            debug!(
                conversion_id = %id,
                output = %target,
                listeners = listeners.len(),
                "Running conversion"
            )
        });

        let artifact = generator.generate().await.map_err(ConvertError::Generation)?;

        let notification = Notification {
            conversion_id: id,
            target: &target,
            artifact: artifact.as_ref(),
        };

        for (index, listener) in listeners.iter().enumerate() {
            if let Err(e) = listener.notify(&notification).await {
                with_logger(&logger, || {
                    warn!(
                        conversion_id = %id,
                        listener = index,
                        error = %e,
                        "Listener failed, remaining notifications skipped"
                    )
                });
                return Err(e.into());
            }
        }

        Ok(artifact)
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversion")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
