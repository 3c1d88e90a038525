//! Type handlers
//!
//! A handler knows how to read one kind of image endpoint and how to build a
//! generator for a target of that kind. Handlers are looked up by the type
//! identifier of a [`Specification`](crate::Specification).
//!
//! ## Key Components
//!
//! - [`Handler`] - Main trait for implementing custom handlers
//! - [`TypeRegistry`] - Registry mapping type identifiers to handlers
//! - [`RawHandler`] - Built-in pass-through handler (`raw`)
//! - [`RasterHandler`] - Built-in raster image handler (`raster`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use projection::handlers::TypeRegistry;
//!
//! let registry = TypeRegistry::with_defaults(storage);
//! let handler = registry.get_handler("raster")?;
//! let reader = handler.read(&source).await?;
//! let generator = handler.create_generator(reader, &target, &[]).await?;
//! ```

mod raster;
mod raw;
mod registry;
mod traits;

pub use raster::{DEFAULT_JPEG_QUALITY, RasterArtifact, RasterFilter, RasterHandler, RasterReader};
pub use raw::{RawArtifact, RawHandler, RawReader};
pub use registry::{RASTER_TYPE, RAW_TYPE, RegistryError, TypeRegistry};
pub use traits::{Artifact, DecodeCache, Filter, Generator, Handler, HandlerError, Reader};
