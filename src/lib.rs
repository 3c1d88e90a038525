pub mod config;
pub mod conversion;
pub mod encoding;
pub mod framework;
pub mod handlers;
pub mod observability;
pub mod specification;
pub mod storage;

pub use conversion::{Conversion, ConvertError, Listener, ListenerError, Notification, SaveListener};
pub use encoding::{EncodingOptions, Format};
pub use framework::{Converter, Framework};
pub use handlers::{
    Artifact, Filter, Generator, Handler, HandlerError, RasterFilter, Reader, RegistryError,
    TypeRegistry,
};
pub use specification::{Size, Specification};
pub use storage::StorageClient;
