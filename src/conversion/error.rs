use thiserror::Error;

use super::listener::ListenerError;
use crate::handlers::{HandlerError, RegistryError};

/// Pipeline failure, tagged with the stage it came from
///
/// Every variant is transparent: the message is the collaborator's own.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    UnknownType(#[from] RegistryError),
    /// Source handler could not read the source
    #[error(transparent)]
    Read(HandlerError),
    /// Target handler rejected the reader, target or filters
    #[error(transparent)]
    GeneratorConstruction(HandlerError),
    /// Artifact production failed during `run`
    #[error(transparent)]
    Generation(HandlerError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

impl ConvertError {
    pub fn stage(&self) -> &'static str {
        match self {
            ConvertError::UnknownType(_) => "resolve",
            ConvertError::Read(_) => "read",
            ConvertError::GeneratorConstruction(_) => "prepare",
            ConvertError::Generation(_) => "generate",
            ConvertError::Listener(_) => "notify",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_pass_through() {
        let err = ConvertError::Read(HandlerError::Decode("bad header".to_string()));
        assert_eq!(err.to_string(), "decode failed: bad header");
        assert_eq!(err.stage(), "read");

        let err: ConvertError = RegistryError::UnknownType("cube".to_string()).into();
        assert_eq!(err.to_string(), "unknown type: cube");
        assert_eq!(err.stage(), "resolve");
    }
}
