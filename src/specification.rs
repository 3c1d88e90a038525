//! Image endpoint descriptors
//!
//! A [`Specification`] names the handler responsible for an endpoint (its
//! type identifier) and where the endpoint lives in storage. Everything else
//! is handler-specific and treated as opaque by the pipeline.

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected '<type>:<location>', got '{0}'")]
    MissingSeparator(String),

    #[error("empty type identifier in '{0}'")]
    EmptyType(String),

    #[error("empty location in '{0}'")]
    EmptyLocation(String),

    #[error("invalid size '{0}', expected WIDTHxHEIGHT")]
    InvalidSize(String),
}

/// Target dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidSize(s.to_string());
        let (width, height) = s.split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = width.trim().parse().map_err(|_| invalid())?;
        let height: u32 = height.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Size { width, height })
    }
}

/// Immutable description of an image endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(on(String, into))]
pub struct Specification {
    type_id: String,
    location: String,
    size: Option<Size>,
    /// Handler-specific parameters (projection settings, hints, ...)
    #[builder(default)]
    #[serde(default)]
    parameters: BTreeMap<String, Value>,
}

impl Specification {
    pub fn new(type_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            location: location.into(),
            size: None,
            parameters: BTreeMap::new(),
        }
    }

    /// Handler lookup key
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn size(&self) -> Option<Size> {
        self.size
    }

    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }
}

impl fmt::Display for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_id, self.location)?;
        if let Some(size) = self.size {
            write!(f, "@{}", size)?;
        }
        Ok(())
    }
}

/// Parses `type:location` with an optional `@WIDTHxHEIGHT` suffix
///
/// Only a trailing `@<digits>x<digits>` is read as a size; any other `@`
/// belongs to the location.
impl FromStr for Specification {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (type_id, rest) = s
            .split_once(':')
            .ok_or_else(|| ParseError::MissingSeparator(s.to_string()))?;
        let type_id = type_id.trim();
        if type_id.is_empty() {
            return Err(ParseError::EmptyType(s.to_string()));
        }

        let (location, size) = match rest.rsplit_once('@') {
            Some((location, size)) if is_size_like(size) => {
                (location, Some(size.parse::<Size>()?))
            }
            _ => (rest, None),
        };
        if location.is_empty() {
            return Err(ParseError::EmptyLocation(s.to_string()));
        }

        Ok(Specification {
            type_id: type_id.to_string(),
            location: location.to_string(),
            size,
            parameters: BTreeMap::new(),
        })
    }
}

fn is_size_like(s: &str) -> bool {
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    s.split_once(['x', 'X'])
        .is_some_and(|(width, height)| digits(width) && digits(height))
}

/// Joins specifications for log output
pub(crate) fn display_list(specs: &[Specification]) -> String {
    let parts: Vec<String> = specs.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}
