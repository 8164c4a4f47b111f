//! Header errors.

use thiserror::Error;

/// A header name contained a byte outside the ASCII range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid header name {name:?}: header names must be ASCII")]
pub struct InvalidHeaderName {
    name: String,
}

impl InvalidHeaderName {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The rejected name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
