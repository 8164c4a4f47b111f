//! Request errors.

use std::time::Duration;

use nwkit_headers::{names, HeaderConversionError, Headers, InvalidHeaderName};
use thiserror::Error;

use crate::status::ResponseStatus;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The single error type delivered by every request operation.
///
/// Server failures carry the real status and response headers; failures
/// that happen before or instead of a response use the library codes on
/// [`ResponseStatus`].
#[derive(Debug, Error)]
#[error("{status}: {reason}")]
pub struct NwError {
    /// Short machine-readable classification.
    pub identifier: String,
    /// Status the error maps to.
    pub status: ResponseStatus,
    /// Headers to go with the error, usually the response headers.
    pub headers: Headers,
    /// Human-readable explanation.
    pub reason: String,
    #[source]
    source: Option<BoxError>,
}

/// Kinds of redirect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Redirect {
    /// Cacheable; user agents may switch to GET. `301`
    Permanent,
    /// Always followed with a GET. `303`
    #[default]
    Normal,
    /// Keeps the method and body. `307`
    Temporary,
    /// Permanent, keeping the method and body. `308`
    PermanentPost,
}

impl Redirect {
    /// The status sent for this kind of redirect.
    pub fn status(self) -> ResponseStatus {
        match self {
            Self::Permanent => ResponseStatus::MOVED_PERMANENTLY,
            Self::Normal => ResponseStatus::SEE_OTHER,
            Self::Temporary => ResponseStatus::TEMPORARY_REDIRECT,
            Self::PermanentPost => ResponseStatus::PERMANENT_REDIRECT,
        }
    }
}

impl NwError {
    /// An error for `status`, using its code as identifier and its reason
    /// phrase as reason.
    pub fn new(status: ResponseStatus) -> Self {
        Self {
            identifier: status.code().to_string(),
            reason: status.reason_phrase().to_string(),
            headers: Headers::new(),
            status,
            source: None,
        }
    }

    /// A redirect to `location`.
    pub fn redirect(location: impl Into<String>, redirect: Redirect) -> Self {
        let error = Self::new(redirect.status());
        match Headers::try_from([(names::LOCATION, location.into())]) {
            Ok(headers) => error.with_headers(headers),
            Err(e) => error.with_source(e),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The request could not be built.
    pub fn request_build(reason: impl Into<String>) -> Self {
        Self::new(ResponseStatus::REQUEST_BUILD_FAILURE)
            .with_identifier("request_build")
            .with_reason(reason)
    }

    /// The transport failed without a response.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::new(ResponseStatus::TRANSPORT_FAILURE)
            .with_identifier("transport")
            .with_reason(reason)
    }

    /// The request was cancelled.
    pub fn cancelled() -> Self {
        Self::new(ResponseStatus::CANCELLED).with_identifier("cancelled")
    }

    /// A JSON body could not be decoded.
    pub fn decode(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        let identifier = match err.classify() {
            Category::Io => "io",
            Category::Syntax => "data_corrupted",
            Category::Data => "type_mismatch",
            Category::Eof => "unexpected_eof",
        };
        Self::new(ResponseStatus::DECODE_FAILURE)
            .with_identifier(identifier)
            .with_reason(format!("decoding error: {err}"))
            .with_source(err)
    }

    /// The server answered with a non-success status.
    pub fn from_response(status: ResponseStatus, headers: Headers, body: String) -> Self {
        let error = Self::new(status).with_headers(headers);
        if body.is_empty() {
            error
        } else {
            error.with_reason(body)
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ResponseStatus::CANCELLED
    }

    pub fn is_timeout(&self) -> bool {
        self.identifier == "timeout"
    }

    /// `Retry-After` in seconds, if the error headers carry one.
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .first(names::RETRY_AFTER)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

impl From<reqwest::Error> for NwError {
    fn from(e: reqwest::Error) -> Self {
        let error = if let Some(status) = e.status() {
            Self::new(status.into())
        } else if e.is_timeout() {
            Self::transport("request timed out").with_identifier("timeout")
        } else if e.is_builder() {
            Self::request_build("invalid request")
        } else if e.is_decode() {
            Self::new(ResponseStatus::DECODE_FAILURE).with_identifier("decode")
        } else {
            Self::transport("request failed")
        };
        error.with_reason(e.to_string()).with_source(e)
    }
}

impl From<InvalidHeaderName> for NwError {
    fn from(e: InvalidHeaderName) -> Self {
        Self::request_build(e.to_string()).with_source(e)
    }
}

impl From<HeaderConversionError> for NwError {
    fn from(e: HeaderConversionError) -> Self {
        Self::request_build(e.to_string()).with_source(e)
    }
}

impl From<std::io::Error> for NwError {
    fn from(e: std::io::Error) -> Self {
        Self::transport(e.to_string()).with_identifier("io").with_source(e)
    }
}

impl From<url::ParseError> for NwError {
    fn from(e: url::ParseError) -> Self {
        Self::request_build(format!("invalid URL: {e}")).with_source(e)
    }
}
