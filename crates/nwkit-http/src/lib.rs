//! Typed HTTP requests for nwkit.
//!
//! Requests are described by a [`RequestSpec`] and performed by an
//! [`HttpClient`]; transport, TLS and connection pooling are left to
//! `reqwest`. Every operation delivers exactly one result.

pub mod client;
pub mod control;
pub mod error;
pub mod interface;
pub mod progress;
pub mod request;
pub mod response;
pub mod status;
mod transfer;

pub use client::{build_client, HttpClient, HttpConfig};
pub use control::{ControlState, RequestControl};
pub use error::{NwError, Redirect};
pub use interface::{download, fire, shared, stream, upload};
pub use progress::{Progress, ProgressHandler};
pub use request::{
    Destination, FilePart, Interceptor, ParameterEncoding, RequestModifier, RequestSpec,
    ResponsePreprocessor, DEFAULT_TIMEOUT,
};
pub use response::{decode_json, Downloaded, RawResponse};
pub use status::ResponseStatus;

pub use nwkit_headers::{names, Headers, HttpVersion, InvalidHeaderName, KeepAliveState};
pub use reqwest::Method;

/// Result alias for request operations.
pub type NwResult<T> = Result<T, NwError>;
