//! HTTP response types.

use std::path::PathBuf;

use bytes::Bytes;
use nwkit_headers::{names, Headers, HttpVersion};
use serde::de::DeserializeOwned;

use crate::error::NwError;
use crate::status::ResponseStatus;

/// A fully read response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: ResponseStatus,
    pub version: HttpVersion,
    pub headers: Headers,
    pub body: Bytes,
}

impl RawResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, NwError> {
        decode_json(&self.body).map_err(|e| e.with_headers(self.headers.clone()))
    }

    /// The body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The `Location` header.
    pub fn location(&self) -> Option<&str> {
        self.headers.first(names::LOCATION)
    }

    /// Whether the server intends to keep the connection open.
    pub fn keep_alive(&mut self) -> bool {
        self.headers.resolve_keep_alive(self.version)
    }
}

/// Result of a download.
#[derive(Debug, Clone)]
pub struct Downloaded {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub status: ResponseStatus,
    pub headers: Headers,
}

/// Parse a JSON body.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, NwError> {
    serde_json::from_slice(bytes).map_err(NwError::decode)
}

pub(crate) fn http_version(version: reqwest::Version) -> HttpVersion {
    if version == reqwest::Version::HTTP_09 {
        HttpVersion::new(0, 9)
    } else if version == reqwest::Version::HTTP_10 {
        HttpVersion::HTTP_10
    } else if version == reqwest::Version::HTTP_11 {
        HttpVersion::HTTP_11
    } else if version == reqwest::Version::HTTP_2 {
        HttpVersion::HTTP_2
    } else {
        HttpVersion::new(3, 0)
    }
}
