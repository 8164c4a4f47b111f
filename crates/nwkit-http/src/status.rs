//! Response status codes, including the library's own failure codes.

use std::borrow::Cow;
use std::fmt;

use reqwest::StatusCode;
use serde::Serialize;

/// A status code paired with its reason phrase.
///
/// Codes at or above 10000 never come from a server; they classify
/// failures that happened before a response was available.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResponseStatus {
    code: u16,
    reason_phrase: Cow<'static, str>,
}

impl ResponseStatus {
    pub const OK: Self = Self::from_static(200, "OK");
    pub const MOVED_PERMANENTLY: Self = Self::from_static(301, "Moved Permanently");
    pub const SEE_OTHER: Self = Self::from_static(303, "See Other");
    pub const TEMPORARY_REDIRECT: Self = Self::from_static(307, "Temporary Redirect");
    pub const PERMANENT_REDIRECT: Self = Self::from_static(308, "Permanent Redirect");
    pub const BAD_REQUEST: Self = Self::from_static(400, "Bad Request");

    /// The transport failed without producing a response.
    pub const TRANSPORT_FAILURE: Self = Self::from_static(10001, "Transport Failure");
    /// The request could not be built.
    pub const REQUEST_BUILD_FAILURE: Self = Self::from_static(10002, "Request Build Failure");
    /// The response body could not be decoded.
    pub const DECODE_FAILURE: Self = Self::from_static(10003, "Decode Failure");
    /// The request was cancelled through its control handle.
    pub const CANCELLED: Self = Self::from_static(10004, "Cancelled");

    const fn from_static(code: u16, reason_phrase: &'static str) -> Self {
        Self {
            code,
            reason_phrase: Cow::Borrowed(reason_phrase),
        }
    }

    /// A status with a custom reason phrase.
    pub fn new(code: u16, reason_phrase: impl Into<String>) -> Self {
        Self {
            code,
            reason_phrase: Cow::Owned(reason_phrase.into()),
        }
    }

    /// Look up the reason phrase for `code`.
    pub fn from_code(code: u16) -> Self {
        match code {
            10001 => Self::TRANSPORT_FAILURE,
            10002 => Self::REQUEST_BUILD_FAILURE,
            10003 => Self::DECODE_FAILURE,
            10004 => Self::CANCELLED,
            _ => {
                let phrase = StatusCode::from_u16(code)
                    .ok()
                    .and_then(|status| status.canonical_reason())
                    .unwrap_or("Unknown");
                Self::from_static(code, phrase)
            }
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Whether the code is one of the library failure codes.
    pub fn is_library_code(&self) -> bool {
        self.code >= 10000
    }
}

impl From<StatusCode> for ResponseStatus {
    fn from(status: StatusCode) -> Self {
        Self::from_code(status.as_u16())
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason_phrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(200, "OK")]
    #[test_case(404, "Not Found")]
    #[test_case(503, "Service Unavailable")]
    #[test_case(10001, "Transport Failure")]
    #[test_case(10003, "Decode Failure")]
    #[test_case(599, "Unknown")]
    fn test_reason_phrases(code: u16, phrase: &str) {
        let status = ResponseStatus::from_code(code);
        assert_eq!(status.code(), code);
        assert_eq!(status.reason_phrase(), phrase);
    }

    #[test]
    fn test_library_codes() {
        assert!(ResponseStatus::CANCELLED.is_library_code());
        assert!(!ResponseStatus::BAD_REQUEST.is_library_code());
        assert!(ResponseStatus::OK.is_success());
        assert!(!ResponseStatus::SEE_OTHER.is_success());
    }

    #[test]
    fn test_display() {
        assert_eq!(ResponseStatus::from(StatusCode::NOT_FOUND).to_string(), "404 Not Found");
        assert_eq!(ResponseStatus::new(499, "Client Closed").to_string(), "499 Client Closed");
    }
}
