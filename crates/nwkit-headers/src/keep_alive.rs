//! Connection persistence derived from the `Connection` header.

use serde::{Deserialize, Serialize};

use crate::compare::name_eq;
use crate::headers::Headers;
use crate::names;

/// Cached answer to "should this connection persist?".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepAliveState {
    /// The connection should be kept open.
    KeepAlive,
    /// The connection should be closed after this exchange.
    Close,
    /// Not known yet; the headers have to be scanned.
    #[default]
    Unknown,
}

/// HTTP protocol version of the message the headers belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HttpVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
}

impl HttpVersion {
    /// HTTP/1.0
    pub const HTTP_10: Self = Self::new(1, 0);
    /// HTTP/1.1
    pub const HTTP_11: Self = Self::new(1, 1);
    /// HTTP/2
    pub const HTTP_2: Self = Self::new(2, 0);

    /// Create a version from its components.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Headers {
    /// Whether the connection should persist, consulting the cached state
    /// first and scanning the `Connection` header otherwise.
    ///
    /// A freshly scanned answer is cached until the next mutation that
    /// touches `Connection`.
    pub fn resolve_keep_alive(&mut self, version: HttpVersion) -> bool {
        let state = match self.keep_alive_state() {
            KeepAliveState::Unknown => {
                let state = self.scan_keep_alive(version);
                self.set_keep_alive_state(state);
                state
            }
            known => known,
        };
        state == KeepAliveState::KeepAlive
    }

    /// Like [`Headers::resolve_keep_alive`], without caching the result.
    pub fn is_keep_alive(&self, version: HttpVersion) -> bool {
        match self.keep_alive_state() {
            KeepAliveState::Unknown => self.scan_keep_alive(version) == KeepAliveState::KeepAlive,
            known => known == KeepAliveState::KeepAlive,
        }
    }

    fn scan_keep_alive(&self, version: HttpVersion) -> KeepAliveState {
        let tokens = self.canonical_form(names::CONNECTION);
        let has_token = |wanted: &str| tokens.iter().any(|token| name_eq(token, wanted));

        if version >= HttpVersion::HTTP_11 {
            if has_token("close") {
                KeepAliveState::Close
            } else {
                KeepAliveState::KeepAlive
            }
        } else if has_token("keep-alive") {
            KeepAliveState::KeepAlive
        } else {
            KeepAliveState::Close
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(HttpVersion::HTTP_11, &[], true; "http11 defaults to keep alive")]
    #[test_case(HttpVersion::HTTP_11, &["close"], false; "http11 close")]
    #[test_case(HttpVersion::HTTP_11, &["Upgrade, CLOSE"], false; "http11 close in list")]
    #[test_case(HttpVersion::HTTP_10, &[], false; "http10 defaults to close")]
    #[test_case(HttpVersion::HTTP_10, &["Keep-Alive"], true; "http10 keep alive")]
    #[test_case(HttpVersion::HTTP_2, &["keep-alive"], true; "http2 keeps alive")]
    fn test_resolution(version: HttpVersion, connection: &[&str], expected: bool) {
        let mut h = Headers::new();
        for value in connection {
            h.add("Connection", *value).unwrap();
        }
        assert_eq!(h.is_keep_alive(version), expected);
        assert_eq!(h.keep_alive_state(), KeepAliveState::Unknown);
        assert_eq!(h.resolve_keep_alive(version), expected);
        assert_ne!(h.keep_alive_state(), KeepAliveState::Unknown);
    }

    #[test]
    fn test_cached_state_wins_until_connection_changes() {
        let mut h = Headers::new();
        h.add("Connection", "close").unwrap();
        assert!(!h.resolve_keep_alive(HttpVersion::HTTP_11));
        assert_eq!(h.keep_alive_state(), KeepAliveState::Close);

        // Cached state is version independent.
        assert!(!h.resolve_keep_alive(HttpVersion::HTTP_10));

        h.replace_or_add("Connection", "keep-alive").unwrap();
        assert_eq!(h.keep_alive_state(), KeepAliveState::Unknown);
        assert!(h.resolve_keep_alive(HttpVersion::HTTP_11));
        assert_eq!(h.keep_alive_state(), KeepAliveState::KeepAlive);
    }

    #[test]
    fn test_version_ordering() {
        assert!(HttpVersion::HTTP_10 < HttpVersion::HTTP_11);
        assert!(HttpVersion::HTTP_11 < HttpVersion::HTTP_2);
    }
}
