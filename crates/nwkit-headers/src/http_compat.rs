//! Conversions between [`Headers`] and `http::HeaderMap`.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::headers::Headers;

/// A header could not be represented in an `http::HeaderMap`.
#[derive(Debug, Error)]
pub enum HeaderConversionError {
    #[error("invalid header name {name:?}: {source}")]
    InvalidName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },

    #[error("invalid value for header {name:?}: {source}")]
    InvalidValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
}

/// `HeaderMap` names are lowercase ASCII already. Values that are not UTF-8
/// are decoded lossily.
impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Self {
        let mut headers = Headers::with_capacity(map.len());
        for (name, value) in map {
            headers.push_validated(
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        headers
    }
}

impl TryFrom<&Headers> for HeaderMap {
    type Error = HeaderConversionError;

    fn try_from(headers: &Headers) -> Result<Self, Self::Error> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|source| {
                HeaderConversionError::InvalidName {
                    name: name.to_string(),
                    source,
                }
            })?;
            let header_value = HeaderValue::from_bytes(value.as_bytes()).map_err(|source| {
                HeaderConversionError::InvalidValue {
                    name: name.to_string(),
                    source,
                }
            })?;
            map.append(header_name, header_value);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_header_map_keeps_duplicates() {
        let headers = Headers::try_from([("Accept", "a"), ("X-Id", "1"), ("accept", "b")]).unwrap();
        let map = HeaderMap::<HeaderValue>::try_from(&headers).unwrap();
        let accept: Vec<_> = map.get_all("accept").iter().map(|v| v.to_str().unwrap()).collect();
        assert_eq!(accept, vec!["a", "b"]);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_into_header_map_rejects_bad_tokens() {
        let headers = Headers::try_from([("Bad Name", "x")]).unwrap();
        assert!(matches!(
            HeaderMap::<HeaderValue>::try_from(&headers),
            Err(HeaderConversionError::InvalidName { .. })
        ));

        let headers = Headers::try_from([("X", "line\nbreak")]).unwrap();
        assert!(matches!(
            HeaderMap::<HeaderValue>::try_from(&headers),
            Err(HeaderConversionError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_from_header_map() {
        let mut map = HeaderMap::new();
        map.append("set-cookie", HeaderValue::from_static("a=1"));
        map.append("set-cookie", HeaderValue::from_static("b=2"));
        map.insert("content-type", HeaderValue::from_static("text/plain"));

        let headers = Headers::from(&map);
        assert_eq!(headers.get("Set-Cookie"), vec!["a=1", "b=2"]);
        assert_eq!(headers.first("Content-Type"), Some("text/plain"));
    }
}
