//! Process-wide client and free functions over it.

use bytes::Bytes;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;

use crate::client::HttpClient;
use crate::error::NwError;
use crate::request::RequestSpec;
use crate::response::Downloaded;

static SHARED: OnceCell<HttpClient> = OnceCell::new();

/// The shared client, built with the default config on first use.
pub fn shared() -> Result<&'static HttpClient, NwError> {
    SHARED.get_or_try_init(HttpClient::new)
}

/// Perform `spec` on the shared client and decode JSON.
pub async fn fire<T: DeserializeOwned>(spec: &RequestSpec) -> Result<T, NwError> {
    shared()?.fire(spec).await
}

/// Multipart upload on the shared client.
pub async fn upload<T: DeserializeOwned>(spec: &RequestSpec) -> Result<T, NwError> {
    shared()?.upload(spec).await
}

/// Download on the shared client.
pub async fn download(spec: &RequestSpec) -> Result<Downloaded, NwError> {
    shared()?.download(spec).await
}

/// Stream on the shared client.
pub async fn stream<F>(spec: &RequestSpec, on_chunk: F) -> Result<(), NwError>
where
    F: FnMut(Bytes),
{
    shared()?.stream(spec, on_chunk).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_is_built_once() {
        let first = shared().unwrap() as *const HttpClient;
        let second = shared().unwrap() as *const HttpClient;
        assert_eq!(first, second);
    }
}
