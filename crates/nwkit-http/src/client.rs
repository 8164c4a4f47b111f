//! HTTP client configuration and request dispatch.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use nwkit_headers::Headers;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::control::ControlWatcher;
use crate::error::NwError;
use crate::progress::ProgressTracker;
use crate::request::RequestSpec;
use crate::response::{http_version, RawResponse};
use crate::status::ResponseStatus;

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connection timeout.
    #[serde(rename = "connect_timeout_secs", with = "duration_secs")]
    pub connect_timeout: Duration,
    /// Upper bound for any request; each request also carries its own.
    #[serde(rename = "request_timeout_secs", with = "duration_secs")]
    pub request_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: format!("nwkit/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Build a configured `reqwest` client.
pub fn build_client(config: &HttpConfig) -> Result<Client, NwError> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(config.pool_max_idle_per_host);

    if config.gzip {
        builder = builder.gzip(true);
    }

    builder.build().map_err(|e| {
        NwError::request_build(format!("failed to build HTTP client: {e}"))
            .with_identifier("client_build")
            .with_source(e)
    })
}

/// Performs [`RequestSpec`]s. Cheap to clone; clones share a connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Create a client with the default config.
    pub fn new() -> Result<Self, NwError> {
        Self::with_config(&HttpConfig::default())
    }

    /// Create a client with a custom config.
    pub fn with_config(config: &HttpConfig) -> Result<Self, NwError> {
        let inner = build_client(config)?;
        Ok(Self { inner })
    }

    /// Wrap an existing `reqwest` client.
    pub fn from_client(inner: Client) -> Self {
        Self { inner }
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Perform the request and read the whole body.
    pub async fn fire_raw(&self, spec: &RequestSpec) -> Result<RawResponse, NwError> {
        let builder = spec.request_builder(&self.inner)?;
        self.perform(spec, builder).await
    }

    /// Perform the request and decode the body as JSON.
    pub async fn fire<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T, NwError> {
        self.fire_raw(spec).await?.json()
    }

    /// Send a prepared builder and read a successful response in full.
    pub(crate) async fn perform(
        &self,
        spec: &RequestSpec,
        builder: RequestBuilder,
    ) -> Result<RawResponse, NwError> {
        let request = prepare(spec, builder).await?;
        let mut watcher = spec.control().attach();
        let response = self.send(request, &mut watcher).await?;
        let response = check_response(response).await?;
        read_response(response, spec, &mut watcher).await
    }

    /// Send once allowed to, racing the transfer against cancellation.
    pub(crate) async fn send(
        &self,
        request: reqwest::Request,
        watcher: &mut ControlWatcher,
    ) -> Result<reqwest::Response, NwError> {
        watcher.checkpoint().await?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending request");

        let response = tokio::select! {
            biased;
            _ = watcher.cancelled() => {
                debug!(%method, %url, "request cancelled");
                return Err(NwError::cancelled());
            }
            result = self.inner.execute(request) => result.map_err(NwError::from)?,
        };

        debug!(status = response.status().as_u16(), %url, "received response");
        Ok(response)
    }
}

/// Build the request and run the modifier and interceptor on it.
pub(crate) async fn prepare(
    spec: &RequestSpec,
    builder: RequestBuilder,
) -> Result<reqwest::Request, NwError> {
    let mut request = builder.build()?;

    if let Some(modifier) = &spec.request_modifier {
        modifier(&mut request)?;
    }
    if let Some(interceptor) = &spec.interceptor {
        interceptor.adapt(&mut request).await?;
    }
    Ok(request)
}

/// Turn a non-2xx response into an error carrying its headers and body.
pub(crate) async fn check_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, NwError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let headers = Headers::from(response.headers());
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), %url, "request failed");

    Err(NwError::from_response(status.into(), headers, body))
}

/// Next body chunk, honouring suspension and cancellation.
pub(crate) async fn next_chunk(
    response: &mut reqwest::Response,
    watcher: &mut ControlWatcher,
) -> Result<Option<Bytes>, NwError> {
    watcher.checkpoint().await?;

    tokio::select! {
        biased;
        _ = watcher.cancelled() => Err(NwError::cancelled()),
        chunk = response.chunk() => chunk.map_err(NwError::from),
    }
}

async fn read_response(
    mut response: reqwest::Response,
    spec: &RequestSpec,
    watcher: &mut ControlWatcher,
) -> Result<RawResponse, NwError> {
    let status = ResponseStatus::from(response.status());
    let version = http_version(response.version());
    let headers = Headers::from(response.headers());
    let tracker = ProgressTracker::new(response.content_length(), spec.download_progress.clone());

    let mut body = BytesMut::new();
    while let Some(chunk) = next_chunk(&mut response, watcher).await? {
        tracker.advance(chunk.len() as u64);
        body.extend_from_slice(&chunk);
    }

    let body = match &spec.response_preprocessor {
        Some(preprocess) => preprocess(body.freeze())?,
        None => body.freeze(),
    };

    Ok(RawResponse {
        status,
        version,
        headers,
        body,
    })
}
