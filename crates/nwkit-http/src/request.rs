//! Request descriptions.
//!
//! A [`RequestSpec`] is a plain value holding everything needed to perform
//! a request: where it goes, what it carries, and the hooks that run
//! around it. It is handed to [`HttpClient`](crate::HttpClient) as is.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use nwkit_headers::{Headers, InvalidHeaderName};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::control::RequestControl;
use crate::error::NwError;
use crate::progress::{Progress, ProgressHandler};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Hook that edits the built request before it is sent.
pub type RequestModifier = Arc<dyn Fn(&mut reqwest::Request) -> Result<(), NwError> + Send + Sync>;

/// Hook that rewrites a response body before it is decoded.
pub type ResponsePreprocessor = Arc<dyn Fn(Bytes) -> Result<Bytes, NwError> + Send + Sync>;

/// Adapts outgoing requests, e.g. to attach credentials.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn adapt(&self, request: &mut reqwest::Request) -> Result<(), NwError>;
}

/// How [`RequestSpec::parameters`] are put on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParameterEncoding {
    /// Query string for GET, HEAD and DELETE; form body otherwise.
    #[default]
    Url,
    /// JSON body.
    Json,
}

/// A file sent as one part of a multipart upload.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub path: PathBuf,
    pub mime: Option<String>,
}

impl FilePart {
    pub fn new(field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            field: field.into(),
            path: path.into(),
            mime: None,
        }
    }

    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// Where a download is written.
#[derive(Debug, Clone)]
pub struct Destination {
    pub path: PathBuf,
    /// Create missing parent directories.
    pub create_intermediate_directories: bool,
    /// Replace an existing file instead of failing.
    pub remove_previous_file: bool,
}

impl Destination {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_intermediate_directories: false,
            remove_previous_file: false,
        }
    }

    pub fn create_intermediate_directories(mut self) -> Self {
        self.create_intermediate_directories = true;
        self
    }

    pub fn remove_previous_file(mut self) -> Self {
        self.remove_previous_file = true;
        self
    }
}

/// Description of a single request.
#[derive(Clone)]
pub struct RequestSpec {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub method: Method,
    /// Query items in order; `None` emits a bare key.
    pub query: Vec<(String, Option<String>)>,
    pub headers: Headers,
    pub parameters: Option<Map<String, Value>>,
    pub encoding: ParameterEncoding,
    /// Text fields of a multipart upload.
    pub form_fields: Vec<(String, String)>,
    /// File parts of a multipart upload.
    pub files: Vec<FilePart>,
    pub timeout: Duration,
    pub destination: Option<Destination>,
    pub request_modifier: Option<RequestModifier>,
    pub interceptor: Option<Arc<dyn Interceptor>>,
    pub response_preprocessor: Option<ResponsePreprocessor>,
    pub upload_progress: Option<ProgressHandler>,
    pub download_progress: Option<ProgressHandler>,
    control: RequestControl,
}

impl RequestSpec {
    /// A GET request for `path` on `host` over HTTPS.
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: "https".to_string(),
            host: host.into(),
            port: None,
            path: path.into(),
            method: Method::GET,
            query: Vec::new(),
            headers: Headers::new(),
            parameters: None,
            encoding: ParameterEncoding::default(),
            form_fields: Vec::new(),
            files: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            destination: None,
            request_modifier: None,
            interceptor: None,
            response_preprocessor: None,
            upload_progress: None,
            download_progress: None,
            control: RequestControl::new(),
        }
    }

    /// Split an absolute URL into a spec.
    pub fn from_url(url: &str) -> Result<Self, NwError> {
        let url = Url::parse(url)?;
        let host = url
            .host_str()
            .ok_or_else(|| NwError::request_build(format!("URL has no host: {url}")))?;

        let mut spec = Self::new(host, url.path()).scheme(url.scheme());
        spec.port = url.port();
        spec.query = url
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), Some(value.into_owned())))
            .collect();
        Ok(spec)
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set a query item, replacing any item with the same name.
    pub fn query(mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        let name = name.into();
        self.query.retain(|(existing, _)| *existing != name);
        self.query.push((name, value.map(Into::into)));
        self
    }

    /// Set a header, replacing earlier values for the same name.
    pub fn header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, InvalidHeaderName> {
        self.headers.replace_or_add(name, value)?;
        Ok(self)
    }

    /// Set one body parameter.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters
            .get_or_insert_with(Map::new)
            .insert(name.into(), value.into());
        self
    }

    /// Use the fields of `body` as JSON-encoded parameters.
    pub fn json_body<T: Serialize>(mut self, body: &T) -> Result<Self, NwError> {
        match serde_json::to_value(body) {
            Ok(Value::Object(map)) => {
                self.parameters = Some(map);
                self.encoding = ParameterEncoding::Json;
                Ok(self)
            }
            Ok(other) => Err(NwError::request_build(format!(
                "request body must be a JSON object, got {other}"
            ))),
            Err(e) => Err(NwError::request_build(format!("failed to encode body: {e}")).with_source(e)),
        }
    }

    pub fn encoding(mut self, encoding: ParameterEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn request_modifier<F>(mut self, modifier: F) -> Self
    where
        F: Fn(&mut reqwest::Request) -> Result<(), NwError> + Send + Sync + 'static,
    {
        self.request_modifier = Some(Arc::new(modifier));
        self
    }

    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptor = Some(Arc::new(interceptor));
        self
    }

    pub fn response_preprocessor<F>(mut self, preprocessor: F) -> Self
    where
        F: Fn(Bytes) -> Result<Bytes, NwError> + Send + Sync + 'static,
    {
        self.response_preprocessor = Some(Arc::new(preprocessor));
        self
    }

    pub fn upload_progress<F>(mut self, handler: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.upload_progress = Some(Arc::new(handler));
        self
    }

    pub fn download_progress<F>(mut self, handler: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.download_progress = Some(Arc::new(handler));
        self
    }

    /// Handle for cancelling, suspending or resuming this request.
    pub fn control(&self) -> &RequestControl {
        &self.control
    }

    /// Whether URL-encoded parameters go into the query string.
    pub(crate) fn parameters_in_query(&self) -> bool {
        self.encoding == ParameterEncoding::Url
            && matches!(self.method, Method::GET | Method::HEAD | Method::DELETE)
    }

    /// The full request URL, query included.
    pub fn url(&self) -> Result<Url, NwError> {
        let mut url = Url::parse(&format!("{}://{}", self.scheme, self.host))?;
        url.set_port(self.port)
            .map_err(|_| NwError::request_build(format!("cannot set a port on {url}")))?;
        url.set_path(&self.path);

        let mut pairs: Vec<(String, Option<String>)> = self.query.clone();
        if self.parameters_in_query() {
            if let Some(parameters) = &self.parameters {
                pairs.extend(url_encoded_pairs(parameters).into_iter().map(|(k, v)| (k, Some(v))));
            }
        }

        if !pairs.is_empty() {
            let mut serializer = url.query_pairs_mut();
            for (name, value) in &pairs {
                match value {
                    Some(value) => serializer.append_pair(name, value),
                    None => serializer.append_key_only(name),
                };
            }
        }
        Ok(url)
    }

    /// A `reqwest` builder carrying URL, headers and timeout, but no body.
    pub(crate) fn base_request_builder(&self, client: &Client) -> Result<RequestBuilder, NwError> {
        let url = self.url()?;
        let headers = HeaderMap::<HeaderValue>::try_from(&self.headers)?;
        Ok(client
            .request(self.method.clone(), url)
            .headers(headers)
            .timeout(self.timeout))
    }

    /// Like [`RequestSpec::base_request_builder`], with the parameters
    /// encoded into the body when they do not travel in the query.
    pub(crate) fn request_builder(&self, client: &Client) -> Result<RequestBuilder, NwError> {
        let mut builder = self.base_request_builder(client)?;

        if let Some(parameters) = &self.parameters {
            builder = match self.encoding {
                ParameterEncoding::Json => builder.json(parameters),
                ParameterEncoding::Url if !self.parameters_in_query() => {
                    builder.form(&url_encoded_pairs(parameters))
                }
                ParameterEncoding::Url => builder,
            };
        }
        Ok(builder)
    }
}

impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("encoding", &self.encoding)
            .field("files", &self.files)
            .field("timeout", &self.timeout)
            .field("destination", &self.destination)
            .field("interceptor", &self.interceptor.is_some())
            .field("control", &self.control.state())
            .finish_non_exhaustive()
    }
}

/// Flatten parameters into form pairs: nested objects become `key[sub]`,
/// arrays `key[]`, booleans `1`/`0`.
pub(crate) fn url_encoded_pairs(parameters: &Map<String, Value>) -> Vec<(String, String)> {
    fn flatten(key: String, value: &Value, out: &mut Vec<(String, String)>) {
        match value {
            Value::Object(map) => {
                for (sub, nested) in map {
                    flatten(format!("{key}[{sub}]"), nested, out);
                }
            }
            Value::Array(items) => {
                for item in items {
                    flatten(format!("{key}[]"), item, out);
                }
            }
            Value::Bool(b) => out.push((key, if *b { "1" } else { "0" }.to_string())),
            Value::String(s) => out.push((key, s.clone())),
            Value::Null => out.push((key, String::new())),
            Value::Number(n) => out.push((key, n.to_string())),
        }
    }

    let mut out = Vec::new();
    for (key, value) in parameters {
        flatten(key.clone(), value, &mut out);
    }
    out
}
