//! HTTP mocking over wiremock.

use std::time::Duration;

use serde::Serialize;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Mock server with helpers for the endpoint shapes the request tests need.
pub struct TestHttpServer {
    server: MockServer,
}

impl TestHttpServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Host part of the server address, for building request specs.
    pub fn host(&self) -> String {
        self.server.address().ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.server.address().port()
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.server.uri(), endpoint)
    }

    /// The wrapped server, for mocks with custom matchers.
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    async fn mount_get(&self, endpoint: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    pub async fn get_json<T: Serialize>(&self, endpoint: &str, body: &T) {
        self.mount_get(endpoint, ResponseTemplate::new(200).set_body_json(body))
            .await;
    }

    pub async fn get_bytes(&self, endpoint: &str, body: impl Into<Vec<u8>>) {
        self.mount_get(endpoint, ResponseTemplate::new(200).set_body_bytes(body.into()))
            .await;
    }

    /// Any method on `endpoint` fails with `status` and a plain-text body.
    pub async fn error(&self, endpoint: &str, status: u16, message: &str) {
        Mock::given(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_string(message))
            .mount(&self.server)
            .await;
    }

    /// Serve `body` as JSON only after `latency` has passed.
    pub async fn slow_json<T: Serialize>(&self, endpoint: &str, body: &T, latency: Duration) {
        let response = ResponseTemplate::new(200)
            .set_body_json(body)
            .set_delay(latency);
        Mock::given(path(endpoint))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Serve `responses` in order, each exactly once.
    pub async fn sequence(&self, endpoint: &str, responses: Vec<ResponseTemplate>) {
        for (i, response) in responses.into_iter().enumerate() {
            Mock::given(path(endpoint))
                .respond_with(response)
                .up_to_n_times(1)
                .with_priority(i as u8 + 1)
                .mount(&self.server)
                .await;
        }
    }

    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Panics unless exactly `times` requests reached `endpoint`.
    pub async fn verify_received(&self, endpoint: &str, times: usize) {
        let hits = self
            .received_requests()
            .await
            .into_iter()
            .filter(|request| request.url.path() == endpoint)
            .count();
        assert_eq!(hits, times, "requests to {endpoint}");
    }
}

/// Response templates for status-code cases.
pub mod responses {
    use wiremock::ResponseTemplate;

    pub fn ok() -> ResponseTemplate {
        ResponseTemplate::new(200)
    }

    pub fn not_found() -> ResponseTemplate {
        ResponseTemplate::new(404).set_body_string("Not found")
    }

    /// `429` with a `Retry-After` header and an empty body.
    pub fn rate_limited(retry_after: u32) -> ResponseTemplate {
        ResponseTemplate::new(429).insert_header("Retry-After", retry_after.to_string().as_str())
    }

    pub fn server_error() -> ResponseTemplate {
        ResponseTemplate::new(500).set_body_string("Internal server error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_address_parts_match_uri() {
        let server = TestHttpServer::start().await;
        assert_eq!(server.url(), format!("http://{}:{}", server.host(), server.port()));
        assert_eq!(server.url_for("/a"), format!("{}/a", server.url()));
    }

    #[tokio::test]
    async fn test_sequence_serves_in_order() {
        let server = TestHttpServer::start().await;
        server
            .sequence("/flaky", vec![responses::server_error(), responses::ok()])
            .await;

        let client = reqwest::Client::new();
        let first = client.get(server.url_for("/flaky")).send().await.unwrap();
        let second = client.get(server.url_for("/flaky")).send().await.unwrap();
        assert_eq!(first.status().as_u16(), 500);
        assert_eq!(second.status().as_u16(), 200);
        server.verify_received("/flaky", 2).await;
    }

    #[tokio::test]
    async fn test_slow_json_waits_before_answering() {
        let server = TestHttpServer::start().await;
        server
            .slow_json("/slow", &serde_json::json!({"ok": true}), Duration::from_millis(300))
            .await;

        let started = std::time::Instant::now();
        let response = reqwest::get(server.url_for("/slow")).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
