//! HTTP access behind a narrow trait so the query engine can run against
//! a real server or canned responses.

use std::future::Future;
use std::pin::Pin;

use parking_lot::Mutex;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug)]
pub struct TransportError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn ok(content_type: &str, body: impl Into<String>) -> Self {
        Self::new(200, Some(content_type), body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Media type without parameters, lowercased.
    pub fn media_type(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .and_then(|c| c.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
    }
}

/// Issues GET requests.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility.
pub trait Transport: Send + Sync {
    /// `Ok` for any HTTP status; `Err` only when no response arrived.
    fn get(&self, url: &str) -> BoxFuture<'_, Result<HttpResponse, TransportError>>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        let url = url.to_string();
        Box::pin(async move {
            let resp = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| TransportError::with_source("HTTP request failed", e))?;

            let status = resp.status().as_u16();
            let content_type = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = resp
                .text()
                .await
                .map_err(|e| TransportError::with_source("Failed to read response", e))?;

            Ok(HttpResponse {
                status,
                content_type,
                body,
            })
        })
    }
}

enum Route {
    Respond(HttpResponse),
    Fail(String),
}

/// Canned responses keyed by URL substring, for tests and offline runs.
///
/// The first registered route whose pattern occurs in the URL answers.
/// Every requested URL is recorded in order.
#[derive(Default)]
pub struct MemoryTransport {
    routes: Mutex<Vec<(String, Route)>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, pattern: impl Into<String>, response: HttpResponse) -> &Self {
        self.routes
            .lock()
            .push((pattern.into(), Route::Respond(response)));
        self
    }

    pub fn fail(&self, pattern: impl Into<String>, message: impl Into<String>) -> &Self {
        self.routes
            .lock()
            .push((pattern.into(), Route::Fail(message.into())));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_matching(&self, pattern: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.contains(pattern)).count()
    }
}

impl Transport for MemoryTransport {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        self.calls.lock().push(url.to_string());
        let result = {
            let routes = self.routes.lock();
            match routes.iter().find(|(pattern, _)| url.contains(pattern.as_str())) {
                Some((_, Route::Respond(resp))) => Ok(resp.clone()),
                Some((_, Route::Fail(msg))) => Err(TransportError::new(msg.clone())),
                None => Err(TransportError::new(format!("no route for {url}"))),
            }
        };
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpResponse, MemoryTransport, Transport};

    #[tokio::test]
    async fn memory_transport_matches_first_route_and_records_calls() {
        let transport = MemoryTransport::new();
        transport
            .respond("REQUEST=GetCapabilities", HttpResponse::ok("text/xml", "<caps/>"))
            .fail("/wms", "connection refused");

        let caps = transport
            .get("https://gis.example/wms?REQUEST=GetCapabilities")
            .await
            .unwrap();
        assert_eq!(caps.body, "<caps/>");
        assert!(transport.get("https://gis.example/wms?x=1").await.is_err());
        assert!(transport.get("https://elsewhere/").await.is_err());
        assert_eq!(transport.calls().len(), 3);
        assert_eq!(transport.calls_matching("gis.example"), 2);
    }

    #[test]
    fn media_type_strips_parameters() {
        let resp = HttpResponse::ok("Application/JSON; charset=UTF-8", "{}");
        assert_eq!(resp.media_type().as_deref(), Some("application/json"));
        assert!(resp.is_success());
        assert!(!HttpResponse::new(503, None, "").is_success());
    }
}
