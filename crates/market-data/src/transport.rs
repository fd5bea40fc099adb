//! HTTP transport abstraction.
//!
//! The query client and session manager only speak to a [`HttpTransport`].
//! [`ReqwestTransport`] is the production implementation; [`ReplayTransport`]
//! serves canned responses for offline use and tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use reqwest::Client;
use thiserror::Error;

/// Outgoing GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    /// Header names are stored lowercase
    pub headers: BTreeMap<String, String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Response as seen by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw `Set-Cookie` header values, in order of appearance
    pub set_cookies: Vec<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            set_cookies: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.set_cookies.push(cookie.into());
        self
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Request could not be completed (connect, timeout, body read).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HttpError {
    message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Transport contract used by the session manager and query client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport whose requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, timeout }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self.client.get(&request.url).timeout(self.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::new(format!("request timeout: {}", e))
            } else if e.is_connect() {
                HttpError::new(format!("connection failed: {}", e))
            } else {
                HttpError::new(format!("request failed: {}", e))
            }
        })?;

        let status = response.status().as_u16();
        let set_cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();

        let body = response
            .text()
            .await
            .map_err(|e| HttpError::new(format!("failed to read response body: {}", e)))?;

        Ok(HttpResponse {
            status,
            set_cookies,
            body,
        })
    }
}

/// Serves canned responses keyed by a URL fragment.
///
/// The first route whose fragment occurs in the request URL wins. Requests
/// matching no route fail with a transport error. Every request is recorded.
#[derive(Debug, Default)]
pub struct ReplayTransport {
    routes: Vec<(String, Result<HttpResponse, HttpError>)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests containing `fragment` with `response`.
    pub fn route(mut self, fragment: impl Into<String>, response: HttpResponse) -> Self {
        self.routes.push((fragment.into(), Ok(response)));
        self
    }

    /// Fail requests containing `fragment` with a transport error.
    pub fn fail(mut self, fragment: impl Into<String>, message: impl Into<String>) -> Self {
        self.routes
            .push((fragment.into(), Err(HttpError::new(message))));
        self
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of recorded requests whose URL contains `fragment`.
    pub fn count_matching(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }
}

#[async_trait]
impl HttpTransport for ReplayTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = request.url.clone();
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        self.routes
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| Err(HttpError::new(format!("no route for {}", url))))
    }
}
