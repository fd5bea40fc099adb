//! Cookie/crumb authentication.
//!
//! Yahoo's unofficial API requires:
//! 1. A session cookie handed out by the cookie host
//! 2. A crumb token fetched with that cookie, sent as a query parameter on
//!    every call afterwards

use std::sync::Arc;

use reqwest::header;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::YahooConfig;
use crate::errors::MarketDataError;
use crate::transport::{HttpRequest, HttpTransport};

/// Authenticated session attached to every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    cookie: String,
    crumb: String,
}

impl Session {
    pub fn new(cookie: impl Into<String>, crumb: impl Into<String>) -> Self {
        Self {
            cookie: cookie.into(),
            crumb: crumb.into(),
        }
    }

    /// Cookie header value, e.g. `A3=d=AQABBK...`
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub fn crumb(&self) -> &str {
        &self.crumb
    }
}

/// Acquires the session and keeps it for the lifetime of the owner.
///
/// There is no expiry detection; [`reset`](Self::reset) drops the cached
/// session so the next caller authenticates again.
pub struct SessionManager {
    transport: Arc<dyn HttpTransport>,
    config: Arc<YahooConfig>,
    cached: Mutex<Option<Session>>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn HttpTransport>, config: Arc<YahooConfig>) -> Self {
        Self {
            transport,
            config,
            cached: Mutex::new(None),
        }
    }

    /// Cached session, acquiring one first if needed.
    ///
    /// Concurrent callers wait for a single acquisition.
    pub async fn session(&self) -> Result<Session, MarketDataError> {
        let mut guard = self.cached.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }

        let session = self.acquire().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Forget the cached session.
    pub async fn reset(&self) {
        *self.cached.lock().await = None;
    }

    /// Fetch a fresh cookie and crumb. Both steps must succeed.
    pub async fn acquire(&self) -> Result<Session, MarketDataError> {
        let cookie = self.fetch_cookie().await?;
        let crumb = self.fetch_crumb(&cookie).await?;
        debug!("Acquired Yahoo session");
        Ok(Session { cookie, crumb })
    }

    async fn fetch_cookie(&self) -> Result<String, MarketDataError> {
        let request = HttpRequest::get(self.config.cookie_url.as_str());

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| MarketDataError::Auth(format!("Failed to get cookie: {}", e)))?;

        // The cookie host answers 404 while still setting the cookie.
        first_cookie(&response.set_cookies).ok_or_else(|| {
            warn!(
                "Cookie endpoint returned status {} without a usable Set-Cookie header",
                response.status
            );
            MarketDataError::Auth("Failed to parse Yahoo cookie".to_string())
        })
    }

    async fn fetch_crumb(&self, cookie: &str) -> Result<String, MarketDataError> {
        let request = HttpRequest::get(self.config.crumb_url.as_str())
            .with_header(header::USER_AGENT.as_str(), self.config.user_agent.as_str())
            .with_header(header::COOKIE.as_str(), cookie);

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| MarketDataError::Auth(format!("Failed to get crumb: {}", e)))?;

        if !response.is_success() {
            return Err(MarketDataError::Auth(format!(
                "Crumb endpoint returned status {}",
                response.status
            )));
        }

        let crumb = response.body.trim();
        if crumb.is_empty() {
            return Err(MarketDataError::Auth("Empty crumb".to_string()));
        }
        if crumb.contains("<html") || crumb.contains("<!DOCTYPE") || crumb.contains(' ') {
            return Err(MarketDataError::Auth(
                "Crumb endpoint returned an unexpected payload".to_string(),
            ));
        }

        Ok(crumb.to_string())
    }
}

/// First `Set-Cookie` value up to its first attribute delimiter.
fn first_cookie(set_cookies: &[String]) -> Option<String> {
    let raw = set_cookies.first()?;
    let value = raw.split(';').next()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
