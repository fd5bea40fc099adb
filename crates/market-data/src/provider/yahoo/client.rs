//! Query client for the quote, search and chart endpoints.
//!
//! Every operation takes a [`SymbolBatch`] and returns one tagged outcome per
//! symbol, in input order. A failing symbol never takes the rest of the
//! batch down with it.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use futures::stream::{self, StreamExt};
use reqwest::header;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::config::YahooConfig;
use crate::errors::MarketDataError;
use crate::transport::{HttpRequest, HttpTransport};

use super::models::{
    YahooChartEnvelope, YahooChartResult, YahooQuote, YahooQuoteEnvelope, YahooSearchEnvelope,
    YahooSearchQuote,
};
use super::session::Session;

/// Ordered list of symbols for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolBatch(Vec<String>);

impl SymbolBatch {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for SymbolBatch {
    fn from(symbol: &str) -> Self {
        Self(vec![symbol.to_string()])
    }
}

impl From<String> for SymbolBatch {
    fn from(symbol: String) -> Self {
        Self(vec![symbol])
    }
}

impl From<Vec<String>> for SymbolBatch {
    fn from(symbols: Vec<String>) -> Self {
        Self(symbols)
    }
}

impl From<&[&str]> for SymbolBatch {
    fn from(symbols: &[&str]) -> Self {
        Self(symbols.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for SymbolBatch {
    fn from(symbols: [&str; N]) -> Self {
        Self(symbols.iter().map(|s| s.to_string()).collect())
    }
}

/// Result of one symbol within a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolOutcome<T> {
    pub symbol: String,
    pub result: Result<T, MarketDataError>,
}

/// Outcomes of a batch, in the order the symbols were given.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult<T> {
    outcomes: Vec<SymbolOutcome<T>>,
}

impl<T> BatchResult<T> {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Outcome for `symbol` (first occurrence).
    pub fn get(&self, symbol: &str) -> Option<&Result<T, MarketDataError>> {
        self.outcomes
            .iter()
            .find(|o| o.symbol == symbol)
            .map(|o| &o.result)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolOutcome<T>> {
        self.outcomes.iter()
    }

    /// Outcome of a single-symbol batch.
    ///
    /// Outside of a batch loop a transport failure is the caller's failure.
    pub fn into_single(self) -> Result<T, MarketDataError> {
        self.outcomes
            .into_iter()
            .next()
            .map(|o| o.result)
            .unwrap_or_else(|| Err(MarketDataError::NotFound("empty symbol batch".to_string())))
    }
}

impl<T> IntoIterator for BatchResult<T> {
    type Item = SymbolOutcome<T>;
    type IntoIter = std::vec::IntoIter<SymbolOutcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

/// Issues authenticated queries with one session.
///
/// Cheap to build; the connection pool lives in the transport. Drop the client
/// once the enclosing operation is done.
pub struct QueryClient {
    transport: Arc<dyn HttpTransport>,
    config: Arc<YahooConfig>,
    session: Session,
    requests: Arc<AtomicU64>,
}

impl QueryClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        config: Arc<YahooConfig>,
        session: Session,
    ) -> Self {
        Self::with_counter(transport, config, session, Arc::new(AtomicU64::new(0)))
    }

    /// Like [`new`](Self::new), counting issued requests into `requests`.
    pub fn with_counter(
        transport: Arc<dyn HttpTransport>,
        config: Arc<YahooConfig>,
        session: Session,
        requests: Arc<AtomicU64>,
    ) -> Self {
        Self {
            transport,
            config,
            session,
            requests,
        }
    }

    /// Requests issued through the shared counter so far.
    pub fn requests_issued(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// v7 quote lookup, one request per symbol.
    ///
    /// `Ok(None)` means the provider knows no such symbol.
    pub async fn quote(&self, symbols: impl Into<SymbolBatch>) -> BatchResult<Option<YahooQuote>> {
        self.for_each_symbol(symbols.into(), |symbol| async move {
            let url = format!(
                "{}/v7/finance/quote?symbols={}&crumb={}",
                self.config.api_url,
                encode(&symbol),
                encode(self.session.crumb())
            );
            let envelope: YahooQuoteEnvelope = self.get_json(&symbol, &url).await?;

            if let Some(error) = envelope.api_error() {
                return Err(MarketDataError::Provider {
                    symbol,
                    message: error.describe(),
                });
            }

            Ok(envelope.into_first_quote())
        })
        .await
    }

    /// v1 search, one request per query string.
    pub async fn search(
        &self,
        symbols: impl Into<SymbolBatch>,
    ) -> BatchResult<Vec<YahooSearchQuote>> {
        self.for_each_symbol(symbols.into(), |symbol| async move {
            let url = format!(
                "{}/v1/finance/search?q={}&crumb={}",
                self.config.api_url,
                encode(&symbol),
                encode(self.session.crumb())
            );
            let envelope: YahooSearchEnvelope = self.get_json(&symbol, &url).await?;

            if let Some(error) = envelope.api_error() {
                return Err(MarketDataError::Provider {
                    symbol,
                    message: error.describe(),
                });
            }

            Ok(envelope.quotes)
        })
        .await
    }

    /// v8 daily chart between UTC midnight of `from` and UTC midnight of `to`.
    pub async fn historical(
        &self,
        symbols: impl Into<SymbolBatch>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> BatchResult<Vec<YahooChartResult>> {
        let period1 = unix_midnight(from);
        let period2 = unix_midnight(to);

        self.for_each_symbol(symbols.into(), |symbol| async move {
            let url = format!(
                "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&crumb={}",
                self.config.api_url,
                encode(&symbol),
                period1,
                period2,
                encode(self.session.crumb())
            );
            let envelope: YahooChartEnvelope = self.get_json(&symbol, &url).await?;

            match (envelope.chart.result, envelope.chart.error) {
                (Some(result), _) => Ok(result),
                (None, Some(error)) => Err(MarketDataError::Provider {
                    symbol,
                    message: error.describe(),
                }),
                (None, None) => Ok(Vec::new()),
            }
        })
        .await
    }

    /// Run `fetch` for every symbol with bounded parallelism, keeping input order.
    async fn for_each_symbol<T, F, Fut>(&self, symbols: SymbolBatch, fetch: F) -> BatchResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
    {
        let outcomes = stream::iter(symbols.into_inner())
            .map(|symbol| {
                let pending = fetch(symbol.clone());
                async move {
                    let result = pending.await;
                    if let Err(e) = &result {
                        warn!("Yahoo query failed for {}: {}", symbol, e);
                    }
                    SymbolOutcome { symbol, result }
                }
            })
            .buffered(self.config.max_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        BatchResult { outcomes }
    }

    /// GET `url` with the session attached and decode the JSON body.
    ///
    /// Transport failures, non-2xx statuses and malformed bodies all become
    /// [`MarketDataError::Transport`] for `symbol`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        symbol: &str,
        url: &str,
    ) -> Result<T, MarketDataError> {
        let request = HttpRequest::get(url)
            .with_header(header::USER_AGENT.as_str(), self.config.user_agent.as_str())
            .with_header(header::COOKIE.as_str(), self.session.cookie());

        self.requests.fetch_add(1, Ordering::Relaxed);
        debug!("GET {}", url);

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| MarketDataError::transport(symbol, e.message()))?;

        if !response.is_success() {
            return Err(MarketDataError::transport(
                symbol,
                format!("upstream returned status {}", response.status),
            ));
        }

        serde_json::from_str(&response.body)
            .map_err(|e| MarketDataError::transport(symbol, format!("malformed JSON body: {}", e)))
    }
}

/// Unix timestamp of midnight UTC at the start of `date`.
pub fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}
