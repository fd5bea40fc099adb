//! Yahoo Finance market data provider.
//!
//! This provider uses the Yahoo Finance API to fetch market data for:
//! - Equities/ETFs (e.g., AAPL, SHOP.TO)
//! - Cryptocurrencies (e.g., BTC-USD)
//! - Foreign exchange rates (e.g., EURUSD=X)
//!
//! Every call runs through one authenticated [`Session`], acquired lazily on
//! first use and kept for the lifetime of the provider.

pub mod client;
pub mod models;
pub mod normalize;
pub mod session;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::classifier::FailureClassifier;
use crate::config::YahooConfig;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::errors::MarketDataError;
use crate::models::{ExchangeRate, SecurityInfo, SecurityPrice, SecuritySearchResult, UsageSnapshot};
use crate::provider::{ExchangeRateProvider, MarketDataProvider, SecurityProvider};
use crate::transport::{HttpTransport, ReqwestTransport};

use client::{QueryClient, SymbolBatch};
use session::{Session, SessionManager};

const PROVIDER_ID: &str = "YAHOO";

/// Yahoo symbol of a currency pair, e.g. `EURUSD=X`.
pub fn fx_pair_symbol(from: &str, to: &str) -> String {
    format!("{}{}=X", from, to)
}

/// Yahoo Finance market data provider.
///
/// Provides exchange rates, security search, security metadata and daily
/// prices through the unofficial Yahoo Finance API.
pub struct YahooProvider {
    transport: Arc<dyn HttpTransport>,
    config: Arc<YahooConfig>,
    sessions: SessionManager,
    diagnostics: Arc<dyn DiagnosticSink>,
    requests: Arc<AtomicU64>,
}

impl YahooProvider {
    /// Create a provider that talks to Yahoo over HTTP.
    pub fn new(config: YahooConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout));
        Self::with_transport(config, transport)
    }

    /// Create a provider configured from `LEDGERFEED_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(YahooConfig::from_env())
    }

    /// Create a provider on top of an arbitrary transport.
    pub fn with_transport(config: YahooConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let config = Arc::new(config);
        Self {
            sessions: SessionManager::new(transport.clone(), config.clone()),
            transport,
            config,
            diagnostics: Arc::new(LogSink),
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Send diagnostic events to `sink` instead of the log.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn config(&self) -> &YahooConfig {
        &self.config
    }

    /// Drop the cached session; the next call authenticates again.
    pub async fn reset_session(&self) {
        debug!("Resetting Yahoo session");
        self.sessions.reset().await;
    }

    /// Query client bound to the current session.
    async fn client(&self) -> Result<QueryClient, MarketDataError> {
        let session: Session = self.sessions.session().await?;
        Ok(QueryClient::with_counter(
            self.transport.clone(),
            self.config.clone(),
            session,
            self.requests.clone(),
        ))
    }

    fn classifier(&self) -> FailureClassifier<'_> {
        FailureClassifier::new(&*self.diagnostics)
    }

    /// Country of every search hit, in hit order.
    ///
    /// A failed lookup leaves the country empty; the hit is dropped later.
    async fn hit_countries(
        &self,
        client: &QueryClient,
        hits: &[models::YahooSearchQuote],
    ) -> Vec<Option<String>> {
        let symbols: Vec<String> = hits.iter().filter_map(|hit| hit.symbol.clone()).collect();
        let mut lookups = client.quote(SymbolBatch::from(symbols)).await.into_iter();

        hits.iter()
            .map(|hit| {
                hit.symbol.as_ref()?;
                match lookups.next()?.result {
                    Ok(quote) => quote.and_then(|q| q.region),
                    Err(e) => {
                        debug!("Country lookup failed: {}", e);
                        None
                    }
                }
            })
            .collect()
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new(YahooConfig::default())
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn healthy(&self) -> bool {
        match self.sessions.session().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Yahoo provider is unhealthy: {}", e);
                false
            }
        }
    }

    fn usage(&self) -> UsageSnapshot {
        UsageSnapshot::new(
            self.requests.load(Ordering::Relaxed),
            self.config.request_limit,
            self.config.plan_name.clone(),
        )
    }
}

#[async_trait]
impl ExchangeRateProvider for YahooProvider {
    async fn fetch_exchange_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<ExchangeRate, MarketDataError> {
        let symbol = fx_pair_symbol(from, to);
        debug!("Fetching exchange rate {} for {} from Yahoo", symbol, date);

        // Bars east of UTC are stamped the evening before; pad the window by a
        // day on each side and select by exchange-local date.
        let (Some(window_start), Some(window_end)) = (
            date.pred_opt(),
            date.succ_opt().and_then(|d| d.succ_opt()),
        ) else {
            return Err(MarketDataError::InvalidExchangeRate { pair: symbol, date });
        };

        let blocks = self
            .client()
            .await?
            .historical(symbol.as_str(), window_start, window_end)
            .await
            .into_single()?;

        normalize::single_exchange_rate(from, to, date, &blocks)
    }

    async fn fetch_exchange_rates(
        &self,
        from: &str,
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExchangeRate>, MarketDataError> {
        let symbol = fx_pair_symbol(from, to);
        debug!(
            "Fetching exchange rates {} from {} to {} from Yahoo",
            symbol, start, end
        );

        let blocks = self
            .client()
            .await?
            .historical(symbol.as_str(), start, end)
            .await
            .into_single()?;

        normalize::exchange_rate_series(from, to, start, &blocks, &self.classifier())
    }
}

#[async_trait]
impl SecurityProvider for YahooProvider {
    async fn search_securities(
        &self,
        symbol: &str,
        country_code: Option<&str>,
        exchange_mic: Option<&str>,
    ) -> Result<Vec<SecuritySearchResult>, MarketDataError> {
        debug!(
            "Searching Yahoo for '{}' (country: {:?}, exchange: {:?})",
            symbol, country_code, exchange_mic
        );

        let client = self.client().await?;
        let hits = client.search(symbol).await.into_single()?;
        let countries = self.hit_countries(&client, &hits).await;

        let classifier = self.classifier();
        let results = hits
            .iter()
            .zip(countries)
            .filter_map(|(hit, country)| {
                normalize::search_result(symbol, hit, country.as_deref(), &self.config, &classifier)
            })
            .filter(|result| {
                country_code.map_or(true, |code| result.country_code.eq_ignore_ascii_case(code))
            })
            .collect();

        Ok(results)
    }

    async fn fetch_security_info(
        &self,
        symbol: &str,
        _exchange_mic: Option<&str>,
    ) -> Result<SecurityInfo, MarketDataError> {
        debug!("Fetching security info for {} from Yahoo", symbol);

        let quote = self.client().await?.quote(symbol).await.into_single()?;
        normalize::security_info(symbol, quote)
    }

    async fn fetch_security_prices(
        &self,
        symbol: &str,
        _exchange_mic: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SecurityPrice>, MarketDataError> {
        // A zero-length window returns nothing; cover the whole day.
        let end = if start == end {
            end.succ_opt().unwrap_or(end)
        } else {
            end
        };

        debug!(
            "Fetching prices for {} from {} to {} from Yahoo",
            symbol, start, end
        );

        let blocks = self
            .client()
            .await?
            .historical(symbol, start, end)
            .await
            .into_single()?;

        normalize::security_price_series(symbol, start, &blocks, &self.classifier())
    }
}
