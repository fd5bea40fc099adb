//! Provider trait definitions.
//!
//! [`MarketDataProvider`] carries identity and health. The domain operations
//! are split by what they return: [`ExchangeRateProvider`] for currency
//! pairs and [`SecurityProvider`] for listed securities.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::MarketDataError;
use crate::models::{ExchangeRate, SecurityInfo, SecurityPrice, SecuritySearchResult, UsageSnapshot};

/// Identity, health and usage shared by every provider.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use ledgerfeed_market_data::models::UsageSnapshot;
/// use ledgerfeed_market_data::provider::MarketDataProvider;
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl MarketDataProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     async fn healthy(&self) -> bool {
///         true
///     }
///
///     fn usage(&self) -> UsageSnapshot {
///         UsageSnapshot::new(0, 100, "Free")
///     }
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Constant identifier like "YAHOO", used in logs.
    fn id(&self) -> &'static str;

    /// Whether the provider can currently serve requests.
    async fn healthy(&self) -> bool;

    /// Requests issued so far against the plan allowance.
    fn usage(&self) -> UsageSnapshot;
}

/// Daily exchange rates between two currencies.
#[async_trait]
pub trait ExchangeRateProvider: MarketDataProvider {
    /// Rate for `date`, taken from the first bar the provider reports for it.
    async fn fetch_exchange_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<ExchangeRate, MarketDataError>;

    /// Daily rates from `start` to `end`, ordered by date.
    ///
    /// Unusable bars are skipped, so the result may be shorter than the
    /// number of trading days in the range.
    async fn fetch_exchange_rates(
        &self,
        from: &str,
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExchangeRate>, MarketDataError>;
}

/// Search, metadata and prices for listed securities.
#[async_trait]
pub trait SecurityProvider: MarketDataProvider {
    /// Securities matching `symbol`.
    ///
    /// When `country_code` is given only listings in that country are
    /// returned. `exchange_mic` is accepted for interface compatibility.
    async fn search_securities(
        &self,
        symbol: &str,
        country_code: Option<&str>,
        exchange_mic: Option<&str>,
    ) -> Result<Vec<SecuritySearchResult>, MarketDataError>;

    async fn fetch_security_info(
        &self,
        symbol: &str,
        exchange_mic: Option<&str>,
    ) -> Result<SecurityInfo, MarketDataError>;

    /// Daily prices from `start` to `end`, ordered by date.
    async fn fetch_security_prices(
        &self,
        symbol: &str,
        exchange_mic: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SecurityPrice>, MarketDataError>;

    /// Price on `date`.
    ///
    /// Default implementation fetches the one-day range and picks the bar
    /// dated `date`. Returns `NotFound` when there is none.
    async fn fetch_security_price(
        &self,
        symbol: &str,
        exchange_mic: Option<&str>,
        date: NaiveDate,
    ) -> Result<SecurityPrice, MarketDataError> {
        self.fetch_security_prices(symbol, exchange_mic, date, date)
            .await?
            .into_iter()
            .find(|price| price.date == date)
            .ok_or_else(|| MarketDataError::NotFound(format!("No price for {} on {}", symbol, date)))
    }
}
