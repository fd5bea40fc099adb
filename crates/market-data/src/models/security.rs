use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Daily price of a security.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPrice {
    /// Symbol as reported by the provider (e.g., "AAPL", "SHOP.TO")
    pub symbol: String,

    /// Trading date in the exchange's local calendar
    pub date: NaiveDate,

    /// Closing price, or opening price when the provider has no closes
    pub price: Decimal,

    /// Price currency
    pub currency: String,

    /// Exchange the price was quoted on
    pub exchange_operating_mic: String,
}

/// One hit of a ticker/symbol search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySearchResult {
    pub symbol: String,

    /// Display name (short name preferred)
    pub name: String,

    /// Synthesized logo location
    pub logo_url: String,

    /// Display exchange name from the search endpoint. Not a strict MIC.
    pub exchange_operating_mic: String,

    /// Provider region of the listing (e.g., "US", "CA")
    pub country_code: String,
}

/// Descriptive metadata for a security.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityInfo {
    pub symbol: String,

    pub name: String,

    /// Business summary, when the provider has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Quote type (e.g., "EQUITY", "ETF", "CURRENCY")
    pub kind: String,

    pub exchange_operating_mic: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    /// Related links keyed by label
    pub links: BTreeMap<String, String>,
}
