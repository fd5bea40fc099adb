use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Daily exchange rate between two currencies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    /// Calendar date of the rate
    pub date: NaiveDate,

    /// Base currency (e.g., "EUR")
    pub from_currency: String,

    /// Quote currency (e.g., "USD")
    pub to_currency: String,

    /// Units of `to_currency` per unit of `from_currency`, always positive
    pub rate: Decimal,
}

impl ExchangeRate {
    pub fn new(
        date: NaiveDate,
        from_currency: impl Into<String>,
        to_currency: impl Into<String>,
        rate: Decimal,
    ) -> Self {
        Self {
            date,
            from_currency: from_currency.into(),
            to_currency: to_currency.into(),
            rate,
        }
    }

    /// Human readable pair label, e.g. "EUR/USD".
    pub fn pair(&self) -> String {
        format!("{}/{}", self.from_currency, self.to_currency)
    }
}
