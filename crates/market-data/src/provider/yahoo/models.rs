//! Yahoo Finance API response models.
//!
//! Raw payloads are decoded once into these types. Every field the API may
//! omit is an `Option`, so a missing field is a typed absence rather than a
//! lookup miss later on.

use serde::Deserialize;

/// Error object embedded in several Yahoo envelopes.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct YahooApiError {
    pub code: Option<String>,
    pub description: Option<String>,
}

impl YahooApiError {
    pub fn describe(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(description)) => format!("{}: {}", code, description),
            (Some(code), None) => code.clone(),
            (None, Some(description)) => description.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

// ============================================================================
// v7 quote
// ============================================================================

/// Response wrapper for the v7 quote API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteEnvelope {
    pub quote_response: Option<YahooQuoteResponse>,
    /// Returned instead of `quoteResponse` when the crumb is rejected
    pub finance: Option<YahooFinanceError>,
    pub error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
pub struct YahooQuoteResponse {
    #[serde(default)]
    pub result: Vec<YahooQuote>,
    pub error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
pub struct YahooFinanceError {
    pub error: Option<YahooApiError>,
}

impl YahooQuoteEnvelope {
    /// The first error object found anywhere in the envelope.
    pub fn api_error(&self) -> Option<&YahooApiError> {
        self.error
            .as_ref()
            .or_else(|| self.quote_response.as_ref().and_then(|r| r.error.as_ref()))
            .or_else(|| self.finance.as_ref().and_then(|f| f.error.as_ref()))
    }

    /// First quote of the result list.
    pub fn into_first_quote(self) -> Option<YahooQuote> {
        self.quote_response
            .and_then(|r| r.result.into_iter().next())
    }
}

/// Single entry of the v7 quote result list
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuote {
    pub symbol: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub long_business_summary: Option<String>,
    pub quote_type: Option<String>,
    pub exchange: Option<String>,
    pub region: Option<String>,
}

// ============================================================================
// v1 search
// ============================================================================

/// Response wrapper for the v1 search API
#[derive(Debug, Deserialize)]
pub struct YahooSearchEnvelope {
    #[serde(default)]
    pub quotes: Vec<YahooSearchQuote>,
    /// Returned instead of `quotes` when the request is rejected
    pub finance: Option<YahooFinanceError>,
}

impl YahooSearchEnvelope {
    pub fn api_error(&self) -> Option<&YahooApiError> {
        self.finance.as_ref().and_then(|f| f.error.as_ref())
    }
}

/// Search hit. Note the lowercase `shortname`/`longname` keys.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct YahooSearchQuote {
    pub symbol: Option<String>,
    pub shortname: Option<String>,
    pub longname: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "exchDisp")]
    pub exch_disp: Option<String>,
}

impl YahooSearchQuote {
    /// Display name: short name, then long name, then plain name.
    pub fn display_name(&self) -> Option<&str> {
        [&self.shortname, &self.longname, &self.name]
            .into_iter()
            .filter_map(|n| n.as_deref())
            .map(str::trim)
            .find(|n| !n.is_empty())
    }
}

// ============================================================================
// v8 chart
// ============================================================================

/// Response wrapper for the v8 chart API
#[derive(Debug, Deserialize)]
pub struct YahooChartEnvelope {
    pub chart: YahooChart,
}

#[derive(Debug, Deserialize)]
pub struct YahooChart {
    pub result: Option<Vec<YahooChartResult>>,
    pub error: Option<YahooApiError>,
}

/// Per-symbol chart block
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct YahooChartResult {
    #[serde(default)]
    pub meta: YahooChartMeta,
    pub timestamp: Option<Vec<Option<i64>>>,
    #[serde(default)]
    pub indicators: YahooIndicators,
}

/// Batch-level metadata of a chart block
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct YahooChartMeta {
    pub currency: Option<String>,
    pub symbol: Option<String>,
    pub exchange_name: Option<String>,
    /// Exchange offset from UTC in seconds
    #[serde(rename = "gmtoffset")]
    pub gmt_offset: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct YahooIndicators {
    #[serde(default)]
    pub quote: Vec<YahooIndicatorQuote>,
}

/// Parallel open and close arrays; either may be absent as a whole
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct YahooIndicatorQuote {
    pub open: Option<Vec<Option<f64>>>,
    pub close: Option<Vec<Option<f64>>>,
}

impl YahooChartResult {
    pub fn timestamps(&self) -> Option<&[Option<i64>]> {
        self.timestamp.as_deref()
    }

    fn first_quote(&self) -> Option<&YahooIndicatorQuote> {
        self.indicators.quote.first()
    }

    /// `indicators.quote[0].close`
    pub fn closes(&self) -> Option<&[Option<f64>]> {
        self.first_quote().and_then(|q| q.close.as_deref())
    }

    /// Closes, or opens when the close array is absent altogether.
    ///
    /// The fallback is all-or-nothing: a close array with gaps is never
    /// patched with opens.
    pub fn closes_or_opens(&self) -> Option<&[Option<f64>]> {
        self.closes()
            .or_else(|| self.first_quote().and_then(|q| q.open.as_deref()))
    }

    /// Offset used to turn bar timestamps into exchange-local dates.
    pub fn utc_offset(&self) -> i32 {
        self.meta.gmt_offset.unwrap_or(0)
    }
}
