//! Error types and failure classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`FailureTier`]: Whether a failure aborts the operation or only drops a point
//! - [`ErrorKind`]: Coarse taxonomy used by callers to decide how to report a failure

mod tier;

pub use tier::{ErrorKind, FailureTier};

use thiserror::Error;

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`FailureTier`] via [`tier`](Self::tier)
/// and an [`ErrorKind`] via [`kind`](Self::kind).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    /// The cookie/crumb session could not be established.
    /// No data can be obtained without it.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A request for a single symbol failed at the transport level
    /// (connection, timeout, non-2xx status or malformed JSON body).
    #[error("Transport error for {symbol}: {message}")]
    Transport {
        /// The symbol whose request failed
        symbol: String,
        /// What went wrong
        message: String,
    },

    /// The provider answered with an explicit error object.
    #[error("Provider error for {symbol}: {message}")]
    Provider {
        /// The symbol the provider rejected
        symbol: String,
        /// The error description returned by the provider
        message: String,
    },

    /// A required array or envelope field is entirely absent, or two
    /// parallel arrays have different lengths.
    #[error("Unexpected data shape for {subject}: {message}")]
    DataShape {
        /// Symbol or currency pair the payload belongs to
        subject: String,
        /// Description of the missing structure
        message: String,
    },

    /// A single point inside an otherwise valid series is unusable.
    /// Never returned to callers, only reported to the diagnostic sink.
    #[error("Invalid data point for {subject}: {message}")]
    DataPoint {
        /// Symbol or currency pair the point belongs to
        subject: String,
        /// Description of the defect
        message: String,
    },

    /// The response was well formed but nothing matched the requested key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No usable rate was returned for a single-date exchange rate lookup.
    #[error("No rate for {pair} on {date}")]
    InvalidExchangeRate {
        /// The provider pair symbol (e.g. `EURUSD=X`)
        pair: String,
        /// The requested date
        date: chrono::NaiveDate,
    },

    /// The price history for a security is missing required data.
    #[error("Invalid security price data for {symbol}: {message}")]
    InvalidSecurityPrice {
        /// The requested symbol
        symbol: String,
        /// Description of the missing data
        message: String,
    },
}

impl MarketDataError {
    /// Returns the failure tier for this error.
    ///
    /// - [`FailureTier::Hard`]: the enclosing operation fails
    /// - [`FailureTier::Soft`]: the offending point is skipped and diagnosed
    ///
    /// # Examples
    ///
    /// ```
    /// use ledgerfeed_market_data::errors::{FailureTier, MarketDataError};
    ///
    /// let error = MarketDataError::Auth("crumb endpoint returned 401".to_string());
    /// assert_eq!(error.tier(), FailureTier::Hard);
    ///
    /// let error = MarketDataError::DataPoint {
    ///     subject: "AAPL".to_string(),
    ///     message: "missing price".to_string(),
    /// };
    /// assert_eq!(error.tier(), FailureTier::Soft);
    /// ```
    pub fn tier(&self) -> FailureTier {
        match self {
            Self::DataPoint { .. } => FailureTier::Soft,
            _ => FailureTier::Hard,
        }
    }

    /// Returns the coarse error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Transport { .. } | Self::Provider { .. } => ErrorKind::Transport,
            Self::DataShape { .. }
            | Self::InvalidExchangeRate { .. }
            | Self::InvalidSecurityPrice { .. } => ErrorKind::DataShape,
            Self::DataPoint { .. } => ErrorKind::DataPoint,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Shorthand for a transport failure tied to one symbol.
    pub(crate) fn transport(symbol: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            symbol: symbol.to_string(),
            message: message.into(),
        }
    }
}
