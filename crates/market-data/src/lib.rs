//! Ledgerfeed Market Data Crate
//!
//! Fetches exchange rates, security prices, security metadata and search
//! results from Yahoo Finance and normalizes them into typed records.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! | Provider facade  |  (ExchangeRateProvider, SecurityProvider)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |   Query client   | <-- | Session manager  |  (cookie + crumb)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+
//! |    Normalizer    |  (raw payload -> canonical records)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |    Classifier    | --> | Diagnostic sink  |
//! +------------------+     +------------------+
//! ```
//!
//! # Failure model
//!
//! A missing request, session or whole array fails the operation. A single
//! missing point inside a series is skipped and reported to the
//! [`DiagnosticSink`]; the operation still succeeds.
//!
//! # Core Types
//!
//! - [`ExchangeRate`] - Daily rate between two currencies
//! - [`SecurityPrice`] - Daily price of a security
//! - [`SecuritySearchResult`] - Search hit with country and logo
//! - [`SecurityInfo`] - Descriptive security metadata
//! - [`UsageSnapshot`] - Requests issued against the plan allowance

pub mod classifier;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod models;
pub mod provider;
pub mod transport;

pub use config::YahooConfig;
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, LogSink, MemorySink, Severity, Subject};
pub use errors::{ErrorKind, FailureTier, MarketDataError};
pub use models::{ExchangeRate, SecurityInfo, SecurityPrice, SecuritySearchResult, UsageSnapshot};

pub use provider::yahoo::client::{BatchResult, QueryClient, SymbolBatch, SymbolOutcome};
pub use provider::yahoo::session::{Session, SessionManager};
pub use provider::yahoo::{fx_pair_symbol, YahooProvider};
pub use provider::{ExchangeRateProvider, MarketDataProvider, SecurityProvider};

pub use transport::{HttpTransport, ReplayTransport, ReqwestTransport};
