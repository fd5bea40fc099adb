//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` base trait and the domain traits built on it
//! - The Yahoo Finance implementation

mod traits;

pub mod yahoo;

pub use traits::{ExchangeRateProvider, MarketDataProvider, SecurityProvider};
