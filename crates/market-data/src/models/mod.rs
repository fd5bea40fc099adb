//! Market data models
//!
//! Canonical records handed back to callers. Every record is fully populated;
//! anything the provider could not supply is dropped before it gets here.
//! - `exchange_rate` - Daily FX rate (ExchangeRate)
//! - `security` - Security prices, metadata and search hits
//! - `usage` - Request usage against the provider plan (UsageSnapshot)

mod exchange_rate;
mod security;
mod usage;

pub use exchange_rate::ExchangeRate;
pub use security::{SecurityInfo, SecurityPrice, SecuritySearchResult};
pub use usage::UsageSnapshot;
