//! Provider configuration.

use std::str::FromStr;
use std::time::Duration;

use log::warn;

/// Default Yahoo Finance query host
pub const DEFAULT_API_URL: &str = "https://query1.finance.yahoo.com";

/// Host that hands out the session cookie
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

/// Browser user agent sent with every authenticated call
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/90.0.4421.0 Safari/537.36 Edg/90.0.810.1";

/// Logo location template; `{symbol}` is substituted
pub const DEFAULT_LOGO_URL_TEMPLATE: &str = "https://logo.synthfinance.com/{symbol}";

/// Default HTTP request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const ENV_API_URL: &str = "LEDGERFEED_YAHOO_API_URL";
const ENV_COOKIE_URL: &str = "LEDGERFEED_YAHOO_COOKIE_URL";
const ENV_CRUMB_URL: &str = "LEDGERFEED_YAHOO_CRUMB_URL";
const ENV_REQUEST_TIMEOUT_SECS: &str = "LEDGERFEED_REQUEST_TIMEOUT_SECS";
const ENV_MAX_CONCURRENCY: &str = "LEDGERFEED_MAX_CONCURRENCY";
const ENV_REQUEST_LIMIT: &str = "LEDGERFEED_REQUEST_LIMIT";

/// Settings for the Yahoo provider.
#[derive(Clone, Debug)]
pub struct YahooConfig {
    /// Base URL of the quote/search/chart endpoints
    pub api_url: String,

    /// Cookie-issuing endpoint
    pub cookie_url: String,

    /// Crumb-issuing endpoint
    pub crumb_url: String,

    pub user_agent: String,

    /// Upper bound for every request
    pub request_timeout: Duration,

    /// Symbols fetched in parallel within one batch
    pub max_concurrency: usize,

    pub logo_url_template: String,

    /// Plan request allowance reported by usage snapshots
    pub request_limit: u64,

    pub plan_name: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            crumb_url: crumb_url_for(DEFAULT_API_URL),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_concurrency: 10,
            logo_url_template: DEFAULT_LOGO_URL_TEMPLATE.to_string(),
            request_limit: 2000,
            plan_name: "Free".to_string(),
        }
    }
}

impl YahooConfig {
    /// Defaults overridden by `LEDGERFEED_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each setting.
    ///
    /// The crumb URL follows an overridden API URL unless it is set itself.
    /// Unparseable numbers are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(api_url) = lookup(ENV_API_URL) {
            config.api_url = api_url.trim_end_matches('/').to_string();
            config.crumb_url = crumb_url_for(&config.api_url);
        }
        if let Some(cookie_url) = lookup(ENV_COOKIE_URL) {
            config.cookie_url = cookie_url;
        }
        if let Some(crumb_url) = lookup(ENV_CRUMB_URL) {
            config.crumb_url = crumb_url;
        }
        if let Some(secs) = parse_setting::<u64, _>(&lookup, ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(max) = parse_setting::<usize, _>(&lookup, ENV_MAX_CONCURRENCY) {
            config.max_concurrency = max.max(1);
        }
        if let Some(limit) = parse_setting::<u64, _>(&lookup, ENV_REQUEST_LIMIT) {
            config.request_limit = limit;
        }

        config
    }

    /// Logo URL for `symbol`.
    pub fn logo_url(&self, symbol: &str) -> String {
        self.logo_url_template.replace("{symbol}", symbol)
    }
}

fn crumb_url_for(api_url: &str) -> String {
    format!("{}/v1/test/getcrumb", api_url)
}

fn parse_setting<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value '{}' for {}", raw, key);
            None
        }
    }
}
