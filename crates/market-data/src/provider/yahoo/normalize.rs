//! Mapping of raw Yahoo payloads into canonical records.

use chrono::NaiveDate;
use tracing::debug;

use crate::classifier::{
    align_series, non_negative_decimal, positive_decimal, timestamp_to_date, FailureClassifier,
    LengthMismatch,
};
use crate::config::YahooConfig;
use crate::diagnostics::Subject;
use crate::errors::MarketDataError;
use crate::models::{ExchangeRate, SecurityInfo, SecurityPrice, SecuritySearchResult};

use super::fx_pair_symbol;
use super::models::{YahooChartResult, YahooQuote, YahooSearchQuote};

/// Rate from the first bar dated on or after `date` in exchange-local time.
///
/// Anything short of a dated positive close fails with
/// [`MarketDataError::InvalidExchangeRate`]. No diagnostic is emitted.
pub fn single_exchange_rate(
    from: &str,
    to: &str,
    date: NaiveDate,
    blocks: &[YahooChartResult],
) -> Result<ExchangeRate, MarketDataError> {
    let invalid = || MarketDataError::InvalidExchangeRate {
        pair: fx_pair_symbol(from, to),
        date,
    };

    let block = blocks.first().ok_or_else(invalid)?;
    let offset = block.utc_offset();
    let (index, bar_date) = block
        .timestamps()
        .ok_or_else(invalid)?
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| ts.and_then(|ts| timestamp_to_date(ts, offset)).map(|d| (i, d)))
        .find(|(_, bar_date)| *bar_date >= date)
        .ok_or_else(invalid)?;
    let close = block
        .closes()
        .and_then(|c| c.get(index).copied().flatten())
        .ok_or_else(invalid)?;

    let rate = positive_decimal(close).ok_or_else(invalid)?;

    Ok(ExchangeRate::new(bar_date, from, to, rate))
}

/// Daily rates of a range, one per usable bar.
///
/// Events for a failed range carry `start` as their date.
pub fn exchange_rate_series(
    from: &str,
    to: &str,
    start: NaiveDate,
    blocks: &[YahooChartResult],
    classifier: &FailureClassifier<'_>,
) -> Result<Vec<ExchangeRate>, MarketDataError> {
    let subject = Subject::pair(from, to);
    let shape_error = |message: String| MarketDataError::DataShape {
        subject: subject.to_string(),
        message,
    };

    let Some(block) = blocks.first() else {
        return Err(classifier.hard(&subject, Some(start), shape_error("chart result is empty".into())));
    };
    let (Some(timestamps), Some(closes)) = (block.timestamps(), block.closes()) else {
        return Err(classifier.hard(
            &subject,
            Some(start),
            shape_error("timestamp or close array is missing".into()),
        ));
    };

    let series = align_series(timestamps, closes, block.utc_offset(), positive_decimal)
        .map_err(|mismatch| classifier.hard(&subject, Some(start), shape_error(mismatch_message(mismatch))))?;

    let rates: Vec<ExchangeRate> = classifier
        .admit(&subject, series)
        .into_iter()
        .map(|point| ExchangeRate::new(point.date, from, to, point.value))
        .collect();

    debug!("Normalized {} rates for {}", rates.len(), subject);
    Ok(rates)
}

/// Daily prices of a range, one per usable bar.
///
/// Currency, exchange and symbol come from the block metadata and apply to
/// every record. Bars use closes, or opens when the close array is absent.
pub fn security_price_series(
    symbol: &str,
    start: NaiveDate,
    blocks: &[YahooChartResult],
    classifier: &FailureClassifier<'_>,
) -> Result<Vec<SecurityPrice>, MarketDataError> {
    let subject = Subject::symbol(symbol);
    let invalid = |message: &str| MarketDataError::InvalidSecurityPrice {
        symbol: symbol.to_string(),
        message: message.to_string(),
    };

    let Some(block) = blocks.first() else {
        return Err(classifier.hard(&subject, Some(start), invalid("chart result is empty")));
    };

    let meta = &block.meta;
    let Some(currency) = non_blank(meta.currency.as_deref()) else {
        return Err(classifier.hard(&subject, Some(start), invalid("currency is missing")));
    };
    let Some(exchange) = non_blank(meta.exchange_name.as_deref()) else {
        return Err(classifier.hard(&subject, Some(start), invalid("exchange is missing")));
    };
    let record_symbol = non_blank(meta.symbol.as_deref()).unwrap_or(symbol);

    let (Some(timestamps), Some(values)) = (block.timestamps(), block.closes_or_opens()) else {
        return Err(classifier.hard(&subject, Some(start), invalid("price history is missing")));
    };

    let series = align_series(timestamps, values, block.utc_offset(), non_negative_decimal)
        .map_err(|mismatch| {
            classifier.hard(
                &subject,
                Some(start),
                MarketDataError::DataShape {
                    subject: symbol.to_string(),
                    message: mismatch_message(mismatch),
                },
            )
        })?;

    Ok(classifier
        .admit(&subject, series)
        .into_iter()
        .map(|point| SecurityPrice {
            symbol: record_symbol.to_string(),
            date: point.date,
            price: point.value,
            currency: currency.to_string(),
            exchange_operating_mic: exchange.to_string(),
        })
        .collect())
}

/// Search hit with its country, or `None` after reporting why it was dropped.
///
/// `query` names the event subject when the hit carries no symbol.
pub fn search_result(
    query: &str,
    hit: &YahooSearchQuote,
    country: Option<&str>,
    config: &YahooConfig,
    classifier: &FailureClassifier<'_>,
) -> Option<SecuritySearchResult> {
    let Some(symbol) = non_blank(hit.symbol.as_deref()) else {
        classifier.soft(&Subject::symbol(query), None, "search hit without symbol");
        return None;
    };
    let subject = Subject::symbol(symbol);

    let Some(name) = hit.display_name() else {
        classifier.soft(&subject, None, "search hit without name");
        return None;
    };
    let Some(country_code) = non_blank(country) else {
        classifier.soft(&subject, None, "no country for search hit");
        return None;
    };

    Some(SecuritySearchResult {
        symbol: symbol.to_string(),
        name: name.to_string(),
        logo_url: config.logo_url(symbol),
        exchange_operating_mic: hit.exch_disp.clone().unwrap_or_default(),
        country_code: country_code.to_string(),
    })
}

/// Security metadata from a quote lookup.
pub fn security_info(symbol: &str, quote: Option<YahooQuote>) -> Result<SecurityInfo, MarketDataError> {
    let quote = quote.ok_or_else(|| MarketDataError::NotFound(format!("No quote for {}", symbol)))?;

    let missing = |field: &str| MarketDataError::DataShape {
        subject: symbol.to_string(),
        message: format!("quote has no {}", field),
    };

    let name = non_blank(quote.long_name.as_deref())
        .or_else(|| non_blank(quote.short_name.as_deref()))
        .ok_or_else(|| missing("name"))?;
    let kind = non_blank(quote.quote_type.as_deref()).ok_or_else(|| missing("quoteType"))?;
    let exchange = non_blank(quote.exchange.as_deref()).ok_or_else(|| missing("exchange"))?;

    Ok(SecurityInfo {
        symbol: symbol.to_string(),
        name: name.to_string(),
        description: non_blank(quote.long_business_summary.as_deref()).map(str::to_string),
        kind: kind.to_string(),
        exchange_operating_mic: exchange.to_string(),
        logo_url: None,
        links: Default::default(),
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn mismatch_message(mismatch: LengthMismatch) -> String {
    format!(
        "{} timestamps but {} values",
        mismatch.timestamps, mismatch.values
    )
}
