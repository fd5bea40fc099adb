//! End-to-end tests for the Yahoo provider against scripted HTTP responses.

use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal_macros::dec;

use ledgerfeed_market_data::transport::HttpResponse;
use ledgerfeed_market_data::{
    ErrorKind, ExchangeRate, ExchangeRateProvider, MarketDataError, MemorySink, ReplayTransport,
    SecurityProvider, Severity, Subject, YahooConfig, YahooProvider,
};

// =============================================================================
// Helpers
// =============================================================================

const JAN_2: i64 = 1_704_182_400;
const DAY: i64 = 86_400;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Transport that already answers the session handshake.
fn authenticated() -> ReplayTransport {
    ReplayTransport::new()
        .route(
            "fc.yahoo.com",
            HttpResponse::with_status(404, "").with_cookie("A3=d=AQABBK8; Path=/; Domain=.yahoo.com"),
        )
        .route("getcrumb", HttpResponse::ok("crumb123"))
}

fn provider(transport: ReplayTransport) -> (Arc<ReplayTransport>, Arc<MemorySink>, YahooProvider) {
    let transport = Arc::new(transport);
    let sink = Arc::new(MemorySink::new());
    let provider = YahooProvider::with_transport(YahooConfig::default(), transport.clone())
        .with_diagnostics(sink.clone());
    (transport, sink, provider)
}

fn chart_body(meta: &str, timestamps: &[Option<i64>], closes: &[Option<f64>]) -> String {
    let json = |items: Vec<String>| items.join(",");
    let timestamps = json(
        timestamps
            .iter()
            .map(|t| t.map_or("null".to_string(), |t| t.to_string()))
            .collect(),
    );
    let closes = json(
        closes
            .iter()
            .map(|c| c.map_or("null".to_string(), |c| c.to_string()))
            .collect(),
    );
    format!(
        r#"{{"chart":{{"result":[{{"meta":{},"timestamp":[{}],"indicators":{{"quote":[{{"close":[{}]}}]}}}}],"error":null}}}}"#,
        meta, timestamps, closes
    )
}

fn quote_body(symbol: &str, region: &str) -> String {
    format!(
        r#"{{"quoteResponse":{{"result":[{{"symbol":"{}","longName":"{} Holdings","quoteType":"EQUITY","exchange":"NMS","region":"{}"}}],"error":null}}}}"#,
        symbol, symbol, region
    )
}

// =============================================================================
// Exchange rates
// =============================================================================

#[tokio::test]
async fn test_single_exchange_rate_uses_first_bar() {
    let (transport, sink, provider) = provider(authenticated().route(
        "chart/EURUSD%3DX?",
        HttpResponse::ok(chart_body("{}", &[Some(JAN_2)], &[Some(1.10)])),
    ));

    let rate = provider
        .fetch_exchange_rate("EUR", "USD", date(2024, 1, 2))
        .await
        .unwrap();

    assert_eq!(rate, ExchangeRate::new(date(2024, 1, 2), "EUR", "USD", dec!(1.10)));
    assert!(sink.is_empty());

    let chart = transport
        .requests()
        .into_iter()
        .find(|r| r.url.contains("/v8/finance/chart/"))
        .unwrap();
    assert!(chart.url.contains("period1=1704067200&period2=1704326400"));
    assert!(chart.url.contains("crumb=crumb123"));
    assert_eq!(chart.header("cookie"), Some("A3=d=AQABBK8"));
}

#[tokio::test]
async fn test_single_exchange_rate_uses_exchange_local_date() {
    // bars stamped 23:00 UTC the evening before, one hour east of UTC
    let (_, _, provider) = provider(authenticated().route(
        "chart/EURUSD%3DX?",
        HttpResponse::ok(chart_body(
            r#"{"gmtoffset":3600}"#,
            &[Some(1_719_788_400), Some(1_719_874_800), Some(1_719_961_200)],
            &[Some(1.071), Some(1.074), Some(1.079)],
        )),
    ));

    let rate = provider
        .fetch_exchange_rate("EUR", "USD", date(2024, 7, 2))
        .await
        .unwrap();

    assert_eq!(rate, ExchangeRate::new(date(2024, 7, 2), "EUR", "USD", dec!(1.074)));
}

#[tokio::test]
async fn test_single_exchange_rate_without_close_fails_quietly() {
    let (_, sink, provider) = provider(authenticated().route(
        "chart/EURUSD%3DX?",
        HttpResponse::ok(r#"{"chart":{"result":[{"timestamp":[1704182400],"indicators":{"quote":[{}]}}]}}"#),
    ));

    let error = provider
        .fetch_exchange_rate("EUR", "USD", date(2024, 1, 2))
        .await
        .unwrap_err();

    assert_eq!(
        error,
        MarketDataError::InvalidExchangeRate {
            pair: "EURUSD=X".to_string(),
            date: date(2024, 1, 2),
        }
    );
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_exchange_rate_range_skips_null_point() {
    let (_, sink, provider) = provider(authenticated().route(
        "chart/EURUSD%3DX?",
        HttpResponse::ok(chart_body(
            "{}",
            &[Some(JAN_2), Some(JAN_2 + DAY), Some(JAN_2 + 2 * DAY)],
            &[Some(1.10), None, Some(1.12)],
        )),
    ));

    let rates = provider
        .fetch_exchange_rates("EUR", "USD", date(2024, 1, 2), date(2024, 1, 5))
        .await
        .unwrap();

    let dates: Vec<NaiveDate> = rates.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![date(2024, 1, 2), date(2024, 1, 4)]);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Warning);
    assert_eq!(events[0].context.subject, Subject::pair("EUR", "USD"));
    assert_eq!(events[0].context.date, Some(date(2024, 1, 3)));
}

#[tokio::test]
async fn test_exchange_rate_range_missing_array_is_hard() {
    let (_, sink, provider) = provider(authenticated().route(
        "chart/EURUSD%3DX?",
        HttpResponse::ok(r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}]}}"#),
    ));

    let error = provider
        .fetch_exchange_rates("EUR", "USD", date(2024, 1, 2), date(2024, 1, 5))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::DataShape);
    assert_eq!(sink.events()[0].severity, Severity::Error);
}

#[tokio::test]
async fn test_transport_failure_surfaces_outside_batch() {
    let (_, _, provider) =
        provider(authenticated().fail("chart/EURUSD%3DX?", "request timeout"));

    let error = provider
        .fetch_exchange_rates("EUR", "USD", date(2024, 1, 2), date(2024, 1, 5))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_auth_failure_stops_before_any_query() {
    let (transport, _, provider) = provider(
        ReplayTransport::new()
            .route("fc.yahoo.com", HttpResponse::with_status(404, ""))
            .route("chart/", HttpResponse::ok(chart_body("{}", &[Some(JAN_2)], &[Some(1.1)]))),
    );

    let error = provider
        .fetch_exchange_rate("EUR", "USD", date(2024, 1, 2))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Auth);
    assert_eq!(transport.count_matching("chart/"), 0);
}

// =============================================================================
// Securities
// =============================================================================

#[tokio::test]
async fn test_search_securities_resolves_countries_in_order() {
    let (transport, sink, provider) = provider(
        authenticated()
            .route(
                "search?q=shop&",
                HttpResponse::ok(
                    r#"{"quotes":[
                        {"symbol":"SHOP","shortname":"Shopify Inc.","exchDisp":"NYSE"},
                        {"symbol":"SHOP.TO","longname":"Shopify Inc.","exchDisp":"Toronto"},
                        {"symbol":"SHOPX","exchDisp":"NYSE"}
                    ]}"#,
                ),
            )
            .route("symbols=SHOP&", HttpResponse::ok(quote_body("SHOP", "US")))
            .route("symbols=SHOP.TO&", HttpResponse::ok(quote_body("SHOP.TO", "CA")))
            .route("symbols=SHOPX&", HttpResponse::ok(quote_body("SHOPX", "US"))),
    );

    let results = provider.search_securities("shop", None, None).await.unwrap();

    let summary: Vec<(&str, &str, &str)> = results
        .iter()
        .map(|r| (r.symbol.as_str(), r.country_code.as_str(), r.exchange_operating_mic.as_str()))
        .collect();
    assert_eq!(summary, vec![("SHOP", "US", "NYSE"), ("SHOP.TO", "CA", "Toronto")]);
    assert_eq!(results[1].logo_url, "https://logo.synthfinance.com/SHOP.TO");

    // the nameless hit is dropped with a warning
    assert_eq!(sink.len(), 1);
    assert_eq!(transport.count_matching("/v7/finance/quote"), 3);
}

#[tokio::test]
async fn test_search_securities_rejected_request_is_an_error() {
    let (transport, _, provider) = provider(authenticated().route(
        "search?q=apple&",
        HttpResponse::ok(
            r#"{"finance":{"result":null,"error":{"code":"Unauthorized","description":"Invalid Crumb"}}}"#,
        ),
    ));

    let error = provider.search_securities("apple", None, None).await.unwrap_err();

    assert!(matches!(error, MarketDataError::Provider { .. }));
    assert_eq!(transport.count_matching("/v7/finance/quote"), 0);
}

#[tokio::test]
async fn test_search_securities_filters_by_country() {
    let (_, _, provider) = provider(
        authenticated()
            .route(
                "search?q=shop&",
                HttpResponse::ok(
                    r#"{"quotes":[{"symbol":"SHOP","shortname":"Shopify Inc."},{"symbol":"SHOP.TO","shortname":"Shopify Inc."}]}"#,
                ),
            )
            .route("symbols=SHOP&", HttpResponse::ok(quote_body("SHOP", "US")))
            .route("symbols=SHOP.TO&", HttpResponse::ok(quote_body("SHOP.TO", "CA"))),
    );

    let results = provider
        .search_securities("shop", Some("ca"), Some("XTSE"))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].symbol, "SHOP.TO");
}

#[tokio::test]
async fn test_search_securities_country_lookup_failure_drops_hit() {
    let (_, sink, provider) = provider(
        authenticated()
            .route(
                "search?q=apple&",
                HttpResponse::ok(
                    r#"{"quotes":[{"symbol":"AAPL","shortname":"Apple Inc."},{"symbol":"APC.F","shortname":"Apple Inc."}]}"#,
                ),
            )
            .fail("symbols=AAPL&", "connection reset")
            .route("symbols=APC.F&", HttpResponse::ok(quote_body("APC.F", "DE"))),
    );

    let results = provider.search_securities("apple", None, None).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].symbol, "APC.F");
    assert_eq!(sink.events()[0].context.subject, Subject::symbol("AAPL"));
}

#[tokio::test]
async fn test_fetch_security_info() {
    let (_, _, provider) = provider(authenticated().route(
        "symbols=MSFT&",
        HttpResponse::ok(
            r#"{"quoteResponse":{"result":[{"symbol":"MSFT","shortName":"Microsoft","longName":"Microsoft Corporation","longBusinessSummary":"Develops software.","quoteType":"EQUITY","exchange":"NMS"}]}}"#,
        ),
    ));

    let info = provider.fetch_security_info("MSFT", None).await.unwrap();

    assert_eq!(info.symbol, "MSFT");
    assert_eq!(info.name, "Microsoft Corporation");
    assert_eq!(info.kind, "EQUITY");
    assert_eq!(info.exchange_operating_mic, "NMS");
    assert_eq!(info.logo_url, None);
    assert!(info.links.is_empty());
}

#[tokio::test]
async fn test_fetch_security_info_unknown_symbol() {
    let (_, _, provider) = provider(authenticated().route(
        "symbols=ZZZZ&",
        HttpResponse::ok(r#"{"quoteResponse":{"result":[],"error":null}}"#),
    ));

    let error = provider.fetch_security_info("ZZZZ", None).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_security_price_matches_range_record() {
    let meta = r#"{"currency":"USD","symbol":"AAPL","exchangeName":"NMS"}"#;
    let (transport, _, provider) = provider(authenticated().route(
        "chart/AAPL?",
        HttpResponse::ok(chart_body(meta, &[Some(JAN_2 + 6 * 3600)], &[Some(185.64)])),
    ));

    let single = provider
        .fetch_security_price("AAPL", None, date(2024, 1, 2))
        .await
        .unwrap();
    let range = provider
        .fetch_security_prices("AAPL", None, date(2024, 1, 2), date(2024, 1, 2))
        .await
        .unwrap();

    assert_eq!(range, vec![single.clone()]);
    assert_eq!(single.price, dec!(185.64));
    assert_eq!(single.currency, "USD");
    assert_eq!(single.exchange_operating_mic, "NMS");

    // start == end widens the window to the following midnight
    let chart = transport
        .requests()
        .into_iter()
        .find(|r| r.url.contains("chart/AAPL?"))
        .unwrap();
    assert!(chart.url.contains("period1=1704153600&period2=1704240000"));
}

#[tokio::test]
async fn test_security_price_without_matching_bar_is_not_found() {
    let meta = r#"{"currency":"USD","exchangeName":"NMS"}"#;
    let (_, _, provider) = provider(authenticated().route(
        "chart/AAPL?",
        HttpResponse::ok(chart_body(meta, &[Some(JAN_2 - DAY)], &[Some(184.25)])),
    ));

    let error = provider
        .fetch_security_price("AAPL", None, date(2024, 1, 2))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_security_prices_gap_is_reported_with_context() {
    let meta = r#"{"currency":"CAD","symbol":"SHOP.TO","exchangeName":"TOR","gmtoffset":-18000}"#;
    let bars = [JAN_2 + 6 * 3600, JAN_2 + DAY + 6 * 3600, JAN_2 + 2 * DAY + 6 * 3600];
    let (_, sink, provider) = provider(authenticated().route(
        "chart/SHOP.TO?",
        HttpResponse::ok(chart_body(
            meta,
            &bars.map(Some),
            &[Some(101.25), None, Some(103.5)],
        )),
    ));

    let prices = provider
        .fetch_security_prices("SHOP.TO", None, date(2024, 1, 2), date(2024, 1, 5))
        .await
        .unwrap();

    let dates: Vec<NaiveDate> = prices.iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![date(2024, 1, 2), date(2024, 1, 4)]);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Warning);
    assert_eq!(events[0].context.subject, Subject::symbol("SHOP.TO"));
    assert_eq!(events[0].context.date, Some(date(2024, 1, 3)));
}

#[tokio::test]
async fn test_security_prices_missing_currency_is_hard() {
    let (_, sink, provider) = provider(authenticated().route(
        "chart/AAPL?",
        HttpResponse::ok(chart_body(r#"{"exchangeName":"NMS"}"#, &[Some(JAN_2)], &[Some(1.0)])),
    ));

    let error = provider
        .fetch_security_prices("AAPL", None, date(2024, 1, 1), date(2024, 1, 5))
        .await
        .unwrap_err();

    assert!(matches!(error, MarketDataError::InvalidSecurityPrice { .. }));
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Error);
    assert_eq!(events[0].context.date, Some(date(2024, 1, 1)));
}

#[tokio::test]
async fn test_identical_responses_give_identical_records() {
    let body = chart_body(
        "{}",
        &[Some(JAN_2), Some(JAN_2 + DAY)],
        &[Some(1.0950), Some(1.0987)],
    );
    let (_, _, provider) =
        provider(authenticated().route("chart/EURUSD%3DX?", HttpResponse::ok(body)));

    let first = provider
        .fetch_exchange_rates("EUR", "USD", date(2024, 1, 2), date(2024, 1, 4))
        .await
        .unwrap();
    let second = provider
        .fetch_exchange_rates("EUR", "USD", date(2024, 1, 2), date(2024, 1, 4))
        .await
        .unwrap();

    assert_eq!(first, second);
}

// =============================================================================
// Properties
// =============================================================================

fn arb_close() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        3 => (0.5f64..2.0).prop_map(Some),
        1 => Just(None),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_range_output_is_bounded_by_input(closes in prop::collection::vec(arb_close(), 0..20)) {
        let timestamps: Vec<Option<i64>> =
            (0..closes.len() as i64).map(|i| Some(JAN_2 + i * DAY)).collect();
        let (_, sink, provider) = provider(authenticated().route(
            "chart/EURUSD%3DX?",
            HttpResponse::ok(chart_body("{}", &timestamps, &closes)),
        ));

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let rates = runtime
            .block_on(provider.fetch_exchange_rates("EUR", "USD", date(2024, 1, 2), date(2024, 2, 1)))
            .unwrap();

        let present = closes.iter().filter(|c| c.is_some()).count();
        prop_assert_eq!(rates.len(), present);
        prop_assert_eq!(sink.len(), closes.len() - present);
        prop_assert!(rates.windows(2).all(|w| w[0].date < w[1].date));
    }
}
