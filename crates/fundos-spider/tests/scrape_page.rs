mod common;

use common::{fixture, fund_page, Captured};
use fundos_spider::record::FundRecord;
use fundos_spider::scrape::{parse_payment_fields, Extractor, ScrapeError, StatusInvest};
use fundos_spider::{config::DEFAULT_USER_AGENT, std_client_build};
use httpmock::{Method::GET, MockServer};
use std::time::Duration;
use tracing::Level;

fn extractor(timeout: Option<Duration>) -> StatusInvest {
    StatusInvest::new(std_client_build(DEFAULT_USER_AGENT, timeout).unwrap())
}

fn record(server: &MockServer, ticker: &str) -> FundRecord {
    FundRecord::new(ticker, &server.url("/fundos-imobiliarios/")).unwrap()
}

#[test]
fn realistic_page_picks_the_latest_distribution() {
    let fields = parse_payment_fields(&fixture("fundo_mxrf11.html")).unwrap();

    assert_eq!(fields.base_date.as_deref(), Some("30/09/2026"));
    assert_eq!(fields.payment_date.as_deref(), Some("14/10/2026"));
    assert_eq!(fields.payment_amount.as_deref(), Some("0.10"));
    assert_eq!(fields.unit_price.as_deref(), Some("9.62"));
}

#[tokio::test]
async fn populates_record_from_page() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/fundos-imobiliarios/mxrf11")
            .header("user-agent", DEFAULT_USER_AGENT);
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(fixture("fundo_mxrf11.html"));
    });

    let mut record = record(&server, "MXRF11");
    extractor(None).populate(&mut record).await.unwrap();
    mock.assert();

    assert_eq!(record.base_date(), "30/09/2026");
    assert_eq!(record.payment_date(), "14/10/2026");
    assert_eq!(record.payment_amount(), "0.10");
    assert_eq!(record.unit_price(), "9.62");
    assert!(record.is_meaningful());
}

#[tokio::test]
async fn short_date_group_warns_and_keeps_other_fields() {
    let (captured, _guard) = Captured::install();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/fundos-imobiliarios/hglg11");
        then.status(200)
            .body(fund_page(&["14/10/2026"], &["1,10"], Some("158,20")));
    });

    let mut record = record(&server, "hglg11");
    extractor(None).populate(&mut record).await.unwrap();

    assert_eq!(record.base_date(), "");
    assert_eq!(record.payment_date(), "");
    assert_eq!(record.payment_amount(), "1.10");
    assert_eq!(record.unit_price(), "158.20");
    assert!(!record.is_meaningful());

    let warnings = captured.warnings_for("hglg11");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].fields.get("group").map(String::as_str), Some("dates"));
}

#[tokio::test]
async fn empty_page_warns_for_every_group() {
    let (captured, _guard) = Captured::install();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/fundos-imobiliarios/xyzw11");
        then.status(200).body("<html><body><h1>Ops!</h1></body></html>");
    });

    let mut record = record(&server, "xyzw11");
    extractor(None).populate(&mut record).await.unwrap();

    assert_eq!(record.unit_price(), "");
    let groups: Vec<String> = captured
        .warnings_for("xyzw11")
        .into_iter()
        .filter_map(|event| event.fields.get("group").cloned())
        .collect();
    assert_eq!(groups, vec!["dates", "amount", "value"]);
    assert!(captured.at(Level::ERROR).is_empty());
}

#[tokio::test]
async fn non_success_status_is_a_fetch_error() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/fundos-imobiliarios/gone11");
        then.status(404).body("not found");
    });

    let mut record = record(&server, "gone11");
    let untouched = record.clone();
    let err = extractor(None).populate(&mut record).await.unwrap_err();
    mock.assert();

    assert!(err.is_fetch());
    assert!(matches!(err, ScrapeError::Status { status: 404, .. }));
    assert_eq!(record, untouched);
}

#[tokio::test]
async fn timeout_is_a_fetch_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/fundos-imobiliarios/slow11");
        then.status(200)
            .delay(Duration::from_secs(2))
            .body(fund_page(&["a", "b"], &["1"], Some("2")));
    });

    let mut record = record(&server, "slow11");
    let err = extractor(Some(Duration::from_millis(200)))
        .populate(&mut record)
        .await
        .unwrap_err();

    assert!(err.is_fetch());
    assert!(err.is_timeout());
    assert_eq!(record.payment_amount(), "");
}

#[tokio::test]
async fn unreachable_host_is_a_fetch_error() {
    // nothing listens on the discard port
    let mut record = FundRecord::new("abcd11", "http://127.0.0.1:9/").unwrap();
    let err = extractor(Some(Duration::from_secs(2)))
        .populate(&mut record)
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Transport { .. }));
}
