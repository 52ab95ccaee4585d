use super::{Extractor, ScrapeError};
use crate::config::Config;
use crate::http::*;
use crate::record::{normalize_decimal, FundRecord, PaymentFields};
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, trace, warn};

// The page shows the latest distribution as a card: two `sub-value` dates (base date, then
// payment date) and the amount in a bold `value`. The first `value` on the page is the quote.
//
// `https://statusinvest.com.br/fundos-imobiliarios/{ticker}`

const DATE_GROUP: &str = ".sub-value.fs-4.lh-3";
const AMOUNT_GROUP: &str = ".value.d-inline-block.fs-5.fw-900";
const VALUE_GROUP: &str = ".value";

/////////////////////////////////////////////////////////////////////////////////
// core
/////////////////////////////////////////////////////////////////////////////////

pub struct StatusInvest {
    http_client: HttpClient,
}

impl StatusInvest {
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }

    /// Build the extractor with its own client, carrying the configured User-Agent and timeout.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        let http_client = crate::std_client_build(&config.user_agent, config.request_timeout)?;
        Ok(Self::new(http_client))
    }

    /// GET the raw page; any non-2xx status is a fetch error.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|source| ScrapeError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|source| ScrapeError::Transport {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Extractor for StatusInvest {
    async fn populate(&self, record: &mut FundRecord) -> Result<(), ScrapeError> {
        let time = std::time::Instant::now();

        trace!("fetching {}", record.source_url());
        let html = self.fetch_html(record.source_url()).await?;

        trace!("parsing page for [{}]", record.ticker());
        let fields = parse_payment_fields(&html)?;
        log_missing(record.ticker(), &fields);
        record.apply(fields);

        debug!("[{}] page scraped. {}", record.ticker(), crate::time_elapsed(time));
        Ok(())
    }
}

/////////////////////////////////////////////////////////////////////////////////
// parse
/////////////////////////////////////////////////////////////////////////////////

/// Pull the four payment fields out of a fund page.
///
/// - base date: second to last node of the date group
/// - payment date: last node of the date group
/// - payment amount: last node of the amount group
/// - unit price: first node of the value group
///
/// Each field is independent; a short group only leaves its own fields as `None`.
pub fn parse_payment_fields(html: &str) -> Result<PaymentFields, ScrapeError> {
    let document = Html::parse_document(html);

    let dates = select_texts(&document, DATE_GROUP)?;
    let amounts = select_texts(&document, AMOUNT_GROUP)?;
    let values = select_texts(&document, VALUE_GROUP)?;

    let (base_date, payment_date) = match dates.as_slice() {
        [.., base, payment] => (Some(base.clone()), Some(payment.clone())),
        _ => (None, None),
    };

    Ok(PaymentFields {
        base_date,
        payment_date,
        payment_amount: amounts.last().map(|amount| normalize_decimal(amount)),
        unit_price: values.first().map(|price| normalize_decimal(price)),
    })
}

fn select_texts(document: &Html, css: &str) -> Result<Vec<String>, ScrapeError> {
    let selector =
        Selector::parse(css).map_err(|err| ScrapeError::Parse(format!("selector {css}: {err:?}")))?;

    Ok(document
        .select(&selector)
        .map(|node| node.text().collect::<String>().trim().to_string())
        .collect())
}

/// Warn once per markup group that did not yield its fields.
pub fn log_missing(ticker: &str, fields: &PaymentFields) {
    if fields.base_date.is_none() || fields.payment_date.is_none() {
        warn!(ticker, group = "dates", "[{ticker}] unable to retrieve base and payment dates");
    }
    if fields.payment_amount.is_none() {
        warn!(ticker, group = "amount", "[{ticker}] unable to retrieve dividend amount");
    }
    if fields.unit_price.is_none() {
        warn!(ticker, group = "value", "[{ticker}] unable to retrieve current value");
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
