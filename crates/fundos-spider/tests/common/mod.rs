#![allow(dead_code)]

use async_trait::async_trait;
use fundos_spider::record::{FundRecord, PaymentFields};
use fundos_spider::scrape::{Extractor, ScrapeError};
use fundos_spider::store::{DocumentSink, FundDocument, StoreError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {}", path.display(), e))
}

/// A fund page with the three markup groups the scraper reads.
pub fn fund_page(dates: &[&str], amounts: &[&str], price: Option<&str>) -> String {
    let mut body = String::from("<!doctype html><html><body><main>");
    if let Some(price) = price {
        body.push_str(&format!(
            r#"<div title="Valor atual do ativo"><strong class="value">{price}</strong></div>"#
        ));
    }
    body.push_str(r#"<div class="card">"#);
    for date in dates {
        body.push_str(&format!(r#"<div><b class="sub-value fs-4 lh-3">{date}</b></div>"#));
    }
    for amount in amounts {
        body.push_str(&format!(
            r#"<strong class="value d-inline-block fs-5 fw-900">{amount}</strong>"#
        ));
    }
    body.push_str("</div></main></body></html>");
    body
}

// log capture
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: HashMap<String, String>,
}

/// Layer recording every event, so tests can assert on what was logged.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<CapturedEvent>>>);

impl Captured {
    /// Install a capturing subscriber for the current thread.
    pub fn install() -> (Self, DefaultGuard) {
        let captured = Self::default();
        let subscriber = tracing_subscriber::registry().with(captured.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (captured, guard)
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn at(&self, level: Level) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.level == level)
            .collect()
    }

    pub fn warnings_for(&self, ticker: &str) -> Vec<CapturedEvent> {
        self.at(Level::WARN)
            .into_iter()
            .filter(|event| event.fields.get("ticker").map(String::as_str) == Some(ticker))
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for Captured {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.0.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: HashMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{value:?}"));
        }
    }
}

// doubles
// ----------------------------------------------------------------------------

pub enum Script {
    Fields(PaymentFields),
    Unavailable(u16),
    Unparseable,
    Panic,
}

/// Extractor answering from a fixed script per ticker; unknown tickers yield an empty page.
#[derive(Default)]
pub struct Scripted {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn with(mut self, ticker: &str, script: Script) -> Self {
        self.scripts.insert(ticker.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Extractor for Scripted {
    async fn populate(&self, record: &mut FundRecord) -> Result<(), ScrapeError> {
        self.calls.lock().unwrap().push(record.ticker().to_string());
        match self.scripts.get(record.ticker()) {
            Some(Script::Fields(fields)) => record.apply(fields.clone()),
            Some(Script::Unavailable(status)) => {
                return Err(ScrapeError::Status {
                    status: *status,
                    url: record.source_url().to_string(),
                })
            }
            Some(Script::Unparseable) => {
                return Err(ScrapeError::Parse("truncated document".to_string()))
            }
            Some(Script::Panic) => panic!("extractor blew up on {}", record.ticker()),
            None => {}
        }
        Ok(())
    }
}

pub fn full_fields(amount: &str) -> PaymentFields {
    PaymentFields {
        base_date: Some("30/09/2026".to_string()),
        payment_date: Some("14/10/2026".to_string()),
        payment_amount: Some(amount.to_string()),
        unit_price: Some("100.00".to_string()),
    }
}

/// Sink refusing every write.
pub struct BrokenSink;

#[async_trait]
impl DocumentSink for BrokenSink {
    async fn merge_upsert(&self, _key: &str, _document: &FundDocument) -> Result<(), StoreError> {
        Err(StoreError::Status {
            status: 503,
            url: "memory://broken".to_string(),
            body: "unavailable".to_string(),
        })
    }
}
