use crate::record::FundRecord;
use async_trait::async_trait;

/// [Status Invest](https://statusinvest.com.br/fundos-imobiliarios) FII pages.
pub mod status_invest;

pub use status_invest::{parse_payment_fields, StatusInvest};

/// Fetches the page behind a [`FundRecord`] and fills in whatever payment fields it finds.
///
/// Missing markup is not an error: the affected fields keep their defaults and a warning is
/// logged. Only a failed request or an unparseable page is returned as an error, and in that
/// case the record is left untouched.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn populate(&self, record: &mut FundRecord) -> Result<(), ScrapeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The server answered with a non-2xx status.
    #[error("unexpected response status {status} at {url}")]
    Status { status: u16, url: String },

    /// Connection, TLS, timeout or body-read failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to parse page: {0}")]
    Parse(String),
}

impl ScrapeError {
    /// Fetch errors mean the page never arrived; the ticker is skipped for this run.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Transport { .. })
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}
