pub mod config;
pub mod fs;
pub mod record;
pub mod run;
pub mod scrape;
pub mod store;
pub mod tracker;
pub mod tui;

pub use config::{Config, ConfigError};
pub use record::{FundRecord, PaymentFields, RecordError};
pub use run::{Pacing, PersistPolicy, RunCounters, RunOptions};
pub use scrape::{Extractor, ScrapeError};
pub use store::{DocumentSink, FundDocument, StoreError};
pub use tracker::CounterLog;

/// Shortcut for required API elements.
pub mod http {
    pub use reqwest::Client as HttpClient;
}

/// Build the shared HTTP client used for page requests.
///
/// The source site serves a reduced page to unknown agents, so the client always carries a
/// browser User-Agent.
pub fn std_client_build(
    user_agent: &str,
    timeout: Option<std::time::Duration>,
) -> reqwest::Result<http::HttpClient> {
    let mut builder = reqwest::ClientBuilder::new().user_agent(user_agent);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Human readable elapsed time, for trace lines.
pub(crate) fn time_elapsed(time: std::time::Instant) -> String {
    format!("time elapsed: {:?}", time.elapsed())
}
