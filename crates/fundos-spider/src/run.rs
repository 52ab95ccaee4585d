use crate::config::{Config, DEFAULT_BASE_URL};
use crate::record::FundRecord;
use crate::scrape::{Extractor, ScrapeError};
use crate::store::{DocumentSink, FundDocument};
use crate::tracker::CounterLog;
use crate::tui::RunProgress;
use futures::FutureExt;
use rand::Rng;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Politeness delay between two tickers: `base` plus a uniform draw from `0..=jitter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub base: Duration,
    pub jitter: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(3),
            jitter: Duration::from_secs(4),
        }
    }
}

impl Pacing {
    /// No delay at all.
    pub const NONE: Pacing = Pacing {
        base: Duration::ZERO,
        jitter: Duration::ZERO,
    };

    pub fn next_delay(&self) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.base;
        }
        self.base
            .saturating_add(Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms)))
    }
}

/// Whether records without a meaningful update are still written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistPolicy {
    #[default]
    Always,
    MeaningfulOnly,
}

impl std::str::FromStr for PersistPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "meaningful" | "meaningful-only" => Ok(Self::MeaningfulOnly),
            other => Err(format!("unknown persist policy {other:?}, expected always|meaningful")),
        }
    }
}

impl std::fmt::Display for PersistPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => f.write_str("always"),
            Self::MeaningfulOnly => f.write_str("meaningful"),
        }
    }
}

/// How one ticker was classified. Exactly one per ticker per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NoUpdate,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub success: u32,
    pub errors: u32,
    pub no_updates: u32,
}

impl RunCounters {
    pub fn total(&self) -> u32 {
        self.success + self.errors + self.no_updates
    }

    pub fn tally(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.success += 1,
            Outcome::NoUpdate => self.no_updates += 1,
            Outcome::Error => self.errors += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub base_url: String,
    pub pacing: Pacing,
    pub persist: PersistPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pacing: Pacing::default(),
            persist: PersistPolicy::default(),
        }
    }
}

impl From<&Config> for RunOptions {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            pacing: config.pacing,
            persist: config.persist,
        }
    }
}

// run
// ----------------------------------------------------------------------------

/// Scrape every ticker in order, persist what was found, and flush the run's counters.
///
/// Nothing that happens to a single ticker stops the run: fetch failures, unparseable pages,
/// store errors and panics are all logged and counted as errors.
pub async fn run(
    tickers: &[String],
    extractor: &dyn Extractor,
    sink: &dyn DocumentSink,
    tracker: &CounterLog,
    options: &RunOptions,
    progress: &RunProgress,
) -> RunCounters {
    let time = std::time::Instant::now();
    let mut counters = RunCounters::default();
    let len = tickers.len();

    for (i, ticker) in tickers.iter().enumerate() {
        info!("processing {ticker} ({}/{len})", i + 1);
        progress.ticker(ticker);

        let outcome = AssertUnwindSafe(process_ticker(ticker, extractor, sink, options))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                error!(
                    ticker = ticker.as_str(),
                    "unexpected error processing {ticker}: {}",
                    panic_message(panic.as_ref())
                );
                Outcome::Error
            });
        counters.tally(outcome);
        progress.outcome(outcome);

        // wait after every ticker, whatever happened to it
        let delay = options.pacing.next_delay();
        trace!("sleeping {delay:?} after {ticker}");
        tokio::time::sleep(delay).await;
    }
    progress.finish();

    info!(
        "update completed. meaningful data: {}, errors: {}, no meaningful data retrieved: {}. {}",
        counters.success,
        counters.errors,
        counters.no_updates,
        crate::time_elapsed(time)
    );
    tracker.record(&counters).await;

    counters
}

async fn process_ticker(
    ticker: &str,
    extractor: &dyn Extractor,
    sink: &dyn DocumentSink,
    options: &RunOptions,
) -> Outcome {
    let mut record = match FundRecord::new(ticker, &options.base_url) {
        Ok(record) => record,
        Err(err) => {
            error!(ticker, "unexpected error processing {ticker}: {err}");
            return Outcome::Error;
        }
    };

    if let Err(err) = extractor.populate(&mut record).await {
        match err {
            ScrapeError::Status { .. } | ScrapeError::Transport { .. } => {
                warn!(
                    ticker,
                    timeout = err.is_timeout(),
                    "could not scrape {ticker}: {err}. skipping to next ticker"
                );
            }
            ScrapeError::Parse(_) => {
                error!(ticker, "unexpected error scraping {ticker}: {err}");
            }
        }
        return Outcome::Error;
    }

    let document = FundDocument::from(&record);
    let meaningful = record.is_meaningful();
    if !meaningful {
        warn!(ticker, "no meaningful data retrieved for {ticker}");
    }

    if meaningful || options.persist == PersistPolicy::Always {
        if let Err(err) = sink.merge_upsert(record.ticker(), &document).await {
            error!(ticker, "failed to persist {ticker}: {err}");
            return Outcome::Error;
        }
    } else {
        debug!("[{ticker}] not persisted, persist policy: {}", options.persist);
    }

    if meaningful {
        Outcome::Success
    } else {
        Outcome::NoUpdate
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
