use clap::{Parser, Subcommand, ValueEnum};
use fundos_spider::PersistPolicy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,

    /// Draw progress bars on the terminal instead of logging to stdout.
    ///
    /// The log file is written either way.
    #[arg(short, long, global = true)]
    pub progress: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrape every ticker in the list and merge the results into Firestore.
    Run {
        /// Ticker list, one per line. Overrides `FUNDOS_TICKERS_FILE`.
        #[arg(long)]
        tickers: Option<PathBuf>,

        /// Whether records without a meaningful update are written anyway.
        #[arg(long, value_parser = parse_persist)]
        persist: Option<PersistPolicy>,

        /// Keep documents in memory and log them instead of writing to Firestore.
        #[arg(long)]
        dry_run: bool,
    },

    /// Scrape a single ticker and print what was extracted, without storing anything.
    Peek {
        /// The fund ticker, e.g. mxrf11.
        ticker: String,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}

impl From<TraceLevel> for tracing::Level {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::DEBUG => tracing::Level::DEBUG,
            TraceLevel::ERROR => tracing::Level::ERROR,
            TraceLevel::INFO => tracing::Level::INFO,
            TraceLevel::TRACE => tracing::Level::TRACE,
            TraceLevel::WARN => tracing::Level::WARN,
        }
    }
}

fn parse_persist(s: &str) -> Result<PersistPolicy, String> {
    s.parse()
}
