use crate::cli::Cli;
use fundos_spider::scrape::{Extractor, StatusInvest};
use fundos_spider::store::{Firestore, MemorySink};
use fundos_spider::tui::RunProgress;
use fundos_spider::{fs, Config, CounterLog, FundRecord, PersistPolicy, RunOptions};
use std::path::PathBuf;
use tracing::{debug, error, info, trace};

/// Scrape the ticker list and merge every record into the store.
pub(crate) async fn run(
    config: &Config,
    cli: &Cli,
    tickers_file: Option<PathBuf>,
    persist: Option<PersistPolicy>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let tickers_path = tickers_file.unwrap_or_else(|| config.tickers_file.clone());
    let tickers = fs::read_tickers(&tickers_path).await.map_err(|err| {
        error!("fatal: {err}");
        err
    })?;
    info!("{} tickers to scrape", tickers.len());

    let extractor = StatusInvest::from_config(config)?;
    let tracker = CounterLog::from(config).dry_run(dry_run);
    let mut options = RunOptions::from(config);
    if let Some(persist) = persist {
        options.persist = persist;
    }
    trace!("run options: {options:?}");

    let progress = if cli.progress {
        RunProgress::bars(tickers.len())?
    } else {
        RunProgress::hidden()
    };

    if dry_run {
        info!("dry run, documents kept in memory");
        let sink = MemorySink::new();
        fundos_spider::run::run(&tickers, &extractor, &sink, &tracker, &options, &progress).await;

        for key in sink.writes() {
            if let Some(document) = sink.get(&key) {
                info!("[dry run] {key}: {}", serde_json::Value::Object(document));
            }
        }
        return Ok(());
    }

    let sink = Firestore::from_config(config).await.map_err(|err| {
        error!("fatal: could not connect to firestore: {err}");
        err
    })?;
    debug!("firestore collection {} ready", config.collection);

    fundos_spider::run::run(&tickers, &extractor, &sink, &tracker, &options, &progress).await;
    Ok(())
}

/// Scrape one ticker and print the record as JSON.
pub(crate) async fn peek(config: &Config, ticker: &str) -> anyhow::Result<()> {
    let extractor = StatusInvest::from_config(config)?;
    let mut record = FundRecord::new(ticker, &config.base_url)?;
    extractor.populate(&mut record).await?;

    if !record.is_meaningful() {
        info!("no meaningful data retrieved for {}", record.ticker());
    }
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
