use crate::config::Config;
use crate::run::RunCounters;
use chrono::{Datelike, Local, NaiveDate};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub const HEADER: [&str; 4] = ["Date", "Success", "Errors", "No Updates"];

/// Append-only CSV of run totals, one row per run.
///
/// Rows are keyed by calendar date only, so several runs on the same day give several rows.
#[derive(Debug, Clone)]
pub struct CounterLog {
    path: PathBuf,
    skip_idle: bool,
    dry_run: bool,
}

impl CounterLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            skip_idle: false,
            dry_run: false,
        }
    }

    /// Don't write a row for a run with no activity at all.
    pub fn skip_idle(mut self, skip_idle: bool) -> Self {
        self.skip_idle = skip_idle;
        self
    }

    /// Log the row instead of appending it, so rehearsal runs stay out of the history.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a finished run under today's local date. Write failures are logged, not returned.
    pub async fn record(&self, counters: &RunCounters) {
        self.record_on(Local::now().date_naive(), counters).await;
    }

    pub async fn record_on(&self, date: NaiveDate, counters: &RunCounters) {
        let date_string = format_date(date);
        if counters.success == 0 {
            info!("no meaningful update on {date_string}");
        }
        if self.skip_idle && counters.total() == 0 {
            info!("nothing processed on {date_string}, counter row skipped");
            return;
        }
        if self.dry_run {
            info!(
                "[dry run] counter row not written: {date_string},{},{},{}",
                counters.success, counters.errors, counters.no_updates
            );
            return;
        }

        let log = self.clone();
        let counters = *counters;
        let written = tokio::task::spawn_blocking(move || log.append(date, &counters)).await;
        match written {
            Ok(Ok(())) => debug!("counters for {date_string} written to {}", self.path.display()),
            Ok(Err(err)) => error!("failed to write counters to {}: {err}", self.path.display()),
            Err(err) => error!("counter log task failed: {err}"),
        }
    }

    /// Append one row, writing the header first when the file is new or empty.
    pub fn append(&self, date: NaiveDate, counters: &RunCounters) -> Result<(), csv::Error> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);
        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.write_record([
            format_date(date),
            counters.success.to_string(),
            counters.errors.to_string(),
            counters.no_updates.to_string(),
        ])?;
        writer.flush()?;

        Ok(())
    }
}

impl From<&Config> for CounterLog {
    fn from(config: &Config) -> Self {
        CounterLog::new(&config.counter_file).skip_idle(config.skip_idle_rows)
    }
}

/// `YYYY/M/D`, without zero padding.
pub fn format_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.year(), date.month(), date.day())
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
