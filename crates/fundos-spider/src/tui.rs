use crate::run::Outcome;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal progress for a run: one bar for the ticker list, one per outcome.
///
/// [`RunProgress::hidden`] draws nothing, for runs that log to stdout instead.
pub struct RunProgress {
    _multi: Option<MultiProgress>,
    total: ProgressBar,
    success: ProgressBar,
    no_updates: ProgressBar,
    failures: ProgressBar,
}

impl RunProgress {
    pub fn hidden() -> Self {
        Self {
            _multi: None,
            total: ProgressBar::hidden(),
            success: ProgressBar::hidden(),
            no_updates: ProgressBar::hidden(),
            failures: ProgressBar::hidden(),
        }
    }

    pub fn bars(len: usize) -> anyhow::Result<Self> {
        // overall multi progress bar
        let multi = MultiProgress::new();

        // total number of tickers to collect
        let total = multi.add(
            ProgressBar::new(len as u64).with_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.magenta} {prefix}\n \
                        {msg:>10.white} |{bar:57.white/grey}| {pos:<2} / {human_len} \
                        ({percent}%) [Time: {elapsed}, ETA: {eta}]",
                    )?
                    .progress_chars("## "),
            ),
        );
        total.set_message("total");
        total.enable_steady_tick(Duration::from_millis(100));

        // meaningful updates
        let success = multi.insert_after(&total, outcome_bar(len, "green")?);
        success.set_message("successes");

        // scraped, but nothing worth counting
        let no_updates = multi.insert_after(&success, outcome_bar(len, "yellow")?);
        no_updates.set_message("no updates");

        // failed collections
        let failures = multi.insert_after(&no_updates, outcome_bar(len, "red")?);
        failures.set_message("failures");

        Ok(Self {
            _multi: Some(multi),
            total,
            success,
            no_updates,
            failures,
        })
    }

    pub(crate) fn ticker(&self, ticker: &str) {
        self.total.set_prefix(ticker.to_uppercase());
    }

    pub(crate) fn outcome(&self, outcome: Outcome) {
        self.total.inc(1);
        match outcome {
            Outcome::Success => self.success.inc(1),
            Outcome::NoUpdate => self.no_updates.inc(1),
            Outcome::Error => self.failures.inc(1),
        }
    }

    pub(crate) fn finish(&self) {
        for bar in [&self.total, &self.success, &self.no_updates, &self.failures] {
            bar.abandon();
        }
    }
}

fn outcome_bar(len: usize, colour: &str) -> anyhow::Result<ProgressBar> {
    Ok(ProgressBar::new(len as u64).with_style(
        ProgressStyle::default_bar()
            .template(&format!(
                " {{msg:>10.{colour}}} |{{bar:57.{colour}}}| {{pos:<2.{colour}}}"
            ))?
            .progress_chars("## "),
    ))
}
