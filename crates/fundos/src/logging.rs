use chrono::Local;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// `{log_dir}/{log_prefix}_{YYYY-MM-DD}.log`
pub(crate) fn log_file_path(log_dir: &Path, log_prefix: &str) -> PathBuf {
    log_dir.join(format!(
        "{log_prefix}_{}.log",
        Local::now().format("%Y-%m-%d")
    ))
}

/// Install the global subscriber: the date-stamped log file always, stdout unless progress
/// bars own the terminal.
pub(crate) fn init(
    level: Level,
    log_dir: &Path,
    log_prefix: &str,
    stdout: bool,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_file_path(log_dir, log_prefix);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let stdout_layer = stdout.then(|| fmt::layer().with_target(false));
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_date_stamped() {
        let path = log_file_path(Path::new("logs"), "scraping");
        let name = path.file_name().unwrap().to_str().unwrap();
        let today = Local::now().format("%Y-%m-%d").to_string();

        assert_eq!(path.parent(), Some(Path::new("logs")));
        assert_eq!(name, format!("scraping_{today}.log"));
    }
}
