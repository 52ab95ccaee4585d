use crate::run::{Pacing, PersistPolicy};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://statusinvest.com.br/fundos-imobiliarios/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
/// Upper bound for either pacing component.
pub const MAX_DELAY_SECS: u64 = 3600;

/// Every setting the spider needs, read once at startup and handed to each component.
///
/// Values come from the environment (and a `.env` file, via [`dotenv`]); every key is optional
/// and falls back to the defaults the production deployment runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Page prefix; the lowercase ticker is appended to it.
    pub base_url: String,
    pub user_agent: String,
    /// Per-request timeout. `None` keeps the HTTP client's default.
    pub request_timeout: Option<Duration>,

    /// Service-account key used to authenticate against Firestore.
    pub key_path: PathBuf,
    pub firestore_url: String,
    pub collection: String,

    pub tickers_file: PathBuf,
    pub counter_file: PathBuf,
    pub log_dir: PathBuf,
    pub log_prefix: String,

    pub pacing: Pacing,
    pub persist: PersistPolicy,
    /// Skip the counter row when a run did nothing at all.
    pub skip_idle_rows: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: None,
            key_path: PathBuf::from("firebase-admin-key.json"),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            collection: "fundos".to_string(),
            tickers_file: PathBuf::from("tickers.txt"),
            counter_file: PathBuf::from("counters_frequency.csv"),
            log_dir: PathBuf::from("."),
            log_prefix: "scraping".to_string(),
            pacing: Pacing::default(),
            persist: PersistPolicy::Always,
            skip_idle_rows: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Config {
    /// Read the configuration from the process environment, after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|val| !val.trim().is_empty());

        if let Some(val) = get("FUNDOS_BASE_URL") {
            config.base_url = val;
        }
        if let Some(val) = get("FUNDOS_USER_AGENT") {
            config.user_agent = val;
        }
        if let Some(val) = get("FUNDOS_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Some(Duration::from_secs(parse_num(
                "FUNDOS_REQUEST_TIMEOUT_SECS",
                &val,
            )?));
        }
        if let Some(val) = get("FUNDOS_KEY_PATH") {
            config.key_path = PathBuf::from(val);
        }
        if let Some(val) = get("FUNDOS_FIRESTORE_URL") {
            config.firestore_url = val.trim_end_matches('/').to_string();
        }
        if let Some(val) = get("FUNDOS_COLLECTION") {
            config.collection = val;
        }
        if let Some(val) = get("FUNDOS_TICKERS_FILE") {
            config.tickers_file = PathBuf::from(val);
        }
        if let Some(val) = get("FUNDOS_COUNTER_FILE") {
            config.counter_file = PathBuf::from(val);
        }
        if let Some(val) = get("FUNDOS_LOG_DIR") {
            config.log_dir = PathBuf::from(val);
        }
        if let Some(val) = get("FUNDOS_LOG_PREFIX") {
            config.log_prefix = val;
        }
        if let Some(val) = get("FUNDOS_DELAY_BASE_SECS") {
            config.pacing.base = parse_delay("FUNDOS_DELAY_BASE_SECS", &val)?;
        }
        if let Some(val) = get("FUNDOS_DELAY_JITTER_SECS") {
            config.pacing.jitter = parse_delay("FUNDOS_DELAY_JITTER_SECS", &val)?;
        }
        if let Some(val) = get("FUNDOS_PERSIST") {
            config.persist = val.parse().map_err(|reason| ConfigError::Invalid {
                key: "FUNDOS_PERSIST",
                value: val.clone(),
                reason,
            })?;
        }
        if let Some(val) = get("FUNDOS_SKIP_IDLE_ROWS") {
            config.skip_idle_rows = parse_bool("FUNDOS_SKIP_IDLE_ROWS", &val)?;
        }

        Ok(config)
    }
}

fn parse_num(key: &'static str, val: &str) -> Result<u64, ConfigError> {
    val.trim().parse().map_err(|err| ConfigError::Invalid {
        key,
        value: val.to_string(),
        reason: format!("{err}"),
    })
}

fn parse_delay(key: &'static str, val: &str) -> Result<Duration, ConfigError> {
    let secs = parse_num(key, val)?;
    if secs > MAX_DELAY_SECS {
        return Err(ConfigError::Invalid {
            key,
            value: val.to_string(),
            reason: format!("at most {MAX_DELAY_SECS} seconds"),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_bool(key: &'static str, val: &str) -> Result<bool, ConfigError> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: val.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
