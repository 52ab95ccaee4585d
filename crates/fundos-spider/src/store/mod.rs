use crate::record::FundRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Service-account credentials and OAuth access tokens.
pub mod auth;

/// [Cloud Firestore REST API](https://cloud.google.com/firestore/docs/reference/rest)
pub mod firestore;

pub use auth::{Credentials, ServiceAccountKey, TokenSource};
pub use firestore::Firestore;

/// Field stamped by the store itself at write time.
pub const UPDATED_AT: &str = "updated_at";

/// The document written for one fund. `updated_at` is not carried here: the sink assigns it
/// from the server clock on every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundDocument {
    pub base_date: String,
    pub payment_date: String,
    pub payment_amount: String,
    pub unit_price: String,
    /// Uppercase ticker.
    pub ticker: String,
}

impl FundDocument {
    /// Fields overwritten by a merge; anything else on the stored document is left alone.
    pub const FIELDS: [&'static str; 5] = [
        "base_date",
        "payment_date",
        "payment_amount",
        "unit_price",
        "ticker",
    ];

    pub fn field_pairs(&self) -> [(&'static str, &str); 5] {
        [
            ("base_date", self.base_date.as_str()),
            ("payment_date", self.payment_date.as_str()),
            ("payment_amount", self.payment_amount.as_str()),
            ("unit_price", self.unit_price.as_str()),
            ("ticker", self.ticker.as_str()),
        ]
    }
}

impl From<&FundRecord> for FundDocument {
    fn from(record: &FundRecord) -> Self {
        Self {
            base_date: record.base_date().to_string(),
            payment_date: record.payment_date().to_string(),
            payment_amount: record.payment_amount().to_string(),
            unit_price: record.unit_price().to_string(),
            ticker: record.display_ticker(),
        }
    }
}

/// A document store keyed by lowercase ticker.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Create the document at `key` if absent, otherwise overwrite only the fields of
    /// `document` (plus `updated_at`), keeping every other field already stored.
    async fn merge_upsert(&self, key: &str, document: &FundDocument) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid service account key {path}: {reason}")]
    Credentials { path: String, reason: String },

    #[error("failed to sign token request: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response status {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
}

/// In-process document store with Firestore's merge semantics; backs dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    documents: Mutex<BTreeMap<String, Map<String, Value>>>,
    writes: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored document, as if written by another process.
    pub fn insert_raw(&self, key: &str, fields: Map<String, Value>) {
        lock(&self.documents).insert(key.to_string(), fields);
    }

    pub fn get(&self, key: &str) -> Option<Map<String, Value>> {
        lock(&self.documents).get(key).cloned()
    }

    /// Keys written so far, in write order.
    pub fn writes(&self) -> Vec<String> {
        lock(&self.writes).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.documents).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn merge_upsert(&self, key: &str, document: &FundDocument) -> Result<(), StoreError> {
        let mut documents = lock(&self.documents);
        let stored = documents.entry(key.to_string()).or_default();
        for (field, value) in document.field_pairs() {
            stored.insert(field.to_string(), Value::String(value.to_string()));
        }
        stored.insert(
            UPDATED_AT.to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        lock(&self.writes).push(key.to_string());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
