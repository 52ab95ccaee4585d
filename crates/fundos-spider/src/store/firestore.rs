use super::auth::{Credentials, TokenSource};
use super::{DocumentSink, FundDocument, StoreError, UPDATED_AT};
use crate::config::Config;
use crate::http::*;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, error, trace};

/// Firestore collection written through the REST `documents:commit` endpoint.
///
/// Each write is a single `update` with an `updateMask` listing the fund fields, so the
/// document is created when missing and merged when present, plus a `REQUEST_TIME` transform
/// that stamps `updated_at` with the server clock.
pub struct Firestore {
    http_client: HttpClient,
    tokens: TokenSource,
    base_url: String,
    collection: String,
}

impl Firestore {
    pub fn new(
        http_client: HttpClient,
        credentials: Credentials,
        base_url: &str,
        collection: &str,
    ) -> Self {
        Self {
            tokens: TokenSource::new(credentials, http_client.clone()),
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
        }
    }

    /// Load the service account named by the config and connect to its project.
    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        let credentials = Credentials::from_file(&config.key_path).await?;
        debug!(
            "firestore credentials loaded for project {}",
            credentials.project_id()
        );
        let http_client = reqwest::ClientBuilder::new().build()?;
        Ok(Self::new(
            http_client,
            credentials,
            &config.firestore_url,
            &config.collection,
        ))
    }

    fn database(&self) -> String {
        format!(
            "projects/{}/databases/(default)",
            self.tokens.credentials().project_id()
        )
    }

    pub fn document_name(&self, key: &str) -> String {
        format!("{}/documents/{}/{}", self.database(), self.collection, key)
    }

    pub fn commit_url(&self) -> String {
        format!("{}/{}/documents:commit", self.base_url, self.database())
    }

    /// Body of the merge-upsert commit for `document` at `key`.
    pub fn commit_body(&self, key: &str, document: &FundDocument) -> Value {
        let fields: Map<String, Value> = document
            .field_pairs()
            .into_iter()
            .map(|(field, value)| (field.to_string(), json!({ "stringValue": value })))
            .collect();

        json!({
            "writes": [{
                "update": {
                    "name": self.document_name(key),
                    "fields": fields,
                },
                "updateMask": { "fieldPaths": FundDocument::FIELDS },
                "updateTransforms": [{
                    "fieldPath": UPDATED_AT,
                    "setToServerValue": "REQUEST_TIME",
                }],
            }]
        })
    }
}

#[async_trait]
impl DocumentSink for Firestore {
    async fn merge_upsert(&self, key: &str, document: &FundDocument) -> Result<(), StoreError> {
        let time = std::time::Instant::now();
        let token = self.tokens.token().await?;
        let url = self.commit_url();

        trace!("committing {}", self.document_name(key));
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(&self.commit_body(key, document))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("failed to commit {key} to {}, status({status})", self.collection);
            return Err(StoreError::Status {
                status: status.as_u16(),
                url,
                body,
            });
        }

        debug!(
            "[{key}] document merged into {}. {}",
            self.collection,
            crate::time_elapsed(time)
        );
        Ok(())
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
