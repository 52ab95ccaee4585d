use super::StoreError;
use crate::http::*;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, trace};

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// refresh a little before Google expires the token
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The JSON key file downloaded for a Google service account.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// A parsed service account, with its signing key already validated.
pub struct Credentials {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("project_id", &self.key.project_id)
            .field("client_email", &self.key.client_email)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Read and validate the key file at `path`. Every failure here is fatal to a run.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let key: ServiceAccountKey =
            crate::fs::read_json(path)
                .await
                .map_err(|err| StoreError::Credentials {
                    path: path.display().to_string(),
                    reason: format!("{err}"),
                })?;

        Self::from_key(key).map_err(|err| {
            error!("service account key at {} is unusable", path.display());
            match err {
                StoreError::Signing(err) => StoreError::Credentials {
                    path: path.display().to_string(),
                    reason: format!("{err}"),
                },
                other => other,
            }
        })
    }

    pub fn from_key(key: ServiceAccountKey) -> Result<Self, StoreError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(Self { key, signing_key })
    }

    pub fn project_id(&self) -> &str {
        &self.key.project_id
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Signed JWT asserting this account, exchanged for an access token.
    fn assertion(&self, issued_at: i64) -> Result<String, StoreError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let claims = Claims {
            iss: &self.key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.key.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        Ok(jsonwebtoken::encode(&header, &claims, &self.signing_key)?)
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Hands out OAuth access tokens for the service account, fetching a new one only when the
/// cached token is about to expire.
pub struct TokenSource {
    credentials: Credentials,
    http_client: HttpClient,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenSource {
    pub fn new(credentials: Credentials, http_client: HttpClient) -> Self {
        Self {
            credentials,
            http_client,
            cached: Mutex::new(None),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub async fn token(&self) -> Result<String, StoreError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                trace!("reusing cached access token");
                return Ok(token.value.clone());
            }
        }

        let fresh = self.request_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn request_token(&self) -> Result<AccessToken, StoreError> {
        let url = &self.credentials.key.token_uri;
        let assertion = self.credentials.assertion(chrono::Utc::now().timestamp())?;

        debug!("requesting access token for {}", self.credentials.client_email());
        let response = self
            .http_client
            .post(url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("access token request failed, status({status})");
            return Err(StoreError::Status {
                status: status.as_u16(),
                url: url.clone(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
