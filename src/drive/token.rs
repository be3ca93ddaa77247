//! OAuth access tokens for the Drive service account.
//!
//! Uses the JWT-bearer grant: a short-lived RS256 assertion signed with the
//! service-account key is exchanged at the token endpoint for an access
//! token, which is cached until shortly before it expires.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::credentials::ServiceAccountKey;
use crate::{DriveboxError, Result};

/// Grant type for service-account assertions.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// A cached token this close to expiry is treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Claims of the signed assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Service account email.
    pub iss: String,
    /// Space-separated scopes.
    pub scope: String,
    /// Token endpoint.
    pub aud: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Issues and caches service-account access tokens.
pub struct TokenProvider {
    http: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scopes: Vec<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Create a provider. Fails when the private key is not a valid RSA PEM.
    pub fn new(key: ServiceAccountKey, scopes: Vec<String>, http: Client) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| DriveboxError::Config(format!("invalid service account private key: {e}")))?;

        Ok(Self {
            http,
            key,
            encoding_key,
            scopes,
            cached: Mutex::new(None),
        })
    }

    /// Sign an assertion issued at `now`.
    pub fn build_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: self.scopes.join(" "),
            aud: self.key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| DriveboxError::Drive(format!("failed to sign assertion: {e}")))
    }

    /// Current access token, re-authorising when none is cached or it is
    /// about to expire.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at - chrono::Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.authorize().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    /// Force re-authorisation and return the new token.
    pub async fn refresh(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let token = self.authorize().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    /// Expiry of the cached token, if any.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.cached.lock().await.as_ref().map(|t| t.expires_at)
    }

    async fn authorize(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let assertion = self.build_assertion(now)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| DriveboxError::Drive(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| DriveboxError::Drive(format!("failed to read token response: {e}")))?;

        if !status.is_success() {
            return Err(DriveboxError::Drive(format!(
                "token request rejected: HTTP {status}: {}",
                String::from_utf8_lossy(&body)
            )));
        }

        let parsed: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| DriveboxError::Drive(format!("invalid token response: {e}")))?;
        let expires_in = parsed.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);

        debug!(expires_in, "Obtained Drive access token");
        Ok(CachedToken {
            access_token: parsed.access_token,
            expires_at: now + chrono::Duration::seconds(expires_in),
        })
    }

    /// Refresh the token every `period` in the background.
    ///
    /// Failures are logged; the next tick (or the next request) retries.
    pub fn spawn_refresh_task(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;
                match self.refresh().await {
                    Ok(_) => info!("Refreshed Drive access token"),
                    Err(e) => warn!(error = %e, "Failed to refresh Drive access token"),
                }
            }
        })
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("client_email", &self.key.client_email)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/service_account_key.pem");
    const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/service_account_pub.pem");

    fn provider() -> TokenProvider {
        let key = ServiceAccountKey {
            client_email: "uploader@demo.iam.gserviceaccount.com".to_string(),
            private_key: PRIVATE_KEY.to_string(),
            private_key_id: Some("key-1".to_string()),
            token_uri: "https://oauth2.example.test/token".to_string(),
        };
        let scopes = vec![
            "https://www.googleapis.com/auth/drive.file".to_string(),
            "https://www.googleapis.com/auth/drive.metadata".to_string(),
        ];
        TokenProvider::new(key, scopes, Client::new()).unwrap()
    }

    #[test]
    fn test_assertion_is_rs256_signed() {
        let now = Utc::now();
        let assertion = provider().build_assertion(now).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth2.example.test/token"]);
        let decoded = decode::<AssertionClaims>(
            &assertion,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.header.kid.as_deref(), Some("key-1"));
        assert_eq!(decoded.claims.iss, "uploader@demo.iam.gserviceaccount.com");
        assert_eq!(
            decoded.claims.scope,
            "https://www.googleapis.com/auth/drive.file https://www.googleapis.com/auth/drive.metadata"
        );
        assert_eq!(decoded.claims.iat, now.timestamp());
        assert_eq!(decoded.claims.exp, now.timestamp() + 3600);
    }

    #[test]
    fn test_invalid_private_key_is_rejected() {
        let key = ServiceAccountKey {
            client_email: "a@b".to_string(),
            private_key: "not a pem".to_string(),
            private_key_id: None,
            token_uri: "https://oauth2.example.test/token".to_string(),
        };
        let result = TokenProvider::new(key, vec![], Client::new());
        assert!(matches!(result, Err(DriveboxError::Config(_))));
    }

    #[tokio::test]
    async fn test_no_token_before_authorization() {
        assert!(provider().expires_at().await.is_none());
    }
}
