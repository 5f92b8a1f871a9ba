// ==================== IDENTITY PROVIDER ====================
// Verifies Firebase Authentication ID tokens (RS256) against Google's
// published signing keys. Keys are cached in memory and refreshed on TTL
// expiry or when a token names a key id we have not seen.

use async_trait::async_trait;
use jsonwebtoken::{
    decode, decode_header, errors::ErrorKind, jwk::JwkSet, Algorithm, DecodingKey, Validation,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::utils::error::AppError;

pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Unknown key ids never trigger more than one refetch per this window.
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

/// Identity resolved from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: String,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// `Unauthorized` for bad tokens, `UpstreamUnavailable` when keys can't be loaded.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError>;
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    email: Option<String>,
}

/// Audience and issuer checks for one Firebase project.
#[derive(Debug, Clone)]
pub struct TokenRules {
    project_id: String,
}

impl TokenRules {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }

    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    /// Reads the signing key id from the token header.
    pub fn key_id(&self, token: &str) -> Result<String, AppError> {
        let header = decode_header(token)
            .map_err(|e| AppError::Unauthorized(format!("Malformed token: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Unauthorized(format!(
                "Unexpected token algorithm {:?}",
                header.alg
            )));
        }

        header
            .kid
            .ok_or_else(|| AppError::Unauthorized("Token has no key id".to_string()))
    }

    pub fn decode(&self, token: &str, keys: &JwkSet) -> Result<VerifiedIdentity, AppError> {
        let kid = self.key_id(token)?;
        let jwk = keys
            .find(&kid)
            .ok_or_else(|| AppError::Unauthorized("Token signed with unknown key".to_string()))?;
        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| AppError::Unauthorized(format!("Unusable signing key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

        let claims = decode::<FirebaseClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "Token expired".to_string(),
                    ErrorKind::InvalidAudience => "Token issued for another project".to_string(),
                    ErrorKind::InvalidIssuer => "Token issued by an unexpected issuer".to_string(),
                    _ => format!("Invalid token: {}", e),
                };
                AppError::Unauthorized(reason)
            })?;

        if claims.sub.is_empty() {
            return Err(AppError::Unauthorized("Token has an empty subject".to_string()));
        }

        match claims.email {
            Some(email) if !email.is_empty() => Ok(VerifiedIdentity {
                uid: claims.sub,
                email,
            }),
            _ => Err(AppError::Unauthorized("Token carries no email".to_string())),
        }
    }
}

struct CachedKeys {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

pub struct FirebaseVerifier {
    http: reqwest::Client,
    jwks_url: String,
    rules: TokenRules,
    keys_ttl: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(
        http: reqwest::Client,
        project_id: &str,
        jwks_url: impl Into<String>,
        keys_ttl: Duration,
    ) -> Self {
        Self {
            http,
            jwks_url: jwks_url.into(),
            rules: TokenRules::new(project_id),
            keys_ttl,
            cache: RwLock::new(None),
        }
    }

    #[cfg(test)]
    fn with_keys(project_id: &str, keys: JwkSet) -> Self {
        let verifier = Self::new(
            reqwest::Client::new(),
            project_id,
            "http://127.0.0.1:9/unreachable",
            Duration::from_secs(3600),
        );
        verifier.seed_keys(keys, Duration::ZERO);
        verifier
    }

    /// Pretends `keys` were fetched `age` ago.
    #[cfg(test)]
    fn seed_keys(&self, keys: JwkSet, age: Duration) {
        let fetched_at = Instant::now().checked_sub(age).unwrap_or_else(Instant::now);
        self.cache.try_write().unwrap().replace(CachedKeys {
            keys: Arc::new(keys),
            fetched_at,
        });
    }

    async fn signing_keys(&self, kid: &str) -> Result<Arc<JwkSet>, AppError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let age = cached.fetched_at.elapsed();
                let fresh = age < self.keys_ttl;
                if fresh && (cached.keys.find(kid).is_some() || age < MIN_REFETCH_INTERVAL) {
                    return Ok(cached.keys.clone());
                }
            }
        }

        let keys = Arc::new(self.fetch_keys().await?);
        *self.cache.write().await = Some(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AppError> {
        log::info!("🔑 Fetching identity provider signing keys");

        let response = self
            .http
            .get(&self.jwks_url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::upstream("identity provider", e))?;

        if !response.status().is_success() {
            return Err(AppError::upstream(
                "identity provider",
                format!("key endpoint returned {}", response.status()),
            ));
        }

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| AppError::upstream("identity provider", e))?;

        log::info!("✅ Loaded {} signing keys", keys.keys.len());
        Ok(keys)
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError> {
        let kid = self.rules.key_id(token)?;
        let keys = self.signing_keys(&kid).await?;
        self.rules.decode(token, &keys)
    }
}
