use actix_web::http::Uri;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::models::AmountLimits;
use crate::services::identity_service::FIREBASE_JWKS_URL;
use crate::services::payment_service::STRIPE_API_BASE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The fields of a Firebase service-account key the server relies on.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
}

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database_name: String,
    pub service_account: ServiceAccount,
    pub jwks_url: String,
    pub identity_keys_ttl: Duration,
    pub stripe_secret_key: String,
    pub stripe_api_base: String,
    pub payment_limits: AmountLimits,
    pub http_timeout: Duration,
    pub cors_allowed_origins: Vec<String>,
    pub shutdown_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let payment_limits = AmountLimits {
            min_cents: parse_or(&get, "PAYMENT_MIN_AMOUNT_CENTS", AmountLimits::default().min_cents)?,
            max_cents: parse_or(&get, "PAYMENT_MAX_AMOUNT_CENTS", AmountLimits::default().max_cents)?,
        };
        if payment_limits.min_cents <= 0 || payment_limits.min_cents > payment_limits.max_cents {
            return Err(ConfigError::Invalid {
                name: "PAYMENT_MIN_AMOUNT_CENTS",
                reason: "must be positive and not above PAYMENT_MAX_AMOUNT_CENTS".to_string(),
            });
        }

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 5000)?,
            mongodb_uri: mongodb_uri(&get)?,
            database_name: get("MONGODB_DATABASE").unwrap_or_else(|| "doctor-portal".to_string()),
            service_account: service_account(&get)?,
            jwks_url: get("FIREBASE_JWKS_URL").unwrap_or_else(|| FIREBASE_JWKS_URL.to_string()),
            identity_keys_ttl: Duration::from_secs(parse_or(&get, "IDENTITY_KEYS_TTL_SECS", 3600)?),
            stripe_secret_key: get("STRIPE_SECRET_KEY").ok_or(ConfigError::Missing("STRIPE_SECRET_KEY"))?,
            stripe_api_base: get("STRIPE_API_BASE").unwrap_or_else(|| STRIPE_API_BASE.to_string()),
            payment_limits,
            http_timeout: Duration::from_secs(parse_or(&get, "HTTP_CLIENT_TIMEOUT_SECS", 10)?),
            cors_allowed_origins: match get("CORS_ALLOWED_ORIGINS") {
                Some(raw) => allowed_origins(&raw)?,
                None => Vec::new(),
            },
            shutdown_timeout_secs: parse_or(&get, "SHUTDOWN_TIMEOUT_SECS", 30)?,
        })
    }

    /// Connection string safe to log.
    pub fn redacted_mongodb_uri(&self) -> String {
        match (self.mongodb_uri.find("://"), self.mongodb_uri.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => format!(
                "{}***{}",
                &self.mongodb_uri[..scheme_end + 3],
                &self.mongodb_uri[at..]
            ),
            _ => self.mongodb_uri.clone(),
        }
    }
}

fn parse_or<G, T>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Comma-separated `scheme://host[:port]` origins. Unset means any origin.
fn allowed_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            let invalid = |reason: &str| ConfigError::Invalid {
                name: "CORS_ALLOWED_ORIGINS",
                reason: format!("'{}' {}", origin, reason),
            };

            if origin == "*" {
                return Err(invalid("is a wildcard; leave the variable unset to allow any origin"));
            }

            let uri: Uri = origin
                .parse()
                .map_err(|_| invalid("is not a valid origin"))?;
            match (uri.scheme_str(), uri.authority()) {
                (Some(scheme @ ("http" | "https")), Some(authority))
                    if !authority.host().is_empty()
                        && format!("{}://{}", scheme, authority) == origin =>
                {
                    Ok(origin.to_string())
                }
                _ => Err(invalid("must look like https://host[:port] with no path")),
            }
        })
        .collect()
}

/// `MONGODB_URI` wins; otherwise an Atlas SRV string is composed from its parts.
fn mongodb_uri<G>(get: &G) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(uri) = get("MONGODB_URI") {
        return Ok(uri);
    }

    let user = get("DB_USER").ok_or(ConfigError::Missing("MONGODB_URI or DB_USER"))?;
    let pass = get("DB_PASS").ok_or(ConfigError::Missing("DB_PASS"))?;
    let cluster = get("DB_CLUSTER").ok_or(ConfigError::Missing("DB_CLUSTER"))?;

    Ok(format!(
        "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority",
        urlencoding::encode(&user),
        urlencoding::encode(&pass),
        cluster
    ))
}

fn service_account<G>(get: &G) -> Result<ServiceAccount, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let (source, raw) = if let Some(json) = get("FIREBASE_SERVICE_ACCOUNT") {
        ("FIREBASE_SERVICE_ACCOUNT", json)
    } else if let Some(path) = get("FIREBASE_SERVICE_ACCOUNT_PATH") {
        let json = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        ("FIREBASE_SERVICE_ACCOUNT_PATH", json)
    } else {
        return Err(ConfigError::Missing(
            "FIREBASE_SERVICE_ACCOUNT or FIREBASE_SERVICE_ACCOUNT_PATH",
        ));
    };

    let account: ServiceAccount =
        serde_json::from_str(&raw).map_err(|e| ConfigError::Invalid {
            name: source,
            reason: e.to_string(),
        })?;

    if account.project_id.trim().is_empty() {
        return Err(ConfigError::Invalid {
            name: source,
            reason: "project_id is empty".to_string(),
        });
    }

    Ok(account)
}
