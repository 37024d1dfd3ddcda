use crate::errors::{ServiceError, ServiceResult};
use crate::validation::{NestedValidator, Validate, ValidationBuilder};
use crate::errors::DomainResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the forms backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    /// Bearer token forwarded on every request, when the host has a session.
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl BackendConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Reads `FORMS_*` variables, loading a `.env` file first when present.
    pub fn from_env() -> ServiceResult<Self> {
        // A missing .env file is normal outside development
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> ServiceResult<Self>
    where F: Fn(&str) -> Option<String> {
        let base_url = lookup("FORMS_BACKEND_URL")
            .ok_or_else(|| ServiceError::Configuration("FORMS_BACKEND_URL is not set".to_string()))?;

        let mut config = Self::new(&base_url);
        config.session_token = lookup("FORMS_SESSION_TOKEN").filter(|t| !t.trim().is_empty());
        config.request_timeout_secs = parse_secs(&lookup, "FORMS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        config.connect_timeout_secs = parse_secs(&lookup, "FORMS_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?;

        config.validate().map_err(|e| ServiceError::Configuration(e.to_string()))?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> ServiceResult<u64>
where F: Fn(&str) -> Option<String> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
            ServiceError::Configuration(format!("{} must be a whole number of seconds, got '{}'", key, raw))
        }),
    }
}

impl Validate for BackendConfig {
    fn validate(&self) -> DomainResult<()> {
        let mut nested = NestedValidator::new();
        nested.check(
            ValidationBuilder::new("base_url", Some(self.base_url.clone()))
                .required()
                .http_url()
                .validate(),
        );
        nested.check(
            ValidationBuilder::new("request_timeout_secs", Some(self.request_timeout_secs))
                .min(1)
                .validate(),
        );
        nested.check(
            ValidationBuilder::new("connect_timeout_secs", Some(self.connect_timeout_secs))
                .min(1)
                .validate(),
        );
        nested.validate()
    }
}
