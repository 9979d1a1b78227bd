//! Client configuration.
//!
//! The base URL and API key are fixed once the client is built. The
//! `verify_peer` and `verbose` flags may change at any time and apply from the
//! next request on.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const CLOUD_DOMAIN: &str = "cloud.swretail.nl";
pub const SERVICE_PATH: &str = "swcloud/SWWService";

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const TOTAL_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_INSTANCE: &str = "SWRETAIL_INSTANCE";
pub const ENV_API_KEY: &str = "SWRETAIL_API_KEY";
pub const ENV_BASE_URL: &str = "SWRETAIL_BASE_URL";
pub const ENV_VERIFY_PEER: &str = "SWRETAIL_VERIFY_PEER";
pub const ENV_VERBOSE: &str = "SWRETAIL_VERBOSE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct ClientConfig {
    instance: String,
    api_key: String,
    base_url: String,
    pub verify_peer: bool,
    pub verbose: bool,
}

/// Serialized shape: either `instance` or an explicit `base_url`.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    instance: Option<String>,
    api_key: String,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default = "default_verify_peer")]
    verify_peer: bool,
    #[serde(default)]
    verbose: bool,
}

fn default_verify_peer() -> bool {
    true
}

impl TryFrom<RawConfig> for ClientConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let mut config = match (raw.base_url, raw.instance) {
            (Some(base_url), instance) => {
                let mut config = Self::with_base_url(&base_url, &raw.api_key)?;
                if let Some(instance) = instance {
                    config.instance = instance;
                }
                config
            }
            (None, Some(instance)) => Self::new(&instance, &raw.api_key)?,
            (None, None) => return Err(ConfigError::InvalidInstance(String::new())),
        };
        config.verify_peer = raw.verify_peer;
        config.verbose = raw.verbose;
        Ok(config)
    }
}

impl ClientConfig {
    /// Configuration for the cloud instance `instance`.
    pub fn new(instance: &str, api_key: &str) -> Result<Self, ConfigError> {
        validate_instance(instance)?;
        validate_api_key(api_key)?;
        Ok(Self {
            instance: instance.to_string(),
            api_key: api_key.to_string(),
            base_url: format!("https://{instance}.{CLOUD_DOMAIN}/{SERVICE_PATH}"),
            verify_peer: true,
            verbose: false,
        })
    }

    /// Configuration for an explicit base URL, e.g. a staging host.
    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self, ConfigError> {
        validate_api_key(api_key)?;
        Ok(Self {
            instance: String::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            verify_peer: true,
            verbose: false,
        })
    }

    /// Read the configuration from `SWRETAIL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY).ok_or(ConfigError::MissingVariable(ENV_API_KEY))?;
        let mut config = match lookup(ENV_BASE_URL) {
            Some(base_url) => Self::with_base_url(&base_url, &api_key)?,
            None => {
                let instance =
                    lookup(ENV_INSTANCE).ok_or(ConfigError::MissingVariable(ENV_INSTANCE))?;
                Self::new(&instance, &api_key)?
            }
        };
        if let Some(value) = lookup(ENV_VERIFY_PEER) {
            config.verify_peer = parse_flag(ENV_VERIFY_PEER, &value)?;
        }
        if let Some(value) = lookup(ENV_VERBOSE) {
            config.verbose = parse_flag(ENV_VERBOSE, &value)?;
        }
        Ok(config)
    }

    /// Instance name; empty when built from an explicit base URL.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base URL.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn validate_instance(instance: &str) -> Result<(), ConfigError> {
    let valid = !instance.is_empty()
        && instance
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidInstance(instance.to_string()))
    }
}

fn validate_api_key(api_key: &str) -> Result<(), ConfigError> {
    if api_key.trim().is_empty() {
        return Err(ConfigError::MissingApiKey);
    }
    Ok(())
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}
