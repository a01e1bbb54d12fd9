use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::interface_adapters::gateway::GatewaySettings;

// Runtime settings for the client (not business rules).

pub const DEFAULT_CONFIG_FILE: &str = "storefront.toml";
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const DEFAULT_POLL_ATTEMPTS: u32 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

// Optional TOML file; every field can also come from the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub login_path: Option<String>,
    pub token_file: Option<PathBuf>,
    pub request_timeout_ms: Option<u64>,
    pub payment_poll_interval_ms: Option<u64>,
    pub payment_poll_attempts: Option<u32>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Url,
    pub login_path: String,
    pub token_file: PathBuf,
    // None means requests never time out.
    pub request_timeout: Option<Duration>,
    pub payment_poll_interval: Duration,
    pub payment_poll_attempts: u32,
}

impl Config {
    // Defaults, then the TOML file, then environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match env::var("STOREFRONT_CONFIG") {
            Ok(path) => FileConfig::read(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                FileConfig::read(Path::new(DEFAULT_CONFIG_FILE))?
            }
            Err(_) => FileConfig::default(),
        };

        Self::from_sources(file, |key| env::var(key).ok())
    }

    pub fn from_sources(
        file: FileConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_url = lookup("STOREFRONT_API_URL")
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_base_url = parse_api_url(&api_url)?;

        let login_path = lookup("STOREFRONT_LOGIN_PATH")
            .or(file.login_path)
            .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string());
        if login_path.trim().is_empty() {
            return Err(invalid("STOREFRONT_LOGIN_PATH", "must not be empty"));
        }

        let token_file = lookup("STOREFRONT_TOKEN_FILE")
            .map(PathBuf::from)
            .or(file.token_file)
            .unwrap_or_else(|| default_token_file(&lookup));

        // Zero disables the timeout, same as leaving it unset.
        let request_timeout = parse_env::<u64>(&lookup, "STOREFRONT_REQUEST_TIMEOUT_MS")?
            .or(file.request_timeout_ms)
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis);

        let payment_poll_interval = parse_env::<u64>(&lookup, "STOREFRONT_PAYMENT_POLL_INTERVAL_MS")?
            .or(file.payment_poll_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));

        let payment_poll_attempts = parse_env::<u32>(&lookup, "STOREFRONT_PAYMENT_POLL_ATTEMPTS")?
            .or(file.payment_poll_attempts)
            .unwrap_or(DEFAULT_POLL_ATTEMPTS);

        Ok(Self {
            api_base_url,
            login_path,
            token_file,
            request_timeout,
            payment_poll_interval,
            payment_poll_attempts,
        })
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            base_url: self.api_base_url.clone(),
            login_path: self.login_path.clone(),
            timeout: self.request_timeout,
        }
    }
}

fn invalid(key: &str, message: impl Display) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| invalid("STOREFRONT_API_URL", e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("STOREFRONT_API_URL", "scheme must be http or https"));
    }
    Ok(url)
}

fn parse_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .map(|value| value.trim().parse::<T>().map_err(|e| invalid(key, e)))
        .transpose()
}

fn default_token_file(lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("HOME")
        .map(|home| PathBuf::from(home).join(".storefront").join("session.json"))
        .unwrap_or_else(|| PathBuf::from(".storefront-session.json"))
}
