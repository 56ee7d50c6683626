//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub use cli::{CliArgs, Command, Overrides};

use crate::cache::{
    CacheConfig, DEFAULT_COLLECTION_DETAIL_TTL_SECS, DEFAULT_COLLECTIONS_TTL_SECS,
    DEFAULT_NAVIGATION_PRELOAD_LIMIT, DEFAULT_NAVIGATION_TTL_SECS,
};
use crate::rpc::{Endpoints, ExecutionContext, TransportConfig, default_user_agent};
use crate::sidebar::DEFAULT_FETCH_TIMEOUT;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "hadith";
const ENV_PREFIX: &str = "HADITH";
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub cache: CacheConfig,
    pub loader: LoaderSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub context: ExecutionContext,
    pub endpoints: Endpoints,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ApiSettings {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            context: self.context,
            endpoints: self.endpoints.clone(),
            timeout: self.timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoaderSettings {
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    cache: RawCacheSettings,
    loader: RawLoaderSettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    public_url: Option<String>,
    internal_url: Option<String>,
    development: Option<bool>,
    context: Option<String>,
    timeout_seconds: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    collections_ttl_seconds: Option<u64>,
    collection_detail_ttl_seconds: Option<u64>,
    navigation_ttl_seconds: Option<u64>,
    navigation_preload_limit: Option<usize>,
    single_flight: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoaderSettings {
    fetch_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = overrides.api_public_url.as_ref() {
            self.api.public_url = Some(url.clone());
        }
        if let Some(url) = overrides.api_internal_url.as_ref() {
            self.api.internal_url = Some(url.clone());
        }
        if let Some(context) = overrides.api_context.as_ref() {
            self.api.context = Some(context.clone());
        }
        if let Some(seconds) = overrides.api_timeout_seconds {
            self.api.timeout_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            api,
            cache,
            loader,
            logging,
        } = raw;

        Ok(Self {
            api: build_api_settings(api)?,
            cache: build_cache_settings(cache)?,
            loader: build_loader_settings(loader)?,
            logging: build_logging_settings(logging)?,
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let public = match non_blank(api.public_url) {
        Some(raw) => parse_url(&raw, "api.public_url")?,
        None => return Err(LoadError::invalid("api.public_url", "must be set")),
    };
    let internal = non_blank(api.internal_url)
        .map(|raw| parse_url(&raw, "api.internal_url"))
        .transpose()?;
    let endpoints = Endpoints::resolve(public, internal, api.development.unwrap_or(false));

    let context = match non_blank(api.context) {
        Some(raw) => parse_context(&raw)?,
        None => ExecutionContext::default(),
    };

    let timeout = positive_secs(
        api.timeout_seconds.unwrap_or(DEFAULT_API_TIMEOUT_SECS),
        "api.timeout_seconds",
    )?;

    let user_agent =
        non_blank(api.user_agent).unwrap_or_else(|| default_user_agent().to_string());

    Ok(ApiSettings {
        context,
        endpoints,
        timeout,
        user_agent,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheConfig, LoadError> {
    Ok(CacheConfig {
        collections_ttl: positive_secs(
            cache
                .collections_ttl_seconds
                .unwrap_or(DEFAULT_COLLECTIONS_TTL_SECS),
            "cache.collections_ttl_seconds",
        )?,
        collection_detail_ttl: positive_secs(
            cache
                .collection_detail_ttl_seconds
                .unwrap_or(DEFAULT_COLLECTION_DETAIL_TTL_SECS),
            "cache.collection_detail_ttl_seconds",
        )?,
        navigation_ttl: positive_secs(
            cache
                .navigation_ttl_seconds
                .unwrap_or(DEFAULT_NAVIGATION_TTL_SECS),
            "cache.navigation_ttl_seconds",
        )?,
        navigation_preload_limit: cache
            .navigation_preload_limit
            .unwrap_or(DEFAULT_NAVIGATION_PRELOAD_LIMIT),
        single_flight: cache.single_flight.unwrap_or(true),
    })
}

fn build_loader_settings(loader: RawLoaderSettings) -> Result<LoaderSettings, LoadError> {
    let fetch_timeout = match loader.fetch_timeout_seconds {
        Some(seconds) => positive_secs(seconds, "loader.fetch_timeout_seconds")?,
        None => DEFAULT_FETCH_TIMEOUT,
    };
    Ok(LoaderSettings { fetch_timeout })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_url(raw: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(raw).map_err(|err| LoadError::invalid(key, err.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(LoadError::invalid(
            key,
            format!("unsupported scheme `{other}`"),
        )),
    }
}

fn parse_context(raw: &str) -> Result<ExecutionContext, LoadError> {
    match raw.to_ascii_lowercase().as_str() {
        "server" => Ok(ExecutionContext::Server),
        "client" => Ok(ExecutionContext::Client),
        other => Err(LoadError::invalid(
            "api.context",
            format!("expected `server` or `client`, got `{other}`"),
        )),
    }
}

fn positive_secs(seconds: u64, key: &'static str) -> Result<Duration, LoadError> {
    if seconds == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests;
