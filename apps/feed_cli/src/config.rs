use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context};
use client_core::{ControllerConfig, DEFAULT_FETCH_CONCURRENCY, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use shared::domain::{Address, ChainId};
use url::Url;

const DEFAULT_CONFIG_FILE: &str = "feed.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub gateway_url: String,
    pub page_size: usize,
    pub fetch_concurrency: usize,
    pub request_timeout_secs: u64,
    pub accounts: Vec<String>,
    pub chain_id: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8545".into(),
            page_size: DEFAULT_PAGE_SIZE,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            request_timeout_secs: 30,
            accounts: Vec::new(),
            chain_id: 1,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    gateway_url: Option<String>,
    page_size: Option<usize>,
    fetch_concurrency: Option<usize>,
    request_timeout_secs: Option<u64>,
    accounts: Option<Vec<String>>,
    chain_id: Option<u64>,
}

/// Defaults, then the TOML file, then `FEED_*` / `APP__*` environment
/// variables. An explicit `path` must exist; `feed.toml` in the working
/// directory is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if required || path.exists() {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.gateway_url {
        settings.gateway_url = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.fetch_concurrency {
        settings.fetch_concurrency = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.accounts {
        settings.accounts = v;
    }
    if let Some(v) = file_cfg.chain_id {
        settings.chain_id = v;
    }
    Ok(())
}

fn env_value(env: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    env(format!("APP__{name}").as_str()).or_else(|| env(format!("FEED_{name}").as_str()))
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> anyhow::Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow!("environment variable {key} has invalid value '{value}'"))
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
    if let Some(v) = env_value(&env, "GATEWAY_URL") {
        settings.gateway_url = v;
    }
    if let Some(v) = env_value(&env, "PAGE_SIZE") {
        settings.page_size = parse_env("PAGE_SIZE", &v)?;
    }
    if let Some(v) = env_value(&env, "FETCH_CONCURRENCY") {
        settings.fetch_concurrency = parse_env("FETCH_CONCURRENCY", &v)?;
    }
    if let Some(v) = env_value(&env, "REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", &v)?;
    }
    if let Some(v) = env_value(&env, "ACCOUNTS") {
        settings.accounts = v
            .split(',')
            .map(str::trim)
            .filter(|account| !account.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(v) = env_value(&env, "CHAIN_ID") {
        settings.chain_id = parse_env("CHAIN_ID", &v)?;
    }
    Ok(())
}

impl Settings {
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            page_size: self.page_size,
            fetch_concurrency: self.fetch_concurrency,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn chain_id(&self) -> ChainId {
        ChainId(self.chain_id)
    }

    pub fn parsed_accounts(&self) -> anyhow::Result<Vec<Address>> {
        self.accounts
            .iter()
            .map(|raw| {
                raw.parse::<Address>()
                    .with_context(|| format!("invalid account '{raw}'"))
            })
            .collect()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        Url::parse(&self.gateway_url)
            .with_context(|| format!("invalid gateway url '{}'", self.gateway_url))?;
        if self.page_size == 0 {
            return Err(anyhow!("page_size must be at least 1"));
        }
        if self.fetch_concurrency == 0 {
            return Err(anyhow!("fetch_concurrency must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be at least 1"));
        }
        self.parsed_accounts()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
