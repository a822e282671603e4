//! Configuration loading from TOML with environment variable resolution.
//!
//! Tunables live in `config.toml`; every field has a default, so the file
//! is optional. The environment variables the agent has always read
//! (`TOLERANCE_FROM`, `STARS_AUTO_BUY`, ...) override the file. Secrets and
//! account lists are referenced by env-var name and resolved at startup.

use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::api::client::DEFAULT_BASE_URL;
use crate::notify::telegram::DEFAULT_API_URL as DEFAULT_TELEGRAM_URL;
use crate::types::{GalaxyId, Session};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub api: ApiConfig,
    pub stars: StarsConfig,
    pub accounts: AccountsConfig,
    pub alerts: AlertsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    /// Lower bound of the pause between ticks, in seconds.
    pub tolerance_from_secs: u64,
    /// Upper bound of the pause between ticks, in seconds (inclusive).
    pub tolerance_to_secs: u64,
    /// Statistics are reported every this many ticks.
    pub stats_per_request: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            tolerance_from_secs: 3600,
            tolerance_to_secs: 4200,
            stats_per_request: 6,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Extra request headers, layered over the built-in browser headers.
    pub headers: BTreeMap<String, String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StarsConfig {
    pub auto_buy: bool,
    /// Stars bought per galaxy on each auto-buy.
    pub count: u32,
}

impl Default for StarsConfig {
    fn default() -> Self {
        Self {
            auto_buy: false,
            count: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AccountsConfig {
    /// Env var holding comma-separated session tokens.
    pub session_ids_env: String,
    /// Env var holding comma-separated galaxy ids, one per session.
    pub galaxy_ids_env: String,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            session_ids_env: "SESSION_ID".to_string(),
            galaxy_ids_env: "GALAXY_ID".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlertsConfig {
    /// When false, notifications only go to the log.
    pub send_to_telegram: bool,
    pub telegram_bot_token_env: String,
    pub telegram_chat_id_env: String,
    pub telegram_api_url: String,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            send_to_telegram: true,
            telegram_bot_token_env: "BOT_TOKEN".to_string(),
            telegram_chat_id_env: "TELEGRAM_ID".to_string(),
            telegram_api_url: DEFAULT_TELEGRAM_URL.to_string(),
        }
    }
}

/// Sessions and their galaxy ids, resolved from the environment.
#[derive(Debug, Clone)]
pub struct Accounts {
    pub sessions: Vec<Session>,
    pub galaxy_ids: Vec<GalaxyId>,
}

/// Telegram bot token and destination chat.
#[derive(Debug)]
pub struct TelegramCredentials {
    pub token: SecretString,
    pub chat_id: i64,
}

impl AppConfig {
    /// Load configuration from a TOML file and the process environment.
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load with an explicit environment lookup.
    pub fn load_with(path: &str, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {path}"))?;
            Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))?
        } else {
            info!(path, "No config file found, using defaults and environment");
            Self::default()
        };

        config.apply_env_overrides(&env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply the agent's historical environment variables over the file values.
    pub fn apply_env_overrides(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<()> {
        override_from(env, "TOLERANCE_FROM", parse_number, &mut self.agent.tolerance_from_secs)?;
        override_from(env, "TOLERANCE_TO", parse_number, &mut self.agent.tolerance_to_secs)?;
        override_from(env, "STATS_PER_REQUEST", parse_number, &mut self.agent.stats_per_request)?;
        override_from(env, "STARS_AUTO_BUY", parse_bool, &mut self.stars.auto_buy)?;
        override_from(env, "STARS_AUTO_BUY_COUNT", parse_number, &mut self.stars.count)?;
        override_from(env, "SEND_TO_TELEGRAM", parse_bool, &mut self.alerts.send_to_telegram)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent.tolerance_from_secs > self.agent.tolerance_to_secs {
            bail!(
                "TOLERANCE_FROM ({}) must not exceed TOLERANCE_TO ({})",
                self.agent.tolerance_from_secs,
                self.agent.tolerance_to_secs
            );
        }
        if self.api.base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        Ok(())
    }
}

impl AccountsConfig {
    pub fn resolve(&self) -> Result<Accounts> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    pub fn resolve_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<Accounts> {
        let sessions = split_list(env(&self.session_ids_env).as_deref());
        if sessions.is_empty() {
            bail!(
                "{} is required and must contain at least one session ID",
                self.session_ids_env
            );
        }

        let galaxy_ids = split_list(env(&self.galaxy_ids_env).as_deref());
        if galaxy_ids.is_empty() {
            bail!(
                "{} is required and must contain at least one galaxy ID",
                self.galaxy_ids_env
            );
        }

        Ok(Accounts {
            sessions: sessions.into_iter().map(Session::new).collect(),
            galaxy_ids: galaxy_ids.into_iter().map(GalaxyId::new).collect(),
        })
    }
}

impl AlertsConfig {
    pub fn telegram_credentials(&self) -> Result<TelegramCredentials> {
        self.telegram_credentials_with(|key| std::env::var(key).ok())
    }

    pub fn telegram_credentials_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<TelegramCredentials> {
        let token = env(&self.telegram_bot_token_env)
            .filter(|t| !t.trim().is_empty())
            .with_context(|| format!("Environment variable not set: {}", self.telegram_bot_token_env))?;

        let raw_chat_id = env(&self.telegram_chat_id_env)
            .with_context(|| format!("Environment variable not set: {}", self.telegram_chat_id_env))?;
        let chat_id = raw_chat_id.trim().parse::<i64>().with_context(|| {
            format!(
                "Invalid value for {}: must be a 64-bit integer",
                self.telegram_chat_id_env
            )
        })?;

        Ok(TelegramCredentials {
            token: SecretString::new(token.trim().to_string()),
            chat_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn override_from<T>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: fn(&str) -> Option<T>,
    target: &mut T,
) -> Result<()> {
    let Some(raw) = env(key) else {
        return Ok(());
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(());
    }
    *target = parse(raw).with_context(|| format!("Invalid value for {key}: {raw:?}"))?;
    Ok(())
}

fn parse_number<T: FromStr>(raw: &str) -> Option<T> {
    raw.parse().ok()
}

/// Accepts the usual spellings: `1/0`, `t/f`, `true/false` in any case.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}
