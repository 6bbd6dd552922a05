//! Configuration loading.
//!
//! An optional TOML file provides tuning (every field has a default, so
//! the file may be missing or partial); the environment then overrides the
//! connection and buy settings. Credentials only ever come from the
//! environment and are held as `SecretString`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::types::{BotError, FlipSide};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
const DEFAULT_BASE_URL: &str = "https://rugplay.com/api";
const DEFAULT_SITE_URL: &str = "https://rugplay.com";
const DEFAULT_FLAG_FILE: &str = "loan_repaid.flag";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; rv:131.0) Gecko/20100101 Firefox/131.0";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub buy: BuyConfig,
    pub gamble: GambleConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// API root, without trailing slash.
    pub base_url: String,
    /// Site root used for `Referer` / `Origin`.
    pub site_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    #[serde(skip)]
    pub session_token: Option<SecretString>,
    #[serde(skip)]
    pub cf_clearance: Option<SecretString>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            session_token: None,
            cf_clearance: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BuyConfig {
    /// Coin to buy each cycle.
    pub symbol: String,
    /// Operator cap per buy. Values below 1875 are ineffective.
    pub max_buy_amount: Decimal,
    pub enabled: bool,
    /// Post a status comment after a standalone buy.
    pub post_comment: bool,
}

impl Default for BuyConfig {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            max_buy_amount: Decimal::ZERO,
            enabled: false,
            post_comment: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GambleConfig {
    /// Number of doublings the stop-loss allows.
    pub max_martingale: u32,
    /// Loan repaid once the balance reaches 2.5× this amount. Zero disables.
    pub borrowed_amount: Decimal,
    pub payout_recipient: String,
    pub flip_side: FlipSide,
    pub wager_delay_ms: u64,
    pub error_delay_ms: u64,
    pub flag_file: String,
}

impl Default for GambleConfig {
    fn default() -> Self {
        Self {
            max_martingale: 9,
            borrowed_amount: dec!(20000),
            payout_recipient: String::new(),
            flip_side: FlipSide::Heads,
            wager_delay_ms: 1500,
            error_delay_ms: 5000,
            flag_file: DEFAULT_FLAG_FILE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path` if it exists, then apply environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {path}"))?;
            Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {path}"))?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Override fields from environment variables looked up via `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("BASE_URL") {
            self.api.base_url = url;
        }
        self.api.base_url = self.api.base_url.trim_end_matches('/').to_string();

        if let Some(ua) = get("USER_AGENT") {
            self.api.user_agent = ua;
        }
        if let Some(token) = get("SESSION_TOKEN") {
            self.api.session_token = Some(SecretString::new(token));
        }
        if let Some(cf) = get("CF_CLEARANCE") {
            self.api.cf_clearance = Some(SecretString::new(cf));
        }
        if let Some(symbol) = get("BUY_SYMBOL") {
            self.buy.symbol = symbol;
        }
        if let Some(raw) = get("MAX_BUY_AMOUNT") {
            self.buy.max_buy_amount = Decimal::from_str(&raw)
                .map_err(|_| BotError::Config(format!("MAX_BUY_AMOUNT is not a number: {raw}")))?;
        }
        if let Some(raw) = get("BUY_ENABLED") {
            self.buy.enabled = parse_flag(&raw)
                .ok_or_else(|| BotError::Config(format!("BUY_ENABLED is not a boolean: {raw}")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(BotError::Config("base_url must not be empty".into()).into());
        }
        if self.buy.max_buy_amount < Decimal::ZERO {
            return Err(BotError::Config("max_buy_amount must not be negative".into()).into());
        }
        if self.gamble.max_martingale > 30 {
            return Err(BotError::Config(format!(
                "max_martingale {} is too large",
                self.gamble.max_martingale
            ))
            .into());
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Flags picked out of argv. Unknown arguments are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    /// `--every-hour` / `--schedule`
    pub every_hour: bool,
    /// `--gamble`
    pub gamble: bool,
    /// `--enable-buy`
    pub enable_buy: bool,
}

impl RunFlags {
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::default();
        for arg in args {
            match arg.as_ref() {
                "--every-hour" | "--schedule" => flags.every_hour = true,
                "--gamble" => flags.gamble = true,
                "--enable-buy" => flags.enable_buy = true,
                _ => {}
            }
        }
        flags
    }
}
