//! Shared types for the RUGBOT agent.
//!
//! API response shapes (untrusted, every field defaulted), the
//! display-ready views derived from them, and the domain error enum.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

/// `GET /portfolio/summary`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    /// Spendable base currency.
    #[serde(default)]
    pub base_currency_balance: Decimal,
    #[serde(default)]
    pub total_coin_value: Decimal,
    #[serde(default)]
    pub total_value: Decimal,
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

/// `POST /rewards/claim`. The service reports the cooldown either as a
/// millisecond countdown or as an absolute timestamp; both are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub reward_amount: Option<Decimal>,
    #[serde(default)]
    pub time_remaining: Option<i64>,
    #[serde(default)]
    pub next_claim_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub login_streak: Option<u32>,
}

// ---------------------------------------------------------------------------
// Trading
// ---------------------------------------------------------------------------

/// `POST /coin/{symbol}/trade` response. Amounts may arrive either in
/// human units or in raw 18-decimal token units, so they stay `f64` until
/// [`crate::strategy::sizing::normalize_trade`] has looked at them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeResult {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub coins_bought: f64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub new_price: f64,
    /// Price change caused by this trade, in percent.
    #[serde(default)]
    pub price_impact: Option<f64>,
    #[serde(default)]
    pub new_balance: Option<f64>,
}

/// Pool section of the holders endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInfo {
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub base_currency_liquidity: Option<f64>,
    #[serde(default)]
    pub coin_liquidity: Option<f64>,
}

/// `GET /coin/{symbol}/holders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinInfo {
    #[serde(default)]
    pub coin_symbol: Option<String>,
    #[serde(default)]
    pub total_holders: Option<u64>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub pool_info: PoolInfo,
}

/// Display-ready view of a [`TradeResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTrade {
    pub coins: f64,
    pub price: f64,
    pub price_impact: Option<f64>,
    pub total_cost: f64,
    pub new_balance: Option<f64>,
}

/// What one Budgeted Buy cycle did.
#[derive(Debug, Clone)]
pub struct BuyReport {
    pub symbol: String,
    pub amount: Decimal,
    pub trade: NormalizedTrade,
    pub comment_posted: bool,
}

// ---------------------------------------------------------------------------
// Arcade
// ---------------------------------------------------------------------------

/// Coin side to call on a flip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipSide {
    #[default]
    Heads,
    Tails,
}

impl fmt::Display for FlipSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlipSide::Heads => write!(f, "heads"),
            FlipSide::Tails => write!(f, "tails"),
        }
    }
}

/// `POST /arcade/coinflip`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipResult {
    #[serde(default)]
    pub won: bool,
    #[serde(default)]
    pub result: Option<FlipSide>,
    #[serde(default)]
    pub payout: Decimal,
    #[serde(default)]
    pub new_balance: Decimal,
    #[serde(default)]
    pub amount_wagered: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for RUGBOT.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("API error ({endpoint}): {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
