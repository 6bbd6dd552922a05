//! Budgeted buy controller.
//!
//! Spreads the spendable balance over the hours left until the next
//! reward, buys that slice of the configured coin, normalizes the trade
//! response and optionally posts a status comment about it.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn};

use super::claimer;
use crate::api::GameApi;
use crate::config::AppConfig;
use crate::strategy::sizing::{buy_amount, normalize_trade};
use crate::strategy::yields::{YieldProjection, HOUR};
use crate::types::{BotError, BuyReport, NormalizedTrade};

/// Longest comment the service accepts.
pub const MAX_COMMENT_CHARS: usize = 500;

/// Spendable base-currency balance.
pub async fn current_balance(api: &dyn GameApi) -> Result<Decimal> {
    let summary = api
        .portfolio_summary()
        .await
        .context("Portfolio summary request failed")?;
    Ok(summary.base_currency_balance)
}

// ---------------------------------------------------------------------------
// Comment formatting
// ---------------------------------------------------------------------------

/// Compact human formatting: `12.35K`, `3.10M`, `0.0025`, `1.000e-9`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let abs = value.abs();
    let scaled = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")]
        .iter()
        .find(|(unit, _)| abs >= *unit)
        .map(|(unit, suffix)| format!("{:.2}{suffix}", value / unit));
    if let Some(s) = scaled {
        return s;
    }
    if abs >= 1.0 || abs == 0.0 {
        return format!("{value:.2}");
    }
    if abs >= 0.0001 {
        let s = format!("{value:.8}");
        return s.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{value:.3e}")
}

fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:+.2}%"),
        None => "n/a".to_string(),
    }
}

/// Status line posted under the coin after a buy.
pub fn format_status_comment(symbol: &str, trade: &NormalizedTrade, yields: &YieldProjection) -> String {
    format!(
        "Bought {} {symbol} at {} each (price impact {}). \
         Projected yield at one buy per hour: 24h {} | 7d {} | 30d {} | 1y {}",
        format_number(trade.coins),
        format_number(trade.price),
        format_pct(trade.price_impact),
        format_pct(yields.daily),
        format_pct(yields.weekly),
        format_pct(yields.monthly),
        format_pct(yields.annual),
    )
}

/// Cut `text` to at most `max_chars` characters, ending in `…` when cut.
pub fn truncate_comment(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct BuyController<'a> {
    api: &'a dyn GameApi,
    symbol: String,
    max_buy_amount: Decimal,
}

impl<'a> BuyController<'a> {
    pub fn new(api: &'a dyn GameApi, symbol: &str, max_buy_amount: Decimal) -> Self {
        Self {
            api,
            symbol: symbol.to_string(),
            max_buy_amount,
        }
    }

    /// Buy this cycle's slice of `balance`.
    ///
    /// Returns `Ok(None)` when the slice rounds down to nothing. An error
    /// means the purchase itself failed; the follow-up price lookup and the
    /// comment never fail the cycle.
    pub async fn run(
        &self,
        balance: Decimal,
        cooldown: Duration,
        provide_comment: bool,
    ) -> Result<Option<BuyReport>> {
        if self.symbol.is_empty() {
            return Err(BotError::Config("BUY_SYMBOL is not set".into()).into());
        }

        let amount = buy_amount(balance, cooldown, self.max_buy_amount);
        info!(
            symbol = %self.symbol,
            balance = %balance,
            hours_left = format!("{:.2}", cooldown.as_secs_f64() / HOUR.as_secs_f64()),
            amount = %amount,
            "Budgeted buy sized"
        );

        if amount < Decimal::ONE {
            warn!(symbol = %self.symbol, balance = %balance, "Nothing to spend this cycle");
            return Ok(None);
        }

        let trade = self
            .api
            .buy(&self.symbol, amount)
            .await
            .with_context(|| format!("Buy of {amount} into {} failed", self.symbol))?;

        let pool_price = match self.api.coin_info(&self.symbol).await {
            Ok(info) => info.pool_info.current_price,
            Err(e) => {
                warn!(symbol = %self.symbol, error = %e, "Coin info lookup failed");
                None
            }
        };

        let normalized = normalize_trade(&trade, pool_price);
        let yields = YieldProjection::from_price_impact(normalized.price_impact);

        info!(
            symbol = %self.symbol,
            coins = %format_number(normalized.coins),
            price = %format_number(normalized.price),
            impact = %format_pct(normalized.price_impact),
            daily_yield = %format_pct(yields.daily),
            "Buy complete"
        );

        let mut comment_posted = false;
        if provide_comment {
            let text = truncate_comment(
                &format_status_comment(&self.symbol, &normalized, &yields),
                MAX_COMMENT_CHARS,
            );
            match self.api.post_comment(&self.symbol, &text).await {
                Ok(()) => comment_posted = true,
                Err(e) => warn!(symbol = %self.symbol, error = %e, "Status comment failed"),
            }
        }

        Ok(Some(BuyReport {
            symbol: self.symbol.clone(),
            amount,
            trade: normalized,
            comment_posted,
        }))
    }
}

/// One standalone cycle: claim the reward, then (if enabled) buy.
pub async fn run_buy_cycle(api: &dyn GameApi, cfg: &AppConfig, buy_enabled: bool) -> Result<()> {
    let cooldown = claimer::claim_cooldown(api).await;

    if !buy_enabled {
        info!("Buying disabled, cycle ends after claim");
        return Ok(());
    }

    let balance = match current_balance(api).await {
        Ok(b) => b,
        Err(e) => {
            warn!(error = %e, "Balance unavailable, treating as zero");
            Decimal::ZERO
        }
    };

    BuyController::new(api, &cfg.buy.symbol, cfg.buy.max_buy_amount)
        .run(balance, cooldown, cfg.buy.post_comment)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
