//! Budgeted buy sizing and trade-result normalization.
//!
//! Both are pure. The trade endpoint mixes raw 18-decimal token units with
//! human units and gives no hint which one it used, so normalization works
//! from value ranges alone.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

use super::yields::HOUR;
use crate::types::{NormalizedTrade, TradeResult};

/// Lowest ceiling a single buy may have, whatever `MAX_BUY_AMOUNT` says.
pub const BUY_FLOOR: Decimal = dec!(1875);

/// Anything above this is assumed to be in raw token units.
const RAW_UNIT_THRESHOLD: f64 = 1e9;
const RAW_UNIT_SCALE: f64 = 1e18;

const MIN_SANE_PRICE: f64 = 0.0001;
const MAX_SANE_PRICE: f64 = 1e6;
const MIN_SANE_COINS: f64 = 0.0001;
const MAX_SANE_COINS: f64 = 1e15;

/// Effective per-buy ceiling: `max(1875, configured)`.
///
/// A configured cap below 1875 has no effect.
pub fn buy_ceiling(max_buy_amount: Decimal) -> Decimal {
    BUY_FLOOR.max(max_buy_amount)
}

/// Amount to spend this cycle.
///
/// Spreads `balance` evenly over the hours left until the next reward,
/// counting at least one hour, then clamps to [`buy_ceiling`]:
/// `min(max(1875, cap), floor(balance / max(cooldown / 1h, 1)))`.
pub fn buy_amount(balance: Decimal, cooldown: Duration, max_buy_amount: Decimal) -> Decimal {
    let cooldown_ms = Decimal::from(cooldown.as_millis() as u64);
    let hour_ms = Decimal::from(HOUR.as_millis() as u64);
    let hours_left = (cooldown_ms / hour_ms).max(Decimal::ONE);
    let raw = (balance.max(Decimal::ZERO) / hours_left).floor();
    buy_ceiling(max_buy_amount).min(raw)
}

fn descale(value: f64) -> f64 {
    if value > RAW_UNIT_THRESHOLD {
        value / RAW_UNIT_SCALE
    } else {
        value
    }
}

fn is_sane_price(price: f64) -> bool {
    (MIN_SANE_PRICE..=MAX_SANE_PRICE).contains(&price)
}

fn is_sane_coins(coins: f64) -> bool {
    (MIN_SANE_COINS..=MAX_SANE_COINS).contains(&coins)
}

/// Normalize a trade response for display.
///
/// - prices above 1e9 are divided by 1e18;
/// - the trade's own `newPrice` wins if it lands in [0.0001, 1e6],
///   otherwise the pool's current price (when known and sane);
/// - a coin count outside [0.0001, 1e15] is replaced by
///   `totalCost / price`.
pub fn normalize_trade(trade: &TradeResult, pool_price: Option<f64>) -> NormalizedTrade {
    let exec_price = descale(trade.new_price);
    let pool_price = pool_price.map(descale).filter(|p| is_sane_price(*p));

    let price = if is_sane_price(exec_price) {
        exec_price
    } else {
        pool_price.unwrap_or(exec_price)
    };

    let coins = if !is_sane_coins(trade.coins_bought) && price > 0.0 && price.is_finite() {
        trade.total_cost / price
    } else {
        trade.coins_bought
    };

    NormalizedTrade {
        coins,
        price,
        price_impact: trade.price_impact.filter(|p| p.is_finite()),
        total_cost: trade.total_cost,
        new_balance: trade.new_balance,
    }
}
