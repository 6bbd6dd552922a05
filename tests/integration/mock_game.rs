//! Mock game for integration testing.
//!
//! A deterministic, in-memory `GameApi`: flips follow a script, buys and
//! transfers move the balance, and every write is recorded so tests can
//! assert on what the agent did.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rugbot::api::GameApi;
use rugbot::types::*;

/// Scripted result of one coin flip.
#[derive(Debug, Clone, Copy)]
pub enum Flip {
    Win,
    Loss,
    /// The endpoint errors; no balance change.
    Fail,
}

#[derive(Debug, Default)]
struct Ledger {
    balance: Decimal,
    flips: VecDeque<Flip>,
    wagers: Vec<Decimal>,
    buys: Vec<(String, Decimal)>,
    comments: Vec<(String, String)>,
    transfers: Vec<(String, Decimal)>,
    claims: u32,
}

/// In-memory game server.
#[derive(Clone)]
pub struct MockGame {
    ledger: Arc<Mutex<Ledger>>,
    cooldown_ms: Option<i64>,
    coin_price: f64,
}

impl MockGame {
    pub fn new(balance: Decimal) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(Ledger {
                balance,
                ..Ledger::default()
            })),
            cooldown_ms: Some(6 * 3_600_000),
            coin_price: 0.0025,
        }
    }

    /// Queue flip outcomes, consumed in order. An empty script loses.
    pub fn script(&self, flips: &[Flip]) {
        self.ledger.lock().unwrap().flips.extend(flips.iter().copied());
    }

    pub fn balance(&self) -> Decimal {
        self.ledger.lock().unwrap().balance
    }

    pub fn wagers(&self) -> Vec<Decimal> {
        self.ledger.lock().unwrap().wagers.clone()
    }

    pub fn buys(&self) -> Vec<(String, Decimal)> {
        self.ledger.lock().unwrap().buys.clone()
    }

    pub fn comments(&self) -> Vec<(String, String)> {
        self.ledger.lock().unwrap().comments.clone()
    }

    pub fn transfers(&self) -> Vec<(String, Decimal)> {
        self.ledger.lock().unwrap().transfers.clone()
    }

    pub fn claims(&self) -> u32 {
        self.ledger.lock().unwrap().claims
    }
}

#[async_trait]
impl GameApi for MockGame {
    async fn portfolio_summary(&self) -> Result<PortfolioSummary> {
        let balance = self.balance();
        Ok(PortfolioSummary {
            base_currency_balance: balance,
            total_coin_value: Decimal::ZERO,
            total_value: balance,
        })
    }

    async fn claim_reward(&self) -> Result<ClaimResponse> {
        self.ledger.lock().unwrap().claims += 1;
        Ok(ClaimResponse {
            success: Some(true),
            time_remaining: self.cooldown_ms,
            ..Default::default()
        })
    }

    async fn buy(&self, symbol: &str, amount: Decimal) -> Result<TradeResult> {
        let mut ledger = self.ledger.lock().unwrap();
        if amount > ledger.balance {
            return Err(anyhow!("Insufficient funds"));
        }
        ledger.balance -= amount;
        ledger.buys.push((symbol.to_string(), amount));

        let cost = amount.to_f64().unwrap_or_default();
        // Raw 18-decimal coin units, the awkward case.
        Ok(TradeResult {
            success: Some(true),
            coins_bought: cost / self.coin_price * 1e18,
            total_cost: cost,
            new_price: self.coin_price,
            price_impact: Some(0.4),
            new_balance: ledger.balance.to_f64(),
        })
    }

    async fn post_comment(&self, symbol: &str, content: &str) -> Result<()> {
        self.ledger
            .lock()
            .unwrap()
            .comments
            .push((symbol.to_string(), content.to_string()));
        Ok(())
    }

    async fn coin_info(&self, symbol: &str) -> Result<CoinInfo> {
        Ok(CoinInfo {
            coin_symbol: Some(symbol.to_string()),
            total_holders: Some(3),
            circulating_supply: None,
            pool_info: PoolInfo {
                current_price: Some(self.coin_price),
                ..Default::default()
            },
        })
    }

    async fn coin_flip(&self, side: FlipSide, amount: Decimal) -> Result<FlipResult> {
        let mut ledger = self.ledger.lock().unwrap();
        let flip = ledger.flips.pop_front().unwrap_or(Flip::Loss);
        if let Flip::Fail = flip {
            return Err(anyhow!("500 Internal Server Error"));
        }
        if amount > ledger.balance {
            return Err(anyhow!("Insufficient funds"));
        }
        ledger.wagers.push(amount);

        let won = matches!(flip, Flip::Win);
        let payout = if won { amount * Decimal::TWO } else { Decimal::ZERO };
        ledger.balance = ledger.balance - amount + payout;

        Ok(FlipResult {
            won,
            result: Some(if won {
                side
            } else if side == FlipSide::Heads {
                FlipSide::Tails
            } else {
                FlipSide::Heads
            }),
            payout,
            new_balance: ledger.balance,
            amount_wagered: Some(amount),
        })
    }

    async fn transfer(&self, recipient: &str, amount: Decimal) -> Result<()> {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.balance -= amount;
        ledger.transfers.push((recipient.to_string(), amount));
        Ok(())
    }
}
