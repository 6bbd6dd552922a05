//! Remote game API.
//!
//! Defines the `GameApi` trait the controllers talk to, and the
//! reqwest-backed `RugplayClient` implementing it.

pub mod rugplay;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{ClaimResponse, CoinInfo, FlipResult, FlipSide, PortfolioSummary, TradeResult};

/// Abstraction over the game's HTTP endpoints.
///
/// Every call is a single request; retries and fallbacks belong to the
/// caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameApi: Send + Sync {
    /// `GET /portfolio/summary`.
    async fn portfolio_summary(&self) -> Result<PortfolioSummary>;

    /// `POST /rewards/claim`.
    async fn claim_reward(&self) -> Result<ClaimResponse>;

    /// `POST /coin/{symbol}/trade` with a BUY of `amount` base currency.
    async fn buy(&self, symbol: &str, amount: Decimal) -> Result<TradeResult>;

    /// `POST /coin/{symbol}/comments`.
    async fn post_comment(&self, symbol: &str, content: &str) -> Result<()>;

    /// `GET /coin/{symbol}/holders`.
    async fn coin_info(&self, symbol: &str) -> Result<CoinInfo>;

    /// `POST /arcade/coinflip`.
    async fn coin_flip(&self, side: FlipSide, amount: Decimal) -> Result<FlipResult>;

    /// `POST /transfer` of base currency to another player.
    async fn transfer(&self, recipient: &str, amount: Decimal) -> Result<()>;
}
