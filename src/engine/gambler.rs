//! Martingale betting loop.
//!
//! Drives the pure staking machine in `strategy::martingale` against the
//! coin-flip endpoint: places one wager per step, applies the transition,
//! then carries out whatever side effects it asked for (loan repayment,
//! flag file, reinvestment through the buy controller). Runs until Ctrl+C.

use anyhow::Result;
use rust_decimal::Decimal;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::buyer::{current_balance, BuyController};
use super::claimer;
use crate::api::GameApi;
use crate::config::AppConfig;
use crate::storage;
use crate::strategy::martingale::{self, BetAction, BetState, Outcome};
use crate::strategy::sizing::buy_ceiling;
use crate::types::FlipSide;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Everything the loop needs from configuration.
#[derive(Debug, Clone)]
pub struct GambleSettings {
    pub symbol: String,
    pub max_buy_amount: Decimal,
    pub max_martingale: u32,
    pub borrowed_amount: Decimal,
    pub payout_recipient: String,
    pub flip_side: FlipSide,
    pub wager_delay: Duration,
    pub error_delay: Duration,
    pub flag_file: String,
}

impl GambleSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            symbol: cfg.buy.symbol.clone(),
            max_buy_amount: cfg.buy.max_buy_amount,
            max_martingale: cfg.gamble.max_martingale,
            borrowed_amount: cfg.gamble.borrowed_amount,
            payout_recipient: cfg.gamble.payout_recipient.clone(),
            flip_side: cfg.gamble.flip_side,
            wager_delay: Duration::from_millis(cfg.gamble.wager_delay_ms),
            error_delay: Duration::from_millis(cfg.gamble.error_delay_ms),
            flag_file: cfg.gamble.flag_file.clone(),
        }
    }
}

/// Running totals for the session log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub wagers: u64,
    pub wins: u64,
    pub losses: u64,
    pub errors: u64,
    pub resets: u64,
    pub reinvestments: u64,
}

// ---------------------------------------------------------------------------
// Loop driver
// ---------------------------------------------------------------------------

pub struct Gambler<'a> {
    api: &'a dyn GameApi,
    settings: GambleSettings,
    state: BetState,
    starting_base_balance: Decimal,
    current_base_balance: Decimal,
    last_balance: Decimal,
    /// Loan repaid since the previous reinvestment.
    repaid_since_reinvest: bool,
    cooldown: Duration,
    cooldown_seen_at: Instant,
    stats: SessionStats,
}

impl<'a> Gambler<'a> {
    /// Claim the reward, read the balance and size the first stake.
    ///
    /// The stake ladder cannot be sized without a balance, so a failed
    /// summary is retried every `error_delay` until one arrives.
    pub async fn start(api: &'a dyn GameApi, settings: GambleSettings) -> Self {
        let cooldown = claimer::claim_cooldown(api).await;
        let balance = loop {
            match current_balance(api).await {
                Ok(b) => break b,
                Err(e) => {
                    warn!(
                        error = %format!("{e:#}"),
                        retry_ms = settings.error_delay.as_millis() as u64,
                        "Starting balance unavailable, retrying"
                    );
                    tokio::time::sleep(settings.error_delay).await;
                }
            }
        };
        Self::with_balance(api, settings, balance, cooldown)
    }

    /// Build a driver from an already known balance and reward cooldown.
    pub fn with_balance(
        api: &'a dyn GameApi,
        settings: GambleSettings,
        balance: Decimal,
        cooldown: Duration,
    ) -> Self {
        let state = BetState::new(balance, settings.max_martingale, settings.borrowed_amount);
        info!(
            balance = %balance,
            start_amount = %state.start_amount,
            stop_loss = %state.stop_loss,
            borrowed = %state.borrowed_amount,
            "Betting session initialised"
        );
        Self {
            api,
            settings,
            state,
            starting_base_balance: balance,
            current_base_balance: balance,
            last_balance: balance,
            repaid_since_reinvest: false,
            cooldown,
            cooldown_seen_at: Instant::now(),
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> BetState {
        self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn last_balance(&self) -> Decimal {
        self.last_balance
    }

    pub fn current_base_balance(&self) -> Decimal {
        self.current_base_balance
    }

    /// Balance above which profit is moved into the coin.
    pub fn reinvest_threshold(&self) -> Decimal {
        self.starting_base_balance + Decimal::TWO * buy_ceiling(self.settings.max_buy_amount)
    }

    fn remaining_cooldown(&self) -> Duration {
        self.cooldown.saturating_sub(self.cooldown_seen_at.elapsed())
    }

    /// Place one wager and apply its outcome. Returns the delay before the
    /// next step: the nominal pacing after a settled flip, the longer
    /// back-off after a failed one.
    pub async fn step(&mut self) -> Duration {
        if self.state.exceeds_stop_loss(self.last_balance) {
            info!(
                bet_size = %self.state.bet_size,
                stop_loss = %self.state.stop_loss,
                balance = %self.last_balance,
                "Stop-loss reached, resetting stake"
            );
            self.state = self.state.reset(self.last_balance, self.settings.max_martingale);
            self.stats.resets += 1;
        }

        let wager = self.state.bet_size;
        let flip = match self.api.coin_flip(self.settings.flip_side, wager).await {
            Ok(flip) => flip,
            Err(e) => {
                self.stats.errors += 1;
                warn!(
                    error = %e,
                    bet_size = %wager,
                    retry_ms = self.settings.error_delay.as_millis() as u64,
                    "Wager failed, retrying"
                );
                return self.settings.error_delay;
            }
        };

        self.stats.wagers += 1;
        let outcome = if flip.won {
            self.stats.wins += 1;
            Outcome::Win {
                payout: flip.payout,
                new_balance: flip.new_balance,
            }
        } else {
            self.stats.losses += 1;
            Outcome::Loss {
                new_balance: flip.new_balance,
            }
        };

        let (next, actions) = martingale::apply(self.state, outcome, self.reinvest_threshold());
        info!(
            won = flip.won,
            wager = %wager,
            payout = %flip.payout,
            balance = %flip.new_balance,
            next_bet = %next.bet_size,
            win_streak = next.win_streak,
            loss_streak = next.loss_streak,
            "Flip settled"
        );
        self.state = next;
        self.last_balance = flip.new_balance;

        let mut loan_repaid = false;
        for action in actions {
            match action {
                BetAction::RepayLoan { amount } => loan_repaid = self.repay_loan(amount).await,
                BetAction::PersistPaidFlag => {
                    if loan_repaid {
                        self.persist_paid_flag();
                    }
                }
                BetAction::Reinvest => self.reinvest().await,
            }
        }

        self.settings.wager_delay
    }

    /// Transfer the loan back. On failure the paid mark is withdrawn so a
    /// later qualifying win tries again.
    async fn repay_loan(&mut self, amount: Decimal) -> bool {
        match self
            .api
            .transfer(&self.settings.payout_recipient, amount)
            .await
        {
            Ok(()) => {
                info!(
                    recipient = %self.settings.payout_recipient,
                    amount = %amount,
                    "Loan repaid"
                );
                self.repaid_since_reinvest = true;
                true
            }
            Err(e) => {
                warn!(error = %e, amount = %amount, "Loan repayment failed");
                self.state.has_been_paid = false;
                false
            }
        }
    }

    fn persist_paid_flag(&self) {
        if let Err(e) = storage::write_paid_flag(
            &self.settings.flag_file,
            &self.settings.payout_recipient,
            self.state.borrowed_amount,
        ) {
            warn!(error = %e, "Could not write paid flag");
        }
    }

    /// Buy with the current balance (no comment), then re-size the stake
    /// ladder from what is left.
    async fn reinvest(&mut self) {
        let balance = match current_balance(self.api).await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Balance refresh failed, using last flip balance");
                self.last_balance
            }
        };
        info!(balance = %balance, threshold = %self.reinvest_threshold(), "Reinvesting profit");

        let controller = BuyController::new(self.api, &self.settings.symbol, self.settings.max_buy_amount);
        let report = match controller.run(balance, self.remaining_cooldown(), false).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Reinvestment buy failed, betting on");
                return;
            }
        };

        let spent = report.as_ref().map(|r| r.amount).unwrap_or_default();
        let post_buy = match current_balance(self.api).await {
            Ok(b) => b,
            Err(e) => {
                debug!(error = %e, "Post-buy balance unavailable, estimating");
                balance - spent
            }
        };

        let base = if self.repaid_since_reinvest {
            post_buy - self.state.borrowed_amount
        } else {
            post_buy
        };
        self.repaid_since_reinvest = false;
        self.current_base_balance = base;
        self.last_balance = post_buy;
        self.state = self.state.reset(base, self.settings.max_martingale);
        self.stats.reinvestments += 1;

        info!(
            spent = %spent,
            base = %base,
            start_amount = %self.state.start_amount,
            stop_loss = %self.state.stop_loss,
            "Stake ladder re-sized after reinvestment"
        );
    }

    /// Step forever, sleeping the returned delay in between. Stops on Ctrl+C.
    pub async fn run(&mut self) {
        info!(
            side = %self.settings.flip_side,
            threshold = %self.reinvest_threshold(),
            "Entering betting loop. Press Ctrl+C to stop."
        );

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            let delay = self.step().await;
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received.");
                    break;
                }
            }
        }

        info!(
            wagers = self.stats.wagers,
            wins = self.stats.wins,
            losses = self.stats.losses,
            errors = self.stats.errors,
            reinvestments = self.stats.reinvestments,
            balance = %self.last_balance,
            "Betting session ended"
        );
    }
}

/// Entry point for `--gamble`.
pub async fn run_gamble(api: &dyn GameApi, cfg: &AppConfig) -> Result<()> {
    let mut gambler = Gambler::start(api, GambleSettings::from_config(cfg)).await;
    gambler.run().await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
