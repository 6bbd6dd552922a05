//! Martingale staking state machine.
//!
//! `BetState` is a plain value. Each transition takes the current state
//! plus what the coin flip reported and returns the next state together
//! with the side effects the driver must perform. Nothing here touches the
//! network or the filesystem.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

/// Upper bound on the base stake.
pub const MAX_START_AMOUNT: Decimal = dec!(1800);
/// Lower bound on the base stake.
pub const MIN_START_AMOUNT: Decimal = dec!(10);
/// The loan is repaid once the balance exceeds `borrowed × 2.5`.
pub const REPAY_MULTIPLE: Decimal = dec!(2.5);
/// A win paying more than `start × 8 / 2` skips the streak bonus.
const STREAK_BONUS_CAP_DOUBLINGS: u32 = 3;

/// In-memory staking state for one betting run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetState {
    pub bet_size: Decimal,
    pub loss_streak: u32,
    pub win_streak: u32,
    pub start_amount: Decimal,
    pub stop_loss: Decimal,
    pub borrowed_amount: Decimal,
    pub has_been_paid: bool,
}

/// What a single flip reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Win { payout: Decimal, new_balance: Decimal },
    Loss { new_balance: Decimal },
}

impl Outcome {
    pub fn new_balance(&self) -> Decimal {
        match self {
            Outcome::Win { new_balance, .. } | Outcome::Loss { new_balance } => *new_balance,
        }
    }
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum BetAction {
    /// Transfer the borrowed amount to the payout recipient.
    RepayLoan { amount: Decimal },
    /// Write the loan-repaid flag file.
    PersistPaidFlag,
    /// Pause betting and run a budgeted buy with the current balance.
    Reinvest,
}

fn pow2(n: u32) -> Decimal {
    Decimal::from(1u64 << n.min(63))
}

/// `min(1800, max(base / 2^max_martingale / 2, 10))`.
pub fn start_amount_for(base_balance: Decimal, max_martingale: u32) -> Decimal {
    let scaled = base_balance / pow2(max_martingale) / dec!(2);
    MAX_START_AMOUNT.min(scaled.max(MIN_START_AMOUNT))
}

impl BetState {
    /// Fresh state sized from `base_balance`.
    pub fn new(base_balance: Decimal, max_martingale: u32, borrowed_amount: Decimal) -> Self {
        let start_amount = start_amount_for(base_balance, max_martingale);
        Self {
            bet_size: start_amount,
            loss_streak: 0,
            win_streak: 0,
            start_amount,
            stop_loss: start_amount * pow2(max_martingale),
            borrowed_amount,
            has_been_paid: false,
        }
    }

    /// Recompute the stake ladder from a new base balance.
    ///
    /// `win_streak` and the loan fields are carried over.
    pub fn reset(self, base_balance: Decimal, max_martingale: u32) -> Self {
        let start_amount = start_amount_for(base_balance, max_martingale);
        Self {
            bet_size: start_amount,
            loss_streak: 0,
            start_amount,
            stop_loss: start_amount * pow2(max_martingale),
            ..self
        }
    }

    /// True when the next stake would exceed the stop-loss or the balance.
    pub fn exceeds_stop_loss(&self, last_balance: Decimal) -> bool {
        self.bet_size > self.stop_loss || self.bet_size > last_balance
    }
}

/// Transition on a won flip.
pub fn on_win(state: BetState, payout: Decimal, new_balance: Decimal) -> (BetState, Vec<BetAction>) {
    let mut next = state;
    let mut actions = Vec::new();

    if !state.has_been_paid
        && state.borrowed_amount > Decimal::ZERO
        && new_balance > state.borrowed_amount * REPAY_MULTIPLE
    {
        next.has_been_paid = true;
        actions.push(BetAction::RepayLoan { amount: state.borrowed_amount });
        actions.push(BetAction::PersistPaidFlag);
    }

    next.bet_size = if payout * dec!(2) > state.start_amount * pow2(STREAK_BONUS_CAP_DOUBLINGS) {
        state.start_amount
    } else if state.win_streak > 2 {
        payout * dec!(4)
    } else {
        state.start_amount
    };
    next.loss_streak = 0;
    next.win_streak = state.win_streak + 1;

    debug!(
        win_streak = next.win_streak,
        bet_size = %next.bet_size,
        payout = %payout,
        "Win transition"
    );
    (next, actions)
}

/// Transition on a lost flip. The first loss keeps the stake; every
/// further consecutive loss doubles it.
pub fn on_loss(state: BetState) -> BetState {
    let mut next = state;
    next.win_streak = 0;
    next.loss_streak = state.loss_streak + 1;
    if next.loss_streak > 1 {
        next.bet_size = state.bet_size * dec!(2);
    }
    debug!(
        loss_streak = next.loss_streak,
        bet_size = %next.bet_size,
        "Loss transition"
    );
    next
}

/// Full transition for one flip, including the reinvestment check
/// against `reinvest_threshold` (`startingBase + 2 × buy ceiling`).
pub fn apply(
    state: BetState,
    outcome: Outcome,
    reinvest_threshold: Decimal,
) -> (BetState, Vec<BetAction>) {
    let (next, mut actions) = match outcome {
        Outcome::Win { payout, new_balance } => on_win(state, payout, new_balance),
        Outcome::Loss { .. } => (on_loss(state), Vec::new()),
    };
    if outcome.new_balance() > reinvest_threshold {
        actions.push(BetAction::Reinvest);
    }
    (next, actions)
}
