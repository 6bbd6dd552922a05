//! End-to-end runs of the buy cycle and the betting loop against the
//! in-memory mock game.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

use rugbot::config::AppConfig;
use rugbot::engine::buyer::{run_buy_cycle, MAX_COMMENT_CHARS};
use rugbot::engine::gambler::{GambleSettings, Gambler};
use rugbot::strategy::martingale::start_amount_for;
use rugbot::types::FlipSide;

use crate::mock_game::{Flip, MockGame};

fn settings() -> GambleSettings {
    GambleSettings {
        symbol: "RUG".to_string(),
        max_buy_amount: dec!(1875),
        max_martingale: 9,
        borrowed_amount: Decimal::ZERO,
        payout_recipient: "lender".to_string(),
        flip_side: FlipSide::Heads,
        wager_delay: Duration::from_millis(1500),
        error_delay: Duration::from_millis(5000),
        flag_file: std::env::temp_dir()
            .join(format!("rugbot_session_{}.flag", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .to_string(),
    }
}

fn six_hours() -> Duration {
    Duration::from_secs(6 * 3600)
}

#[tokio::test]
async fn test_buy_cycle_with_comment() {
    let game = MockGame::new(dec!(10000));
    let mut cfg = AppConfig::default();
    cfg.buy.symbol = "RUG".to_string();
    cfg.buy.max_buy_amount = dec!(1000);

    run_buy_cycle(&game, &cfg, true).await.unwrap();

    assert_eq!(game.claims(), 1);
    assert_eq!(game.buys(), vec![("RUG".to_string(), dec!(1666))]);
    assert_eq!(game.balance(), dec!(8334));

    let comments = game.comments();
    assert_eq!(comments.len(), 1);
    let (symbol, text) = &comments[0];
    assert_eq!(symbol, "RUG");
    assert!(text.chars().count() <= MAX_COMMENT_CHARS);
    // Raw coin units were recomputed from cost / price.
    assert!(text.contains("666.40K"), "{text}");
}

#[tokio::test]
async fn test_buy_cycle_without_comment() {
    let game = MockGame::new(dec!(10000));
    let mut cfg = AppConfig::default();
    cfg.buy.symbol = "RUG".to_string();
    cfg.buy.post_comment = false;

    run_buy_cycle(&game, &cfg, true).await.unwrap();

    assert_eq!(game.buys().len(), 1);
    assert!(game.comments().is_empty());
}

#[tokio::test]
async fn test_martingale_staircase() {
    let game = MockGame::new(dec!(102400));
    game.script(&[Flip::Loss, Flip::Loss, Flip::Win, Flip::Loss]);

    let mut g = Gambler::with_balance(&game, settings(), dec!(102400), six_hours());
    for _ in 0..4 {
        assert_eq!(g.step().await, Duration::from_millis(1500));
    }

    assert_eq!(game.wagers(), vec![dec!(100), dec!(100), dec!(200), dec!(100)]);
    assert_eq!(g.state().loss_streak, 1);
    assert_eq!(g.state().win_streak, 0);
    assert_eq!(g.stats().wins, 1);
    assert_eq!(g.stats().losses, 3);
    assert!(game.buys().is_empty());
}

#[tokio::test]
async fn test_win_streak_bonus_and_reset() {
    let game = MockGame::new(dec!(102400));
    game.script(&[Flip::Win, Flip::Win, Flip::Win, Flip::Win, Flip::Win]);

    let mut g = Gambler::with_balance(&game, settings(), dec!(102400), six_hours());
    for _ in 0..5 {
        g.step().await;
    }

    // Fourth win (streak 3 before it, payout 200) escalates to 800; the
    // 1600 payout from that stake is above start × 8 / 2, so back to 100.
    assert_eq!(
        game.wagers(),
        vec![dec!(100), dec!(100), dec!(100), dec!(100), dec!(800)]
    );
    assert_eq!(g.state().bet_size, dec!(100));
    assert_eq!(g.state().win_streak, 5);
}

#[tokio::test]
async fn test_loan_repaid_exactly_once() {
    let game = MockGame::new(dec!(60000));
    game.script(&[Flip::Win, Flip::Win, Flip::Loss, Flip::Win]);

    let mut s = settings();
    s.borrowed_amount = dec!(20000);
    let flag = s.flag_file.clone();

    let mut g = Gambler::with_balance(&game, s, dec!(60000), six_hours());
    for _ in 0..4 {
        g.step().await;
    }

    assert_eq!(game.transfers(), vec![("lender".to_string(), dec!(20000))]);
    assert!(g.state().has_been_paid);

    let contents = std::fs::read_to_string(&flag).unwrap();
    assert!(contents.starts_with("paid=true"));
    std::fs::remove_file(&flag).unwrap();
}

#[tokio::test]
async fn test_wager_error_retries_same_stake() {
    let game = MockGame::new(dec!(102400));
    game.script(&[Flip::Loss, Flip::Loss, Flip::Fail, Flip::Loss]);

    let mut g = Gambler::with_balance(&game, settings(), dec!(102400), six_hours());
    g.step().await;
    g.step().await;
    let before = g.state();

    assert_eq!(g.step().await, Duration::from_secs(5));
    assert_eq!(g.state(), before);

    g.step().await;
    assert_eq!(game.wagers(), vec![dec!(100), dec!(100), dec!(200)]);
    assert_eq!(g.stats().errors, 1);
}

#[tokio::test]
async fn test_stop_loss_resets_ladder() {
    let game = MockGame::new(dec!(102400));
    game.script(&[Flip::Loss; 6]);

    let mut s = settings();
    s.max_martingale = 3;
    let mut g = Gambler::with_balance(&game, s, dec!(102400), six_hours());
    assert_eq!(g.state().start_amount, dec!(1800));
    assert_eq!(g.state().stop_loss, dec!(14400));

    for _ in 0..6 {
        g.step().await;
    }

    assert_eq!(
        game.wagers(),
        vec![dec!(1800), dec!(1800), dec!(3600), dec!(7200), dec!(14400), dec!(1800)]
    );
    assert_eq!(game.balance(), dec!(71800));
    assert_eq!(g.stats().resets, 1);
}

#[tokio::test]
async fn test_reinvestment_buys_silently() {
    let game = MockGame::new(dec!(110000));
    game.script(&[Flip::Loss, Flip::Win]);

    // Session started at 100000; the threshold is 100000 + 2 × 1875.
    let mut g = Gambler::with_balance(&game, settings(), dec!(100000), six_hours());
    assert_eq!(g.reinvest_threshold(), dec!(103750));

    g.step().await;

    assert_eq!(game.buys(), vec![("RUG".to_string(), dec!(1875))]);
    assert!(game.comments().is_empty());
    assert_eq!(g.stats().reinvestments, 1);
    assert_eq!(g.current_base_balance(), game.balance());
    assert_eq!(g.state().loss_streak, 0);
    assert_eq!(g.state().bet_size, g.state().start_amount);

    // The threshold is anchored to the session's starting balance and is
    // not raised by a reinvestment, so any later flip that still settles
    // above it reinvests again.
    g.step().await;
    assert_eq!(game.buys().len(), 2);
    assert!(game.comments().is_empty());
}

#[tokio::test]
async fn test_repaid_loan_subtracted_from_one_reinvestment() {
    let game = MockGame::new(dec!(120000));
    game.script(&[Flip::Win, Flip::Loss]);

    let mut s = settings();
    s.borrowed_amount = dec!(20000);
    let flag = s.flag_file.clone();

    // Threshold 63750, repayment above 50000: the first win does both.
    let mut g = Gambler::with_balance(&game, s, dec!(60000), six_hours());
    g.step().await;

    assert_eq!(game.transfers(), vec![("lender".to_string(), dec!(20000))]);
    assert_eq!(game.buys().len(), 1);
    let post_buy = game.balance();
    assert_eq!(g.current_base_balance(), post_buy - dec!(20000));
    assert_eq!(g.state().start_amount, start_amount_for(post_buy - dec!(20000), 9));

    // Next flip is still above the threshold; the loan is not taken off again.
    g.step().await;
    assert_eq!(game.buys().len(), 2);
    assert_eq!(game.transfers().len(), 1);
    assert_eq!(g.current_base_balance(), game.balance());
    assert_eq!(g.state().start_amount, start_amount_for(game.balance(), 9));
    assert_eq!(g.stats().reinvestments, 2);

    std::fs::remove_file(&flag).unwrap();
}
