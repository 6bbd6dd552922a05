//! RUGBOT: reward claimer, budgeted buyer and coin-flip martingale
//!
//! Entry point. Loads configuration, initialises structured logging and
//! runs one of: a single claim+buy cycle, the same cycle hourly
//! (`--every-hour`), or the betting loop (`--gamble`).

use anyhow::Result;
use tracing::{error, info, warn};

use rugbot::api::rugplay::RugplayClient;
use rugbot::config::{self, AppConfig, RunFlags};
use rugbot::engine::{buyer, gambler, scheduler};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("RUGBOT_CONFIG")
        .unwrap_or_else(|_| config::DEFAULT_CONFIG_FILE.to_string());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    let flags = RunFlags::from_args(std::env::args().skip(1));
    let buy_enabled = flags.enable_buy || cfg.buy.enabled;

    info!(
        base_url = %cfg.api.base_url,
        symbol = %cfg.buy.symbol,
        gamble = flags.gamble,
        every_hour = flags.every_hour,
        buy_enabled,
        "RUGBOT starting up"
    );
    if cfg.api.session_token.is_none() {
        warn!("SESSION_TOKEN is not set, authenticated calls will be rejected");
    }

    let client = RugplayClient::new(&cfg.api)?;
    let api = &client;
    let cfg = &cfg;

    let result = if flags.gamble {
        gambler::run_gamble(api, cfg).await
    } else if flags.every_hour {
        scheduler::run_hourly(move || buyer::run_buy_cycle(api, cfg, buy_enabled)).await
    } else {
        buyer::run_buy_cycle(api, cfg, buy_enabled).await
    };

    if let Err(e) = result {
        error!(error = %format!("{e:#}"), "RUGBOT stopped on error");
        std::process::exit(1);
    }

    info!("RUGBOT finished.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rugbot=info"));

    let json_logging = std::env::var("RUGBOT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
