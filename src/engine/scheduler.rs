//! Hourly scheduler.
//!
//! Runs a job now, then once in each following clock hour at a freshly
//! randomized minute. The delay to the next slot is computed by a pure
//! function so the driving loop stays trivial.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::info;

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Time from `now` until `minute:00` of the next clock hour.
///
/// Consecutive runs therefore never share an hour. The delay lies in
/// `(0, 2h)`; `minute` is taken modulo 60.
pub fn next_run_delay(now: DateTime<Utc>, minute: u32) -> Duration {
    let into_hour_ms = now.timestamp_millis().rem_euclid(HOUR_MS);
    let target_ms = i64::from(minute % 60) * 60_000;
    Duration::from_millis((HOUR_MS - into_hour_ms + target_ms) as u64)
}

fn random_minute() -> u32 {
    rand::thread_rng().gen_range(0..60)
}

/// Run `job` immediately and then hourly until Ctrl+C.
///
/// A failing job ends the schedule and its error is returned.
pub async fn run_hourly<F, Fut>(mut job: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        job().await?;

        let minute = random_minute();
        let delay = next_run_delay(Utc::now(), minute);
        info!(minute, delay_secs = delay.as_secs(), "Next cycle scheduled");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                return Ok(());
            }
        }
    }
}
