//! Reward claimer.
//!
//! Claims the periodic reward and reports how long until the next one.
//! Never fails: any problem is logged and the 12-hour fallback is used.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};

use crate::api::GameApi;
use crate::types::ClaimResponse;

/// Cooldown assumed when the service does not tell us.
pub const FALLBACK_COOLDOWN: Duration = Duration::from_secs(12 * 60 * 60);

/// Cooldown reported by a claim response, if any.
///
/// Prefers the millisecond countdown; falls back to the absolute
/// `nextClaimTime` relative to `now`.
pub fn cooldown_from_response(resp: &ClaimResponse, now: DateTime<Utc>) -> Option<Duration> {
    if let Some(ms) = resp.time_remaining {
        return Some(Duration::from_millis(ms.max(0) as u64));
    }
    resp.next_claim_time
        .map(|next| (next - now).to_std().unwrap_or(Duration::ZERO))
}

/// Claim the reward and return the cooldown until the next claim.
pub async fn claim_cooldown(api: &dyn GameApi) -> Duration {
    match api.claim_reward().await {
        Ok(resp) => {
            let cooldown = cooldown_from_response(&resp, Utc::now());
            info!(
                reward = ?resp.reward_amount,
                streak = ?resp.login_streak,
                cooldown_secs = ?cooldown.map(|c| c.as_secs()),
                "Reward claim answered"
            );
            cooldown.unwrap_or_else(|| {
                warn!("Claim response carried no cooldown, assuming 12h");
                FALLBACK_COOLDOWN
            })
        }
        Err(e) => {
            warn!(error = %e, "Reward claim failed, assuming 12h cooldown");
            FALLBACK_COOLDOWN
        }
    }
}
