//! Yield projection.
//!
//! Turns the price impact of one buy into a projected yield over longer
//! horizons, assuming the buy repeats once per hour. No compounding.

use std::time::Duration;

pub const HOUR: Duration = Duration::from_secs(60 * 60);
pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);
pub const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const MONTH: Duration = Duration::from_secs(30 * 24 * 60 * 60);
pub const YEAR: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Projected yield in percent per horizon. `None` when unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct YieldProjection {
    pub daily: Option<f64>,
    pub weekly: Option<f64>,
    pub monthly: Option<f64>,
    pub annual: Option<f64>,
}

impl YieldProjection {
    /// Project all four horizons from a single price impact.
    pub fn from_price_impact(price_impact_pct: Option<f64>) -> Self {
        Self {
            daily: project_yield(price_impact_pct, DAY),
            weekly: project_yield(price_impact_pct, WEEK),
            monthly: project_yield(price_impact_pct, MONTH),
            annual: project_yield(price_impact_pct, YEAR),
        }
    }
}

/// `price_impact_pct × (period / 1h)`.
///
/// Returns `None` if the impact is absent or not finite. `period` is one
/// of the constants above in practice, all at least an hour long.
pub fn project_yield(price_impact_pct: Option<f64>, period: Duration) -> Option<f64> {
    let impact = price_impact_pct.filter(|p| p.is_finite())?;
    let buys_per_period = period.as_millis() as f64 / HOUR.as_millis() as f64;
    Some(impact * buys_per_period)
}
