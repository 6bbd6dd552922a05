//! Persistence layer.
//!
//! The only durable artifact is a small text flag recording that the loan
//! was repaid. It is written once and never read back by the agent.

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::debug;

/// Write the loan-repaid flag to `path`, replacing any previous one.
pub fn write_paid_flag(path: &str, recipient: &str, amount: Decimal) -> Result<()> {
    let contents = format!(
        "paid=true\nrecipient={recipient}\namount={amount}\nat={}\n",
        Utc::now().to_rfc3339()
    );

    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write paid flag to {path}"))?;

    debug!(path, recipient, amount = %amount, "Paid flag written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
