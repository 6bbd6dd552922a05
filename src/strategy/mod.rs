//! Pure decision logic: yield projection, buy sizing and the martingale
//! staking ladder. Everything here is free of I/O.

pub mod martingale;
pub mod sizing;
pub mod yields;
