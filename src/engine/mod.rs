//! Controllers that talk to the game: reward claiming, the budgeted buy,
//! the martingale loop and the hourly scheduler.

pub mod buyer;
pub mod claimer;
pub mod gambler;
pub mod scheduler;
