//! Integration test harness.

mod betting_session;
mod mock_game;
