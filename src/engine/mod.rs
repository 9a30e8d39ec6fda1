//! Core engine: placing wagers and settling them when a layoff lands.

pub mod settlement;
pub mod wager;

pub use settlement::{Payout, SettlementEngine, SettlementReport};
pub use wager::WagerService;
