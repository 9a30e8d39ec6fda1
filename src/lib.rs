//! LAYOFFS MARKET: an office betting pool on who gets laid off.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod auth;
pub mod config;
pub mod engine;
pub mod seed;
pub mod storage;
pub mod types;
pub mod uploads;
pub mod web;
