//! End-to-end tests: catalog tooling, wagers and settlement through the
//! library API and through the HTTP router.

mod http_api;
mod market_flow;
mod support;
