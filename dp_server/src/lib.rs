//! HTTP front end for the Dojo Pool tournament bracket engine.
//!
//! - [`api`]: Router, handlers and middleware
//! - [`config`]: Environment and CLI configuration
//! - [`logging`]: Structured logging setup and event helpers
//! - [`metrics`]: Prometheus metrics

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
