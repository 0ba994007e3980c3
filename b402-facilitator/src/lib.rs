//! B402 facilitator HTTP service.
//!
//! Exposes the gasless payment API over axum: `/verify` checks an off-chain
//! EIP-712 payment authorization (signature, replay state, validity window),
//! `/settle` relays it on-chain through the B402 relayer contract with the
//! facilitator paying gas. Informational endpoints (`/`, `/list`, `/health`,
//! `/metrics`) describe the deployment and expose Prometheus metrics.
//!
//! # Modules
//!
//! - [`config`] — Environment-sourced configuration, resolved once at startup
//! - [`local`] — [`local::LocalFacilitator`], the verify/settle composition root
//! - [`handlers`] — Axum route handlers and router builder
//! - [`events`] — Best-effort structured event log sink
//! - [`metrics`] — Prometheus counters, gauges, and histograms
//! - [`util`] — Graceful shutdown signal handling

pub mod config;
pub mod events;
pub mod handlers;
pub mod local;
pub mod metrics;
pub mod util;

pub use config::FacilitatorConfig;
pub use local::LocalFacilitator;
