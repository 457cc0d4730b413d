//! # PingTap Shared Library
//!
//! Domain types, persistence and integrations shared by the PingTap API
//! server and the background worker.
//!
//! ## Module Organization
//!
//! - `models`: database rows and their queries
//! - `db`: connection pool, migrations, default data
//! - `auth`: passwords, tokens, middleware, authorization checks
//! - `billing`: billing-period and money arithmetic
//! - `payments`: gateway client, signatures, webhooks, payment event log
//! - `notify`: WhatsApp notifications
//! - `coverage`: service availability lookup
//! - `invoice`: invoice documents derived from payments

pub mod auth;
pub mod billing;
pub mod coverage;
pub mod db;
pub mod invoice;
pub mod models;
pub mod notify;
pub mod payments;

/// Current version of the PingTap shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
