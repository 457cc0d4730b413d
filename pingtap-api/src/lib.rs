//! # PingTap API Server Library
//!
//! HTTP surface of the PingTap broadband portal: customer self-service,
//! admin back office and technician job lists on one axum router.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: environment configuration
//! - `error`: error type and HTTP response mapping
//! - `middleware`: response security headers
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
