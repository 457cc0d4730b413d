//! # PingTap Worker Library
//!
//! Background jobs that run beside the API server.
//!
//! ## Modules
//!
//! - `sweeper`: marks lapsed subscriptions as expired on a fixed interval

pub mod sweeper;
