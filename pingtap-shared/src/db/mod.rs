/// Database layer for PingTap
///
/// # Modules
///
/// - `pool`: connection pool with a startup health check
/// - `migrations`: embedded schema migrations
/// - `seed`: default plan catalogue for fresh installs
///
/// Row types and their queries live in `crate::models`.

pub mod migrations;
pub mod pool;
pub mod seed;
