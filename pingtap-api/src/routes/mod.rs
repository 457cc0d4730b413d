/// API route handlers, one module per resource
///
/// - `health`: liveness and database check
/// - `auth`: register, login, refresh, own profile
/// - `profiles`: admin role management
/// - `plans`: plan catalogue and admin plan management
/// - `coverage`: service-area lookup by pincode
/// - `subscriptions`: purchase, usage, admin extension
/// - `payments`: gateway orders, verification, invoices
/// - `installations`: booking slots and technician jobs
/// - `tickets`: support tickets, conversation, admin dashboard
/// - `webhooks`: gateway events and WhatsApp inbound

pub mod auth;
pub mod coverage;
pub mod health;
pub mod installations;
pub mod payments;
pub mod plans;
pub mod profiles;
pub mod subscriptions;
pub mod tickets;
pub mod webhooks;
