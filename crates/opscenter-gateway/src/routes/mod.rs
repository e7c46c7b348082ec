//! HTTP handlers, one module per area.
//!
//! Every handler opens its request's audit event first and closes it through
//! [`AppState::finish`](crate::state::AppState::finish), so each request is
//! recorded exactly once whatever the outcome.

pub mod audit;
pub mod docs;
pub mod finance;
pub mod gcs;
pub mod system;
