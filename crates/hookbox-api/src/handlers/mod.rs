//! HTTP request handlers.

pub mod capture;
pub mod health;
pub mod query;

pub use capture::capture_delivery;
pub use health::{health_check, liveness_check};
pub use query::{get_record, list_records};
