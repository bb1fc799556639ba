//! hookbox HTTP API: capture and query surface over the record store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;

use std::{sync::Arc, time::Duration};

use hookbox_core::RecordStore;

pub use config::Config;
pub use error::ApiError;
pub use server::{create_router, start_server};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Storage engine. All mutation flows through its insert.
    pub store: Arc<dyn RecordStore>,
    /// Ceiling on captured body size in bytes.
    pub max_body_bytes: usize,
    /// Bound on the durability wait before a capture is acknowledged.
    pub capture_timeout: Duration,
    /// Whole-request timeout applied by the middleware stack.
    pub request_timeout: Duration,
}

impl AppState {
    /// Builds state from configuration and a storage backend.
    pub fn new(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self {
            store,
            max_body_bytes: config.max_body_bytes,
            capture_timeout: Duration::from_millis(config.capture_timeout_ms),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}
