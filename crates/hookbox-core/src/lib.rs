//! Core domain types and storage engine for the hookbox capture service.
//!
//! This crate owns the record model, the append-only storage contract, and
//! the cursor codec used for pagination. It knows nothing about HTTP; the
//! API crate maps its types onto the wire.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cursor;
pub mod error;
pub mod models;
pub mod storage;

pub use cursor::Cursor;
pub use error::{CoreError, Result};
pub use models::{ListFilter, NewRecord, Page, RecordId, WebhookRecord};
pub use storage::{memory::MemoryStore, postgres::PostgresStore, RecordStore};
