//! Synthetic provider-shaped deliveries for seeding and tests.
//!
//! The generator produces Stripe-shaped webhook events and writes them
//! through the same storage contract the capture endpoint uses. It never
//! goes through HTTP: seeded records are synthesized, not received.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod events;
mod seed;

pub use events::{stripe_headers, synthesize, EVENT_KINDS};
pub use seed::seed;
