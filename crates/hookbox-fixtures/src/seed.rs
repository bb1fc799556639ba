//! Seeding through the storage engine's insert contract.

use std::collections::HashMap;

use hookbox_core::{RecordId, RecordStore, Result};
use rand::{rngs::SmallRng, seq::SliceRandom};
use tracing::info;

use crate::events::{synthesize, EVENT_KINDS};

/// Inserts `count` synthetic deliveries directly through the store.
///
/// Each record gets a random event kind from the catalogue. The capture
/// endpoint is bypassed on purpose: seeded records are synthesized, not
/// received over the wire, and the store assigns ids and timestamps the
/// same way it does for live traffic.
pub async fn seed(
    store: &dyn RecordStore,
    count: usize,
    rng: &mut SmallRng,
) -> Result<Vec<RecordId>> {
    let mut ids = Vec::with_capacity(count);
    let mut per_kind: HashMap<&str, usize> = HashMap::new();

    for _ in 0..count {
        let kind = EVENT_KINDS.choose(rng).copied().unwrap_or("invoice.created");
        let record = store.insert(synthesize(kind, rng)).await?;
        *per_kind.entry(kind).or_default() += 1;
        ids.push(record.id);
    }

    info!(records = ids.len(), kinds = per_kind.len(), "seeded synthetic deliveries");
    Ok(ids)
}
