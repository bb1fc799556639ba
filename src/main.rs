//! hookbox webhook capture service.
//!
//! Entry point: initializes tracing, loads configuration, selects the
//! storage backend, optionally seeds fixture records, and serves HTTP
//! until a shutdown signal arrives.

use std::sync::Arc;

use anyhow::{Context, Result};
use hookbox_api::{AppState, Config};
use hookbox_core::{MemoryStore, PostgresStore, RecordStore};
use rand::{rngs::SmallRng, SeedableRng};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting hookbox webhook capture service");

    let config = Config::load()?;
    info!(
        host = %config.host,
        port = config.port,
        database_url = %config.database_url_masked(),
        max_body_bytes = config.max_body_bytes,
        "Configuration loaded"
    );

    let store: Arc<dyn RecordStore> = match &config.database_url {
        Some(url) => {
            let store =
                PostgresStore::connect(url).await.context("Failed to connect to PostgreSQL")?;
            info!("PostgreSQL record store ready");
            Arc::new(store)
        },
        None => {
            info!("Using in-memory record store; records vanish on restart");
            Arc::new(MemoryStore::new())
        },
    };

    if config.seed_records > 0 {
        let mut rng = SmallRng::from_entropy();
        let ids = hookbox_fixtures::seed(store.as_ref(), config.seed_records, &mut rng)
            .await
            .context("Failed to seed fixture records")?;
        let total = store.count().await.context("Failed to count records after seeding")?;
        info!(seeded = ids.len(), total, "Fixture seeding complete");
    }

    let addr = config.parse_server_addr()?;
    let state = AppState::new(store, &config);

    info!(addr = %addr, "hookbox is ready to capture webhooks");
    hookbox_api::start_server(state, addr).await.context("HTTP server failed")?;

    info!("hookbox shutdown complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,hookbox=debug,tower_http=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer().with_target(true).with_file(true).with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
