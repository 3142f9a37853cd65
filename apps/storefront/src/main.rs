//! # Storefront Bootstrap
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Storefront Startup                                │
//! │                                                                         │
//! │  1. Load Configuration ───────────────────────────────────────────────► │
//! │     • STOREFRONT_* environment variables, defaults otherwise            │
//! │                                                                         │
//! │  2. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter (RUST_LOG overrides)           │
//! │                                                                         │
//! │  3. Connect to Database ──────────────────────────────────────────────► │
//! │     • SQLite with WAL mode                                              │
//! │     • Run pending migrations                                            │
//! │                                                                         │
//! │  4. Build AppState ───────────────────────────────────────────────────► │
//! │     • Server cart store, guest cart store, discount lookups             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The HTTP layer mounts on `AppState`; this binary prepares and verifies it.

use tracing::{info, warn};

use sweets_db::Database;
use sweets_storefront::config::StorefrontConfig;
use sweets_storefront::init_tracing;
use sweets_storefront::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    init_tracing(&config.log_filter);

    info!(store = %config.store_name, "Starting storefront");

    if let Some(dir) = config.db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    info!(db_path = ?config.db_path, "Database path determined");

    let db = Database::new(config.db_config()).await?;

    let migrations = db.migration_status().await?;
    info!(
        applied = migrations.applied,
        total = migrations.total,
        "Database connected and migrations applied"
    );

    if !db.health_check().await {
        warn!("Database health check failed");
        return Err("database health check failed".into());
    }

    let products = db.products().count_active().await?;
    let promotions = db.promotions().list().await?.len();
    info!(products, promotions, "Catalog loaded");

    let state = AppState::new(db, config);
    info!(store = %state.config().store_name, "Storefront ready");

    state.db().close().await;
    Ok(())
}
