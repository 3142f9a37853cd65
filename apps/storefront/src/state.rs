//! # Application State
//!
//! Everything a command needs, built once at startup.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         AppState                                        │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │   Database   │  │ ServerCartStore  │  │  LocalCartStore  │          │
//! │  │  (SQLite     │  │  cart_items      │  │  Mutex<HashMap<  │          │
//! │  │   pool)      │  │  keyed by user   │  │   session, Cart>>│          │
//! │  └──────┬───────┘  └────────┬─────────┘  └────────┬─────────┘          │
//! │         │                   │                     │                     │
//! │         │    cart_for(Identity::User(..)) ────────┘ (server)           │
//! │         │    cart_for(Identity::Guest(..)) ───────┘ (local)            │
//! │         │                                                               │
//! │         └──► discounts() ──► DiscountResolver(promotions, coupons)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use sweets_db::Database;

use crate::config::StorefrontConfig;
use crate::services::{CartReconciler, DiscountResolver};
use crate::store::{LocalCartStore, ServerCartStore};

/// Who a cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Identity {
    /// Authenticated user id.
    User(String),
    /// Anonymous browser session id.
    Guest(String),
}

impl Identity {
    pub fn key(&self) -> &str {
        match self {
            Identity::User(id) | Identity::Guest(id) => id,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest(_))
    }
}

pub struct AppState {
    db: Database,
    server_carts: ServerCartStore,
    guest_carts: LocalCartStore,
    config: StorefrontConfig,
}

impl AppState {
    pub fn new(db: Database, config: StorefrontConfig) -> Self {
        AppState {
            server_carts: ServerCartStore::new(db.clone()),
            guest_carts: LocalCartStore::new(),
            db,
            config,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn guest_carts(&self) -> &LocalCartStore {
        &self.guest_carts
    }

    /// Cart operations routed to the store matching `identity`.
    pub fn cart_for(&self, identity: &Identity) -> CartReconciler<'_> {
        match identity {
            Identity::User(id) => CartReconciler::new(&self.db, &self.server_carts, id.as_str()),
            Identity::Guest(id) => CartReconciler::new(&self.db, &self.guest_carts, id.as_str()),
        }
    }

    pub fn discounts(&self) -> DiscountResolver<'_> {
        DiscountResolver::new(&self.db, &self.db)
    }
}
