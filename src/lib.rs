//! mltrace-rust
//!
//! Fachada del workspace:
//! - Reexporta `trace-core` (modelo, envoltura de funciones, tests, store en
//!   memoria) y `trace-persistence` (backend Postgres).
//! - `open_store_from_env` elige backend según la configuración disponible.
//!
//! Puede usarse desde `main.rs` o por otros crates/clientes.

pub use trace_core::*;
pub use trace_core::component_test;

pub mod persistence {
    pub use trace_persistence::*;
}

use log::{info, warn};
use trace_persistence::{DbConfig, PersistenceError, PgLineageStore};

/// Store Postgres si hay configuración (`DATABASE_URL` / `DB_SERVER`), o
/// en memoria si no la hay. Un servidor configurado pero inalcanzable es
/// error (no se degrada en silencio).
pub fn open_store_from_env() -> Result<Box<dyn LineageStore>, PersistenceError> {
    trace_persistence::init_dotenv();
    match DbConfig::from_env() {
        Ok(cfg) => {
            info!("using postgres lineage store (max_retries={})", cfg.max_retries);
            Ok(Box::new(PgLineageStore::connect(&cfg)?))
        }
        Err(PersistenceError::Config(reason)) => {
            warn!("{reason}; falling back to in-memory lineage store");
            Ok(Box::new(InMemoryLineageStore::new()))
        }
        Err(e) => Err(e),
    }
}
