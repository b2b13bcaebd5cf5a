//! trace-persistence
//!
//! Backend Postgres (Diesel) del `LineageStore` definido en `trace-core`,
//! más la creación del engine con reintentos, configuración y migraciones.
//!
//! Módulos:
//! - `pg`: `PgLineageStore` y proveedores de conexión.
//! - `engine`: `ConnectionFactory`, `RetryPolicy`, `create_with_retry`, pool.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env / entorno.
//! - `schema`: tablas Diesel declaradas para compilar queries.

pub mod config;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use engine::{build_pool, create_with_retry, ConnectionFactory, PgPool, PoolFactory, RetryPolicy};
pub use error::PersistenceError;
pub use pg::{build_dev_store_from_env, ConnectionProvider, PgLineageStore, PoolProvider};
