//! Carga de configuración de conexión desde variables de entorno.
//!
//! Convenciones:
//! - `DATABASE_URL`; si falta, `DB_SERVER` arma
//!   `postgresql://admin:admin@<server>:5432/sqlalchemy`.
//! - `DATABASE_MIN_CONNECTIONS` (2), `DATABASE_MAX_CONNECTIONS` (16).
//! - `DATABASE_MAX_RETRIES` (5), `DATABASE_RETRY_BACKOFF_MS` (100),
//!   `DATABASE_CONNECT_TIMEOUT_MS` (3000).

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::engine::RetryPolicy;
use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub connect_timeout_ms: u64,
}

impl DbConfig {
    /// Configuración con valores por defecto para `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(),
               min_connections: 2,
               max_connections: 16,
               max_retries: RetryPolicy::default().max_attempts,
               retry_backoff_ms: 100,
               connect_timeout_ms: 3000 }
    }

    pub fn from_env() -> Result<Self, PersistenceError> {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        let url = match (env::var("DATABASE_URL"), env::var("DB_SERVER")) {
            (Ok(url), _) => url,
            (Err(_), Ok(server)) => uri_from_server(&server),
            _ => return Err(PersistenceError::Config("neither DATABASE_URL nor DB_SERVER is set".into())),
        };
        let defaults = Self::new(url);
        Ok(Self { min_connections: env_or("DATABASE_MIN_CONNECTIONS", defaults.min_connections),
                  max_connections: env_or("DATABASE_MAX_CONNECTIONS", defaults.max_connections),
                  max_retries: env_or("DATABASE_MAX_RETRIES", defaults.max_retries),
                  retry_backoff_ms: env_or("DATABASE_RETRY_BACKOFF_MS", defaults.retry_backoff_ms),
                  connect_timeout_ms: env_or("DATABASE_CONNECT_TIMEOUT_MS", defaults.connect_timeout_ms),
                  ..defaults })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy { max_attempts: self.max_retries,
                      backoff: Duration::from_millis(self.retry_backoff_ms) }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// URI por convención a partir del host del servidor.
pub fn uri_from_server(server: &str) -> String {
    format!("postgresql://admin:admin@{server}:5432/sqlalchemy")
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
