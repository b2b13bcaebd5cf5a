//! Creación del engine (pool de conexiones) con reintentos.
//!
//! La fábrica de conexiones se inyecta (`ConnectionFactory`) para poder
//! probar la política de reintentos sin base de datos. Todos los errores de
//! la fábrica se tratan igual: se reintenta hasta agotar `max_attempts`.

use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use log::{debug, error, warn};

use crate::config::DbConfig;
use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Fábrica de engines/conexiones a partir de una URI.
pub trait ConnectionFactory {
    type Handle;

    fn create(&self, uri: &str) -> Result<Self::Handle, PersistenceError>;
}

/// Política de reintentos: `max_attempts` intentos con backoff lineal
/// (`backoff * n` tras el intento `n`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5,
               backoff: Duration::from_millis(100) }
    }
}

impl RetryPolicy {
    /// Sin espera entre intentos (tests).
    pub fn immediate(max_attempts: u32) -> Self {
        Self { max_attempts,
               backoff: Duration::ZERO }
    }

    /// Satura en `Duration::MAX` si el backoff configurado desborda.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.checked_mul(attempt).unwrap_or(Duration::MAX)
    }
}

/// Intenta `factory.create(uri)` hasta `policy.max_attempts` veces (mínimo
/// una). Devuelve el primer handle exitoso o `RetriesExhausted` con el último
/// error observado.
pub fn create_with_retry<F>(factory: &F, uri: &str, policy: &RetryPolicy) -> Result<F::Handle, PersistenceError>
    where F: ConnectionFactory + ?Sized
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();
    for attempt in 1..=max_attempts {
        match factory.create(uri) {
            Ok(handle) => {
                debug!("create_with_retry:done attempt={attempt}");
                return Ok(handle);
            }
            Err(e) => {
                last_error = e.to_string();
                if attempt < max_attempts {
                    let delay = policy.delay_for(attempt);
                    warn!("engine creation failed (attempt {attempt}/{max_attempts}): {e} -> sleeping {}ms",
                          delay.as_millis());
                    std::thread::sleep(delay);
                }
            }
        }
    }
    error!("max retries hit creating engine after {max_attempts} attempts: {last_error}");
    Err(PersistenceError::RetriesExhausted { attempts: max_attempts,
                                             last_error })
}

/// Fábrica real: construye un pool r2d2 y corre las migraciones pendientes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolFactory {
    pub min_connections: u32,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl PoolFactory {
    pub fn from_config(cfg: &DbConfig) -> Self {
        Self { min_connections: cfg.min_connections,
               max_connections: cfg.max_connections,
               connect_timeout: cfg.connect_timeout() }
    }
}

impl ConnectionFactory for PoolFactory {
    type Handle = PgPool;

    fn create(&self, uri: &str) -> Result<PgPool, PersistenceError> {
        build_pool(uri, self.min_connections, self.max_connections, self.connect_timeout)
    }
}

/// Construye un pool Postgres r2d2 a partir de URL.
///
/// - Tamaños en cero se ajustan a 1; si `min > max` se usa `min = max`.
/// - Ejecuta migraciones con la primera conexión.
/// - Errores del pool/manager se devuelven como `TransientIo`.
pub fn build_pool(database_url: &str,
                  min_size: u32,
                  max_size: u32,
                  connect_timeout: Duration)
                  -> Result<PgPool, PersistenceError> {
    let validated_min = min_size.max(1);
    let validated_max = max_size.max(1);
    if validated_min > validated_max {
        warn!("min_size > max_size ({validated_min} > {validated_max}), ajustando min=max");
    }
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(validated_min.min(validated_max)))
                                    .max_size(validated_max)
                                    .connection_timeout(connect_timeout)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_backoff() {
        let policy = RetryPolicy { max_attempts: 5,
                                   backoff: Duration::from_millis(10) };
        assert_eq!(policy.delay_for(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for(3), Duration::from_millis(30));
        assert_eq!(RetryPolicy::default().max_attempts, 5);
    }

    #[test]
    fn huge_backoff_saturates_instead_of_panicking() {
        let policy = DbConfig { retry_backoff_ms: u64::MAX,
                                ..DbConfig::new("postgres://x") }.retry_policy();
        assert_eq!(policy.delay_for(4), Duration::MAX);
    }

    #[test]
    fn pool_factory_takes_sizes_from_config() {
        let cfg = DbConfig { min_connections: 1,
                             max_connections: 4,
                             connect_timeout_ms: 250,
                             ..DbConfig::new("postgres://x") };
        let f = PoolFactory::from_config(&cfg);
        assert_eq!(f.max_connections, 4);
        assert_eq!(f.connect_timeout, Duration::from_millis(250));
    }
}
