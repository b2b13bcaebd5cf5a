//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas y, hacia el core,
//! a `StoreError`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use trace_core::StoreError;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not found")]
    NotFound,
    #[error("serialization conflict (retryable)")]
    SerializationConflict,
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    #[error("unknown component: {0}")]
    UnknownComponent(String),
    #[error("component run {0} already committed")]
    AlreadyCommitted(i64),
    #[error("corrupt row: {0}")]
    CorruptRow(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("max retries hit after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(info.message().to_string()),
                DatabaseErrorKind::SerializationFailure => Self::SerializationConflict,
                DatabaseErrorKind::ClosedConnection => Self::TransientIo(info.message().to_string()),
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            DieselError::RollbackErrorOnCommit { rollback_error, commit_error } => {
                Self::Unknown(format!("rollback={rollback_error}; commit={commit_error}"))
            }
            other => Self::Unknown(format!("unhandled diesel error: {other}")),
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound => StoreError::NotFound("row".into()),
            PersistenceError::UnknownComponent(name) => StoreError::UnknownComponent(name),
            PersistenceError::AlreadyCommitted(id) => StoreError::Conflict(format!("component run {id} already committed")),
            PersistenceError::UniqueViolation(msg) => StoreError::Conflict(msg),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_store_error() {
        assert_eq!(StoreError::from(PersistenceError::UnknownComponent("x".into())),
                   StoreError::UnknownComponent("x".into()));
        assert!(matches!(StoreError::from(PersistenceError::AlreadyCommitted(3)), StoreError::Conflict(_)));
        assert!(matches!(StoreError::from(PersistenceError::TransientIo("t".into())), StoreError::Backend(_)));
        assert_eq!(StoreError::from(PersistenceError::from(DieselError::NotFound)), StoreError::NotFound("row".into()));
    }
}
