//! Errores del núcleo de trazado.
//!
//! - `RunError<E>`: resultado fallido de una llamada trazada. El error de la
//!   función envuelta se conserva tal cual en `RunError::Function`.
//! - `TestFailure`: método de test que rechazó los valores capturados.
//! - `StoreError`: error neutral de un backend de `LineageStore`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallo de un método de test ejecutado tras la función trazada.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[error("test `{test}` failed in `{method}`: {message}")]
pub struct TestFailure {
    pub test: String,
    pub method: String,
    pub message: String,
}

/// Errores neutrales de persistencia (independientes del backend).
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StoreError {
    #[error("not found: {0}")] NotFound(String),
    #[error("unknown component: {0}")] UnknownComponent(String),
    #[error("conflict: {0}")] Conflict(String),
    #[error("backend error: {0}")] Backend(String),
}

/// Error de una llamada a `TracedFn::call`.
///
/// Ningún variante deja un `ComponentRun` persistido salvo `Store`, que
/// puede ocurrir a mitad del commit (sin garantías entre runs).
#[derive(Debug, Error)]
pub enum RunError<E> {
    /// La función envuelta devolvió error; se propaga sin modificar.
    #[error("traced function failed: {0}")]
    Function(E),
    /// Una variable declarada en `input_vars`/`output_vars` no fue fijada en el
    /// `RunContext`.
    #[error("variable `{0}` was not set by the traced function")]
    MissingVariable(String),
    #[error(transparent)]
    Test(#[from] TestFailure),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<E> RunError<E> {
    /// Recupera el error original de la función envuelta, si ese fue el fallo.
    pub fn into_function_error(self) -> Option<E> {
        match self {
            RunError::Function(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_function_error(&self) -> bool {
        matches!(self, RunError::Function(_))
    }
}
