//! Instrumentación de funciones del pipeline.
//!
//! Sustituye la inspección del frame de la función por un `RunContext`
//! explícito: la función trazada fija ahí sus variables con nombre y el
//! `TracedFn` las captura después de que retorna.

pub mod context;
pub mod traced;

pub use context::{CapturedVars, RunContext};
pub use traced::{TracedCall, TracedFn};
