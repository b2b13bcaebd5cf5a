//! trace-core: linaje y trazado de ejecuciones de componentes de pipelines ML.
//!
//! Módulos:
//! - `model`: `Component`, `ComponentRun`, `IOPointer` y anotaciones.
//! - `instrument`: `RunContext` y `TracedFn` (envoltura de funciones).
//! - `testing`: tests posteriores a la ejecución y su descubrimiento.
//! - `store`: trait `LineageStore`, backend en memoria y recorrido de linaje.
//! - `hashing`: JSON canónico + blake3 para identificar valores capturados.

pub mod constants;
pub mod errors;
pub mod hashing;
pub mod instrument;
pub mod model;
pub mod store;
pub mod testing;

pub use errors::{RunError, StoreError, TestFailure};
pub use instrument::{CapturedVars, RunContext, TracedCall, TracedFn};
pub use model::{Component, ComponentRecord, ComponentRun, DeletedLabel, IOPointer, PointerType, RunStatus, TestFactory};
pub use store::{trace, InMemoryLineageStore, LineageStore, TraceEntry};
pub use testing::{discover, is_test_method, run_after_tests, CheckResult, ComponentTest, TestMethod};
