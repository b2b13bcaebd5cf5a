//! Fachada de persistencia (`LineageStore`) y recorrido de linaje.
//!
//! Backends:
//! - `InMemoryLineageStore`: referencia en memoria (tests, demos).
//! - `trace-persistence::PgLineageStore`: Postgres (Diesel), con paridad de
//!   comportamiento observable respecto a la versión en memoria.

mod lineage;
mod memory;

pub use lineage::{trace, TraceEntry};
pub use memory::InMemoryLineageStore;

use crate::errors::StoreError;
use crate::model::{ComponentRecord, ComponentRun, DeletedLabel, IOPointer, PointerType};

/// Almacenamiento de componentes, runs, pointers y anotaciones.
pub trait LineageStore {
    /// Inserta o actualiza (owner/description) un componente; los tags se
    /// acumulan.
    fn upsert_component(&mut self, component: &ComponentRecord) -> Result<(), StoreError>;

    fn get_component(&self, name: &str) -> Result<Option<ComponentRecord>, StoreError>;

    /// Idempotente: el mismo (name, type) nunca produce dos filas.
    fn upsert_io_pointer(&mut self, name: &str, pointer_type: PointerType) -> Result<IOPointer, StoreError>;

    fn get_io_pointer(&self, name: &str, pointer_type: PointerType) -> Result<Option<IOPointer>, StoreError>;

    /// Inserta el run: crea los pointers ausentes, resuelve dependencias
    /// (último run previo que produjo cada input) y asigna `id` y
    /// `dependencies`. Falla con `UnknownComponent` si el componente no
    /// existe y con `Conflict` si el run ya tiene id.
    fn commit_run(&mut self, run: &mut ComponentRun) -> Result<i64, StoreError>;

    fn get_run(&self, id: i64) -> Result<Option<ComponentRun>, StoreError>;

    /// Runs del componente, del más reciente al más antiguo.
    fn runs_for_component(&self, component_name: &str, limit: usize) -> Result<Vec<ComponentRun>, StoreError>;

    /// Id del run más reciente que tiene a `pointer` como output.
    fn producer_of(&self, pointer: &IOPointer) -> Result<Option<i64>, StoreError>;

    fn add_tags(&mut self, component_name: &str, tags: &[String]) -> Result<(), StoreError>;

    /// Crea el pointer si no existe y le asocia los labels.
    fn add_labels(&mut self, pointer: &IOPointer, labels: &[String]) -> Result<(), StoreError>;

    /// Quita labels del pointer dejando registro en `deleted_labels`.
    /// Devuelve cuántos estaban asociados.
    fn remove_labels(&mut self, pointer: &IOPointer, labels: &[String]) -> Result<usize, StoreError>;

    /// Labels vigentes, ordenados.
    fn labels_for(&self, pointer: &IOPointer) -> Result<Vec<String>, StoreError>;

    fn deleted_labels_for(&self, pointer: &IOPointer) -> Result<Vec<DeletedLabel>, StoreError>;
}
