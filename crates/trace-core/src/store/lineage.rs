//! Recorrido de linaje sobre cualquier `LineageStore`.
//!
//! Se implementa una sola vez sobre el trait (no por backend) para que el
//! resultado sea idéntico en memoria y en Postgres.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::LineageStore;
use crate::errors::StoreError;
use crate::model::{ComponentRun, IOPointer};

/// Run alcanzado durante el recorrido y su distancia al pointer de origen
/// (0 = productor directo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub depth: usize,
    pub run: ComponentRun,
}

/// Recorre en anchura desde el productor de `pointer` hacia sus
/// dependencias. Cada run aparece una sola vez, a su menor profundidad.
/// `max_depth = Some(0)` devuelve sólo el productor directo.
pub fn trace<S>(store: &S, pointer: &IOPointer, max_depth: Option<usize>) -> Result<Vec<TraceEntry>, StoreError>
    where S: LineageStore + ?Sized
{
    let mut entries = Vec::new();
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::new();
    if let Some(id) = store.producer_of(pointer)? {
        queue.push_back((id, 0usize));
    }
    while let Some((id, depth)) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        let run = store.get_run(id)?
                       .ok_or_else(|| StoreError::NotFound(format!("component run {id}")))?;
        if max_depth.map_or(true, |max| depth < max) {
            queue.extend(run.dependencies.iter().map(|dep| (*dep, depth + 1)));
        }
        entries.push(TraceEntry { depth, run });
    }
    Ok(entries)
}
