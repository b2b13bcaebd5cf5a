//! `ComponentRun`: registro de una ejecución de un componente.
//!
//! Se crea por invocación (estado `Pending`), se finaliza una sola vez y el
//! store le asigna `id` y `dependencies` al hacer commit.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{IOPointer, RunStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRun {
    /// Asignado por el store en `commit_run`.
    pub id: Option<i64>,
    pub component_name: String,
    pub inputs: BTreeSet<IOPointer>,
    pub outputs: BTreeSet<IOPointer>,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: String,
    /// Runs previos que produjeron alguno de los inputs (orden ascendente).
    pub dependencies: Vec<i64>,
}

impl ComponentRun {
    pub fn new(component_name: impl Into<String>) -> Self {
        Self { id: None,
               component_name: component_name.into(),
               inputs: BTreeSet::new(),
               outputs: BTreeSet::new(),
               status: RunStatus::Pending,
               start_time: Utc::now(),
               end_time: None,
               notes: String::new(),
               dependencies: Vec::new() }
    }

    pub fn add_input(&mut self, pointer: IOPointer) {
        self.inputs.insert(pointer);
    }

    pub fn add_inputs<I: IntoIterator<Item = IOPointer>>(&mut self, pointers: I) {
        self.inputs.extend(pointers);
    }

    pub fn add_output(&mut self, pointer: IOPointer) {
        self.outputs.insert(pointer);
    }

    pub fn add_outputs<I: IntoIterator<Item = IOPointer>>(&mut self, pointers: I) {
        self.outputs.extend(pointers);
    }

    pub fn set_end_time(&mut self, ts: DateTime<Utc>) {
        self.end_time = Some(ts);
    }

    /// Fija el estado terminal; completa `end_time` si aún no existe.
    pub fn finish(&mut self, status: RunStatus) {
        self.status = status;
        if self.end_time.is_none() {
            self.end_time = Some(Utc::now());
        }
    }

    pub fn is_committed(&self) -> bool {
        self.id.is_some()
    }

    /// Todos los pointers referenciados (inputs ∪ outputs).
    pub fn pointers(&self) -> impl Iterator<Item = &IOPointer> {
        self.inputs.union(&self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PointerType;

    #[test]
    fn pointers_are_sets() {
        let mut run = ComponentRun::new("clean");
        run.add_input(IOPointer::new("raw.csv", PointerType::Data));
        run.add_input(IOPointer::new("raw.csv", PointerType::Data));
        run.add_output(IOPointer::new("raw.csv", PointerType::Data));
        assert_eq!(run.inputs.len(), 1);
        assert_eq!(run.pointers().count(), 1);
    }

    #[test]
    fn finish_sets_end_time_once() {
        let mut run = ComponentRun::new("clean");
        assert_eq!(run.status, RunStatus::Pending);
        assert!(!run.is_committed());
        let end = run.start_time;
        run.set_end_time(end);
        run.finish(RunStatus::Success);
        assert_eq!(run.end_time, Some(end));
        assert!(run.status.is_terminal());
    }
}
