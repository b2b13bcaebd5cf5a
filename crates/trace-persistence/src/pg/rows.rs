//! Filas Diesel (lectura e inserción) y su conversión al modelo del core.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use trace_core::{IOPointer, PointerType, RunStatus};

use crate::error::PersistenceError;
use crate::schema::{component_run_dependencies, component_runs, components, deleted_labels, io_pointer_labels};

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = components)]
pub struct ComponentRow {
    pub name: String,
    pub description: String,
    pub owner: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = components)]
pub struct NewComponentRow<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub owner: &'a str,
}

/// Fila de `component_runs`. `status` se guarda en minúsculas.
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = component_runs)]
pub struct ComponentRunRow {
    pub id: i64,
    pub component_name: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: String,
}

impl ComponentRunRow {
    pub fn status(&self) -> Result<RunStatus, PersistenceError> {
        self.status.parse().map_err(PersistenceError::CorruptRow)
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = component_runs)]
pub struct NewComponentRunRow<'a> {
    pub component_name: &'a str,
    pub status: &'a str,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = component_run_dependencies)]
pub struct NewDependencyRow {
    pub component_run_id: i64,
    pub depends_on_run_id: i64,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = io_pointer_labels)]
pub struct NewPointerLabelRow<'a> {
    pub io_pointer_id: i64,
    pub label_id: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = deleted_labels)]
pub struct NewDeletedLabelRow<'a> {
    pub label_id: &'a str,
    pub io_pointer_id: i64,
}

/// `(name, pointer_type)` leído de `io_pointers`.
pub fn pointer_from_columns((name, pointer_type): (String, String)) -> Result<IOPointer, PersistenceError> {
    let pointer_type: PointerType = pointer_type.parse().map_err(PersistenceError::CorruptRow)?;
    Ok(IOPointer::new(name, pointer_type))
}
