//! Implementación Postgres (Diesel) de `LineageStore`.
//!
//! Paridad 1:1 con `InMemoryLineageStore`:
//! - `io_pointers` deduplica por `(name, pointer_type)` (`ON CONFLICT DO
//!   NOTHING` + lectura del id).
//! - `commit_run` es una sola transacción: verifica el componente, crea los
//!   pointers ausentes, resuelve dependencias (último run previo que produjo
//!   cada input), inserta el run y sus asociaciones.
//! - Tags y labels se acumulan; quitar un label escribe en `deleted_labels`.
//! - Errores transitorios se reintentan con `with_retry`.

mod rows;

use std::collections::BTreeSet;

use diesel::dsl::max;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{debug, warn};
use trace_core::{ComponentRecord, ComponentRun, DeletedLabel, IOPointer, LineageStore, PointerType, StoreError};

pub use rows::{ComponentRow, ComponentRunRow};
use rows::{pointer_from_columns, NewComponentRow, NewComponentRunRow, NewDeletedLabelRow, NewDependencyRow,
           NewPointerLabelRow};

use crate::config::{init_dotenv, DbConfig};
use crate::engine::{create_with_retry, PgPool, PoolFactory};
use crate::error::PersistenceError;
use crate::schema::{component_run_dependencies, component_run_input_association, component_run_output_association,
                    component_runs, component_tags, components, deleted_labels, io_pointer_labels, io_pointers, labels,
                    tags};

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real (producción/tests de integración) o uno
/// alternativo sin acoplar el store a r2d2.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}
impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Determina si un error es transitorio (recomendado reintentar con backoff).
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        // Algunos mensajes de driver llegan como Unknown; best-effort por texto.
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("could not serialize access due to concurrent update")
            || m.contains("terminating connection due to administrator command")
            || m.contains("connection closed")
            || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Retry simple con backoff lineal pequeño (hasta 3 reintentos: 15ms, 30ms,
/// 45ms). Sólo repite la unidad de trabajo provista por `f`.
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms",
                      attempts + 1,
                      e,
                      delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

fn find_pointer_id(conn: &mut PgConnection, pointer: &IOPointer) -> QueryResult<Option<i64>> {
    io_pointers::table.filter(io_pointers::name.eq(&pointer.name))
                      .filter(io_pointers::pointer_type.eq(pointer.pointer_type.as_str()))
                      .select(io_pointers::id)
                      .first::<i64>(conn)
                      .optional()
}

fn ensure_pointer(conn: &mut PgConnection, pointer: &IOPointer) -> QueryResult<i64> {
    diesel::insert_into(io_pointers::table).values((io_pointers::name.eq(&pointer.name),
                                                    io_pointers::pointer_type.eq(pointer.pointer_type.as_str())))
                                           .on_conflict((io_pointers::name, io_pointers::pointer_type))
                                           .do_nothing()
                                           .execute(conn)?;
    find_pointer_id(conn, pointer)?.ok_or(diesel::result::Error::NotFound)
}

fn latest_producer(conn: &mut PgConnection, pointer_id: i64) -> QueryResult<Option<i64>> {
    component_run_output_association::table
        .filter(component_run_output_association::io_pointer_id.eq(pointer_id))
        .select(max(component_run_output_association::component_run_id))
        .first::<Option<i64>>(conn)
}

fn component_exists(conn: &mut PgConnection, name: &str) -> QueryResult<bool> {
    components::table.find(name)
                     .select(components::name)
                     .first::<String>(conn)
                     .optional()
                     .map(|found| found.is_some())
}

fn insert_tags(conn: &mut PgConnection, component_name: &str, new_tags: &[String]) -> QueryResult<()> {
    if new_tags.is_empty() {
        return Ok(());
    }
    let tag_rows: Vec<_> = new_tags.iter().map(|t| tags::name.eq(t.as_str())).collect();
    diesel::insert_into(tags::table).values(tag_rows).on_conflict_do_nothing().execute(conn)?;
    let links: Vec<_> = new_tags.iter()
                                .map(|t| {
                                    (component_tags::component_name.eq(component_name),
                                     component_tags::tag_name.eq(t.as_str()))
                                })
                                .collect();
    diesel::insert_into(component_tags::table).values(links).on_conflict_do_nothing().execute(conn)?;
    Ok(())
}

fn load_inputs(conn: &mut PgConnection, run_id: i64) -> Result<BTreeSet<IOPointer>, PersistenceError> {
    let cols: Vec<(String, String)> =
        component_run_input_association::table.inner_join(io_pointers::table)
                                              .filter(component_run_input_association::component_run_id.eq(run_id))
                                              .select((io_pointers::name, io_pointers::pointer_type))
                                              .load(conn)?;
    cols.into_iter().map(pointer_from_columns).collect()
}

fn load_outputs(conn: &mut PgConnection, run_id: i64) -> Result<BTreeSet<IOPointer>, PersistenceError> {
    let cols: Vec<(String, String)> =
        component_run_output_association::table.inner_join(io_pointers::table)
                                               .filter(component_run_output_association::component_run_id.eq(run_id))
                                               .select((io_pointers::name, io_pointers::pointer_type))
                                               .load(conn)?;
    cols.into_iter().map(pointer_from_columns).collect()
}

/// Reconstruye un `ComponentRun` completo (pointers y dependencias).
fn hydrate(conn: &mut PgConnection, row: ComponentRunRow) -> Result<ComponentRun, PersistenceError> {
    let status = row.status()?;
    let inputs = load_inputs(conn, row.id)?;
    let outputs = load_outputs(conn, row.id)?;
    let dependencies: Vec<i64> =
        component_run_dependencies::table.filter(component_run_dependencies::component_run_id.eq(row.id))
                                         .select(component_run_dependencies::depends_on_run_id)
                                         .order(component_run_dependencies::depends_on_run_id.asc())
                                         .load(conn)?;
    Ok(ComponentRun { id: Some(row.id),
                      component_name: row.component_name,
                      inputs,
                      outputs,
                      status,
                      start_time: row.start_time,
                      end_time: row.end_time,
                      notes: row.notes,
                      dependencies })
}

/// Inserta el run dentro de una transacción; devuelve `(id, dependencies)`.
fn insert_run(conn: &mut PgConnection, run: &ComponentRun) -> Result<(i64, Vec<i64>), PersistenceError> {
    conn.build_transaction().read_write().run(|tx| {
                                             if !component_exists(tx, &run.component_name)? {
                                                 return Err(PersistenceError::UnknownComponent(run.component_name
                                                                                                  .clone()));
                                             }
                                             let mut input_ids = Vec::with_capacity(run.inputs.len());
                                             for p in &run.inputs {
                                                 input_ids.push(ensure_pointer(tx, p)?);
                                             }
                                             let mut output_ids = Vec::with_capacity(run.outputs.len());
                                             for p in &run.outputs {
                                                 output_ids.push(ensure_pointer(tx, p)?);
                                             }
                                             // El run aún no existe: todo productor encontrado es previo.
                                             let mut deps = BTreeSet::new();
                                             for pid in &input_ids {
                                                 if let Some(producer) = latest_producer(tx, *pid)? {
                                                     deps.insert(producer);
                                                 }
                                             }

                                             let row = NewComponentRunRow { component_name: &run.component_name,
                                                                            status: run.status.as_str(),
                                                                            start_time: run.start_time,
                                                                            end_time: run.end_time,
                                                                            notes: &run.notes };
                                             let id: i64 = diesel::insert_into(component_runs::table)
                                                 .values(&row)
                                                 .returning(component_runs::id)
                                                 .get_result(tx)?;

                                             if !input_ids.is_empty() {
                                                 let assoc: Vec<_> = input_ids.iter()
                                                     .map(|pid| {
                                                         (component_run_input_association::component_run_id.eq(id),
                                                          component_run_input_association::io_pointer_id.eq(*pid))
                                                     })
                                                     .collect();
                                                 diesel::insert_into(component_run_input_association::table)
                                                     .values(assoc)
                                                     .execute(tx)?;
                                             }
                                             if !output_ids.is_empty() {
                                                 let assoc: Vec<_> = output_ids.iter()
                                                     .map(|pid| {
                                                         (component_run_output_association::component_run_id.eq(id),
                                                          component_run_output_association::io_pointer_id.eq(*pid))
                                                     })
                                                     .collect();
                                                 diesel::insert_into(component_run_output_association::table)
                                                     .values(assoc)
                                                     .execute(tx)?;
                                             }
                                             let deps: Vec<i64> = deps.into_iter().collect();
                                             if !deps.is_empty() {
                                                 let dep_rows: Vec<NewDependencyRow> =
                                                     deps.iter()
                                                         .map(|d| NewDependencyRow { component_run_id: id,
                                                                                     depends_on_run_id: *d })
                                                         .collect();
                                                 diesel::insert_into(component_run_dependencies::table)
                                                     .values(&dep_rows)
                                                     .execute(tx)?;
                                             }
                                             Ok((id, deps))
                                         })
}

/// Implementación Postgres de `LineageStore`.
pub struct PgLineageStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgLineageStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Ejecuta `f` con una conexión del provider, reintentando fallos
    /// transitorios.
    fn with_conn<T, F>(&self, mut f: F) -> Result<T, PersistenceError>
        where F: FnMut(&mut PgConnection) -> Result<T, PersistenceError>
    {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            f(&mut *conn)
        })
    }
}

impl PgLineageStore<PoolProvider> {
    /// Crea el pool con la política de reintentos de `cfg` (migraciones
    /// incluidas).
    pub fn connect(cfg: &DbConfig) -> Result<Self, PersistenceError> {
        let factory = PoolFactory::from_config(cfg);
        let pool = create_with_retry(&factory, &cfg.url, &cfg.retry_policy())?;
        Ok(Self::new(PoolProvider { pool }))
    }
}

impl<P: ConnectionProvider> LineageStore for PgLineageStore<P> {
    fn upsert_component(&mut self, component: &ComponentRecord) -> Result<(), StoreError> {
        debug!("upsert_component:start name={}", component.name);
        self.with_conn(|conn| {
                let row = NewComponentRow { name: &component.name,
                                            description: &component.description,
                                            owner: &component.owner };
                conn.build_transaction().read_write().run(|tx| {
                                                         diesel::insert_into(components::table)
                                                             .values(&row)
                                                             .on_conflict(components::name)
                                                             .do_update()
                                                             .set((components::description.eq(row.description),
                                                                   components::owner.eq(row.owner)))
                                                             .execute(tx)?;
                                                         insert_tags(tx, row.name, &component.tags)?;
                                                         Ok::<(), PersistenceError>(())
                                                     })
            })
            .map_err(StoreError::from)
    }

    fn get_component(&self, name: &str) -> Result<Option<ComponentRecord>, StoreError> {
        self.with_conn(|conn| {
                let Some(row) = components::table.find(name)
                                                 .select(ComponentRow::as_select())
                                                 .first(conn)
                                                 .optional()?
                else {
                    return Ok(None);
                };
                let tag_names: Vec<String> = component_tags::table.filter(component_tags::component_name.eq(name))
                                                                  .select(component_tags::tag_name)
                                                                  .order(component_tags::tag_name.asc())
                                                                  .load(conn)?;
                Ok(Some(ComponentRecord { name: row.name,
                                          description: row.description,
                                          owner: row.owner,
                                          tags: tag_names }))
            })
            .map_err(StoreError::from)
    }

    fn upsert_io_pointer(&mut self, name: &str, pointer_type: PointerType) -> Result<IOPointer, StoreError> {
        let pointer = IOPointer::new(name, pointer_type);
        self.with_conn(|conn| Ok(ensure_pointer(conn, &pointer)?))
            .map_err(StoreError::from)?;
        Ok(pointer)
    }

    fn get_io_pointer(&self, name: &str, pointer_type: PointerType) -> Result<Option<IOPointer>, StoreError> {
        let pointer = IOPointer::new(name, pointer_type);
        let found = self.with_conn(|conn| Ok(find_pointer_id(conn, &pointer)?))
                        .map_err(StoreError::from)?;
        Ok(found.map(|_| pointer))
    }

    fn commit_run(&mut self, run: &mut ComponentRun) -> Result<i64, StoreError> {
        if let Some(id) = run.id {
            return Err(PersistenceError::AlreadyCommitted(id).into());
        }
        debug!("commit_run:start component={} inputs={} outputs={}",
               run.component_name,
               run.inputs.len(),
               run.outputs.len());
        let snapshot: &ComponentRun = run;
        let (id, deps) = self.with_conn(|conn| insert_run(conn, snapshot))
                             .map_err(StoreError::from)?;
        run.id = Some(id);
        run.dependencies = deps;
        debug!("commit_run:done id={id} deps={:?}", run.dependencies);
        Ok(id)
    }

    fn get_run(&self, id: i64) -> Result<Option<ComponentRun>, StoreError> {
        self.with_conn(|conn| {
                let row = component_runs::table.find(id)
                                               .select(ComponentRunRow::as_select())
                                               .first(conn)
                                               .optional()?;
                row.map(|r| hydrate(conn, r)).transpose()
            })
            .map_err(StoreError::from)
    }

    fn runs_for_component(&self, component_name: &str, limit: usize) -> Result<Vec<ComponentRun>, StoreError> {
        self.with_conn(|conn| {
                let rows: Vec<ComponentRunRow> =
                    component_runs::table.filter(component_runs::component_name.eq(component_name))
                                         .order(component_runs::id.desc())
                                         .limit(i64::try_from(limit).unwrap_or(i64::MAX))
                                         .select(ComponentRunRow::as_select())
                                         .load(conn)?;
                rows.into_iter().map(|r| hydrate(conn, r)).collect()
            })
            .map_err(StoreError::from)
    }

    fn producer_of(&self, pointer: &IOPointer) -> Result<Option<i64>, StoreError> {
        self.with_conn(|conn| {
                let Some(pid) = find_pointer_id(conn, pointer)? else {
                    return Ok(None);
                };
                Ok(latest_producer(conn, pid)?)
            })
            .map_err(StoreError::from)
    }

    fn add_tags(&mut self, component_name: &str, new_tags: &[String]) -> Result<(), StoreError> {
        self.with_conn(|conn| {
                conn.build_transaction().read_write().run(|tx| {
                                                         if !component_exists(tx, component_name)? {
                                                             return Err(PersistenceError::UnknownComponent(
                                                                 component_name.to_string(),
                                                             ));
                                                         }
                                                         insert_tags(tx, component_name, new_tags)?;
                                                         Ok(())
                                                     })
            })
            .map_err(StoreError::from)
    }

    fn add_labels(&mut self, pointer: &IOPointer, new_labels: &[String]) -> Result<(), StoreError> {
        debug!("add_labels pointer={pointer} count={}", new_labels.len());
        self.with_conn(|conn| {
                conn.build_transaction().read_write().run(|tx| {
                                                         let pid = ensure_pointer(tx, pointer)?;
                                                         if new_labels.is_empty() {
                                                             return Ok(());
                                                         }
                                                         let label_rows: Vec<_> =
                                                             new_labels.iter().map(|l| labels::id.eq(l.as_str())).collect();
                                                         diesel::insert_into(labels::table).values(label_rows)
                                                                                           .on_conflict_do_nothing()
                                                                                           .execute(tx)?;
                                                         let links: Vec<NewPointerLabelRow> =
                                                             new_labels.iter()
                                                                       .map(|l| NewPointerLabelRow { io_pointer_id: pid,
                                                                                                     label_id: l })
                                                                       .collect();
                                                         diesel::insert_into(io_pointer_labels::table)
                                                             .values(&links)
                                                             .on_conflict_do_nothing()
                                                             .execute(tx)?;
                                                         Ok::<(), PersistenceError>(())
                                                     })
            })
            .map_err(StoreError::from)
    }

    fn remove_labels(&mut self, pointer: &IOPointer, to_remove: &[String]) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
                conn.build_transaction().read_write().run(|tx| {
                                                         let Some(pid) = find_pointer_id(tx, pointer)? else {
                                                             return Ok(0);
                                                         };
                                                         let mut removed = 0;
                                                         for label in to_remove {
                                                             let n = diesel::delete(
                                                                 io_pointer_labels::table
                                                                     .filter(io_pointer_labels::io_pointer_id.eq(pid))
                                                                     .filter(io_pointer_labels::label_id.eq(label)),
                                                             ).execute(tx)?;
                                                             if n > 0 {
                                                                 diesel::insert_into(deleted_labels::table)
                                                                     .values(NewDeletedLabelRow { label_id: label,
                                                                                                  io_pointer_id: pid })
                                                                     .execute(tx)?;
                                                                 removed += n;
                                                             }
                                                         }
                                                         Ok::<usize, PersistenceError>(removed)
                                                     })
            })
            .map_err(StoreError::from)
    }

    fn labels_for(&self, pointer: &IOPointer) -> Result<Vec<String>, StoreError> {
        self.with_conn(|conn| {
                let Some(pid) = find_pointer_id(conn, pointer)? else {
                    return Ok(Vec::new());
                };
                Ok(io_pointer_labels::table.filter(io_pointer_labels::io_pointer_id.eq(pid))
                                           .select(io_pointer_labels::label_id)
                                           .order(io_pointer_labels::label_id.asc())
                                           .load(conn)?)
            })
            .map_err(StoreError::from)
    }

    fn deleted_labels_for(&self, pointer: &IOPointer) -> Result<Vec<DeletedLabel>, StoreError> {
        self.with_conn(|conn| {
                let Some(pid) = find_pointer_id(conn, pointer)? else {
                    return Ok(Vec::new());
                };
                let rows: Vec<(String, chrono::DateTime<chrono::Utc>)> =
                    deleted_labels::table.filter(deleted_labels::io_pointer_id.eq(pid))
                                         .select((deleted_labels::label_id, deleted_labels::deleted_at))
                                         .order(deleted_labels::id.asc())
                                         .load(conn)?;
                Ok(rows.into_iter()
                       .map(|(label, deleted_at)| DeletedLabel { label,
                                                                 pointer: pointer.clone(),
                                                                 deleted_at })
                       .collect())
            })
            .map_err(StoreError::from)
    }
}

/// Helper de desarrollo: carga `.env`, lee `DbConfig` y conecta con
/// reintentos.
pub fn build_dev_store_from_env() -> Result<PgLineageStore<PoolProvider>, PersistenceError> {
    init_dotenv();
    let cfg = DbConfig::from_env()?;
    PgLineageStore::connect(&cfg)
}
