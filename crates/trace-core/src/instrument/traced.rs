//! `TracedFn`: envoltura de una función del pipeline.
//!
//! Secuencia de una llamada (`call`):
//! 1. Ejecuta la función con un `RunContext` nuevo. Un `Err` se devuelve tal
//!    cual (`RunError::Function`) y no se persiste nada.
//! 2. Captura `input_vars` y `output_vars` desde el contexto.
//! 3. Ejecuta los tests descubiertos sobre las salidas capturadas; el primer
//!    fallo aborta la llamada sin persistir.
//! 4. Finaliza el run (`Success`), registra el componente y hace commit.

use chrono::Utc;
use log::debug;

use super::{CapturedVars, RunContext};
use crate::errors::RunError;
use crate::model::{Component, ComponentRun, IOPointer, RunStatus};
use crate::store::LineageStore;
use crate::testing::run_after_tests;

/// Resultado de una llamada trazada exitosa.
#[derive(Debug, Clone)]
pub struct TracedCall<R> {
    /// Valor devuelto por la función envuelta.
    pub value: R,
    /// Run ya persistido (con `id` y `dependencies`).
    pub run: ComponentRun,
    pub inputs: CapturedVars,
    /// Salidas tal como quedaron tras los tests (pueden haber sido mutadas).
    pub outputs: CapturedVars,
    /// Cantidad de métodos de test invocados.
    pub tests_invoked: usize,
}

pub struct TracedFn<'c, F> {
    component: &'c Component,
    component_name: String,
    input_vars: Vec<String>,
    output_vars: Vec<String>,
    func: F,
}

impl<'c, F> TracedFn<'c, F> {
    pub(crate) fn new(component: &'c Component,
                      component_name: &str,
                      input_vars: Vec<String>,
                      output_vars: Vec<String>,
                      func: F)
                      -> Self {
        Self { component,
               component_name: component_name.to_string(),
               input_vars,
               output_vars,
               func }
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn input_vars(&self) -> &[String] {
        &self.input_vars
    }

    pub fn output_vars(&self) -> &[String] {
        &self.output_vars
    }

    /// Invoca la función envuelta y registra el run en `store`.
    pub fn call<A, R, E, S>(&mut self, store: &mut S, args: A) -> Result<TracedCall<R>, RunError<E>>
        where F: FnMut(A, &mut RunContext) -> Result<R, E>,
              S: LineageStore + ?Sized
    {
        debug!("traced_call:start component={}", self.component_name);
        let mut run = ComponentRun::new(self.component_name.as_str());
        let mut ctx = RunContext::new();

        let value = (self.func)(args, &mut ctx).map_err(RunError::Function)?;
        run.set_end_time(Utc::now());

        let inputs = ctx.capture(&self.input_vars).map_err(RunError::MissingVariable)?;
        let mut outputs = ctx.capture(&self.output_vars).map_err(RunError::MissingVariable)?;

        // La identidad de los pointers se fija antes de los tests.
        for (name, v) in inputs.iter() {
            run.add_inputs(IOPointer::from_captured(name, v));
        }
        for (name, v) in outputs.iter() {
            run.add_outputs(IOPointer::from_captured(name, v));
        }

        let tests_invoked = run_after_tests(self.component.after_tests(), &mut outputs)?;

        run.notes = ctx.notes().join("\n");
        run.finish(RunStatus::Success);
        store.upsert_component(&self.component.record_as(&self.component_name))?;
        store.commit_run(&mut run)?;
        debug!("traced_call:done component={} run_id={:?} tests={tests_invoked}",
               self.component_name,
               run.id);

        Ok(TracedCall { value,
                        run,
                        inputs,
                        outputs,
                        tests_invoked })
    }
}
