//! `Component`: definición de una etapa del pipeline.
//!
//! Se construye una sola vez (builder por consumo) y no expone setters. Sus
//! `after_tests` son fábricas: cada llamada trazada instancia tests nuevos,
//! en el orden en que fueron declarados.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::instrument::TracedFn;
use crate::testing::ComponentTest;

/// Fábrica de un test posterior a la ejecución.
pub type TestFactory = Box<dyn Fn() -> Box<dyn ComponentTest>>;

/// Forma persistida de un componente (sin tests).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub description: String,
    pub owner: String,
    pub tags: Vec<String>,
}

pub struct Component {
    owner: String,
    name: String,
    description: String,
    tags: Vec<String>,
    after_tests: Vec<TestFactory>,
}

impl Component {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { owner: owner.into(),
               name: name.into(),
               description: description.into(),
               tags: Vec::new(),
               after_tests: Vec::new() }
    }

    /// Añade tags (sin duplicados, se conserva el orden de primera aparición).
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        for t in tags {
            let t = t.into();
            if !self.tags.contains(&t) {
                self.tags.push(t);
            }
        }
        self
    }

    /// Registra un test que se instancia con `Default` en cada llamada.
    pub fn after_test<T>(self) -> Self
        where T: ComponentTest + Default + 'static
    {
        self.after_test_with(|| Box::new(T::default()) as Box<dyn ComponentTest>)
    }

    /// Registra un test a partir de una fábrica arbitraria.
    pub fn after_test_with<F>(mut self, factory: F) -> Self
        where F: Fn() -> Box<dyn ComponentTest> + 'static
    {
        self.after_tests.push(Box::new(factory));
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn after_tests(&self) -> &[TestFactory] {
        &self.after_tests
    }

    /// Registro persistible bajo el nombre propio del componente.
    pub fn record(&self) -> ComponentRecord {
        self.record_as(&self.name)
    }

    /// Registro persistible bajo otro nombre (el `component_name` de `run`).
    pub fn record_as(&self, name: &str) -> ComponentRecord {
        ComponentRecord { name: name.to_string(),
                          description: self.description.clone(),
                          owner: self.owner.clone(),
                          tags: self.tags.clone() }
    }

    /// Envuelve `func` para trazar cada invocación.
    ///
    /// `input_vars` y `output_vars` son nombres que la función debe fijar en
    /// el `RunContext` recibido; se capturan después de que retorna.
    pub fn run<F>(&self, component_name: &str, input_vars: &[&str], output_vars: &[&str], func: F) -> TracedFn<'_, F> {
        TracedFn::new(self,
                      component_name,
                      input_vars.iter().map(|s| s.to_string()).collect(),
                      output_vars.iter().map(|s| s.to_string()).collect(),
                      func)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
         .field("owner", &self.owner)
         .field("name", &self.name)
         .field("description", &self.description)
         .field("tags", &self.tags)
         .field("after_tests", &self.after_tests.len())
         .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_metadata_and_dedups_tags() {
        let c = Component::new("aditi", "clean", "cleans raw data").with_tags(["etl", "daily", "etl"]);
        let r = c.record_as("clean_v2");
        assert_eq!(r.name, "clean_v2");
        assert_eq!(r.owner, "aditi");
        assert_eq!(r.description, "cleans raw data");
        assert_eq!(r.tags, vec!["etl".to_string(), "daily".to_string()]);
        assert_eq!(c.record().name, "clean");
        assert!(c.after_tests().is_empty());
    }
}
