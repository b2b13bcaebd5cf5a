use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Espacio de nombres explícito de una llamada trazada.
///
/// La función envuelta recibe `&mut RunContext` y fija las variables que el
/// componente declaró en `input_vars`/`output_vars`. Fijar otra vez el mismo
/// nombre reemplaza el valor (como reasignar una variable local).
#[derive(Debug, Default, Clone)]
pub struct RunContext {
    vars: IndexMap<String, Value>,
    notes: Vec<String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Variante para tipos propios serializables.
    pub fn set_serialized<T: Serialize>(&mut self, name: impl Into<String>, value: &T) -> Result<(), serde_json::Error> {
        let v = serde_json::to_value(value)?;
        self.vars.insert(name.into(), v);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.vars.get_mut(name)
    }

    /// Nota libre que queda en `ComponentRun::notes`.
    pub fn note(&mut self, text: impl Into<String>) {
        self.notes.push(text.into());
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Copia, en el orden pedido, las variables `names`. Devuelve el primer
    /// nombre ausente como error.
    pub fn capture(&self, names: &[String]) -> Result<CapturedVars, String> {
        let mut captured = CapturedVars::default();
        for name in names {
            let value = self.vars.get(name).ok_or_else(|| name.clone())?;
            captured.insert(name.clone(), value.clone());
        }
        Ok(captured)
    }
}

/// Variables capturadas de una llamada, ordenadas como fueron declaradas.
///
/// Es lo que reciben los métodos de test; pueden mutar los valores en sitio
/// y el llamador ve el resultado en `TracedCall::outputs`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CapturedVars {
    vars: IndexMap<String, Value>,
}

impl CapturedVars {
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.vars.get_mut(name)
    }

    /// Acceso posicional (equivalente al n-ésimo argumento).
    pub fn nth(&self, index: usize) -> Option<&Value> {
        self.vars.get_index(index).map(|(_, v)| v)
    }

    pub fn nth_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.vars.get_index_mut(index).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.vars
    }
}
