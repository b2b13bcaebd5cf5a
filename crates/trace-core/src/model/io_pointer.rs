//! `IOPointer`: referencia a un dato consumido o producido por un run.
//!
//! La identidad es el par (`name`, `pointer_type`). El mismo pointer puede
//! aparecer en muchos runs (compartido, no poseído). Los valores capturados
//! se traducen a pointers con `IOPointer::from_captured`:
//! - string: el propio string es el nombre (rutas, URIs, tablas).
//! - array compuesto sólo de strings: un pointer por elemento.
//! - cualquier otro JSON: `<var>@<hash canónico>` con tipo `Unknown`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{HASHED_POINTER_SEPARATOR, MODEL_EXTENSIONS};
use crate::hashing::hash_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    Data,
    Model,
    Endpoint,
    Unknown,
}

impl PointerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointerType::Data => "data",
            PointerType::Model => "model",
            PointerType::Endpoint => "endpoint",
            PointerType::Unknown => "unknown",
        }
    }

    /// Infiere el tipo a partir del nombre del pointer.
    pub fn infer(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return PointerType::Endpoint;
        }
        let is_model_file = lower.rsplit_once('.')
                                 .map(|(_, ext)| MODEL_EXTENSIONS.contains(&ext))
                                 .unwrap_or(false);
        if is_model_file || lower.contains("model") {
            PointerType::Model
        } else {
            PointerType::Data
        }
    }
}

impl fmt::Display for PointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data" => Ok(PointerType::Data),
            "model" => Ok(PointerType::Model),
            "endpoint" => Ok(PointerType::Endpoint),
            "unknown" => Ok(PointerType::Unknown),
            other => Err(format!("unknown pointer type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IOPointer {
    pub name: String,
    pub pointer_type: PointerType,
}

impl IOPointer {
    pub fn new(name: impl Into<String>, pointer_type: PointerType) -> Self {
        Self { name: name.into(),
               pointer_type }
    }

    /// Crea el pointer infiriendo el tipo desde el nombre.
    pub fn inferred(name: impl Into<String>) -> Self {
        let name = name.into();
        let pointer_type = PointerType::infer(&name);
        Self { name, pointer_type }
    }

    /// Traduce el valor capturado de la variable `var` a uno o más pointers.
    pub fn from_captured(var: &str, value: &Value) -> Vec<IOPointer> {
        match value {
            Value::String(s) => vec![IOPointer::inferred(s.as_str())],
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_string) => {
                items.iter().filter_map(Value::as_str).map(IOPointer::inferred).collect()
            }
            other => {
                let name = format!("{var}{HASHED_POINTER_SEPARATOR}{}", hash_value(other));
                vec![IOPointer::new(name, PointerType::Unknown)]
            }
        }
    }
}

impl fmt::Display for IOPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.pointer_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn infer_pointer_types() {
        assert_eq!(PointerType::infer("https://svc/predict"), PointerType::Endpoint);
        assert_eq!(PointerType::infer("artifacts/clf.joblib"), PointerType::Model);
        assert_eq!(PointerType::infer("churn_model_v2"), PointerType::Model);
        assert_eq!(PointerType::infer("data/train.csv"), PointerType::Data);
    }

    #[test]
    fn pointer_type_str_roundtrip() {
        for t in [PointerType::Data, PointerType::Model, PointerType::Endpoint, PointerType::Unknown] {
            assert_eq!(t.as_str().parse::<PointerType>().unwrap(), t);
        }
        assert!("csv".parse::<PointerType>().is_err());
    }

    #[test]
    fn captured_string_and_string_list() {
        assert_eq!(IOPointer::from_captured("path", &json!("raw.csv")),
                   vec![IOPointer::new("raw.csv", PointerType::Data)]);
        let many = IOPointer::from_captured("paths", &json!(["a.csv", "m.pkl"]));
        assert_eq!(many,
                   vec![IOPointer::new("a.csv", PointerType::Data), IOPointer::new("m.pkl", PointerType::Model)]);
    }

    #[test]
    fn captured_value_is_hashed_deterministically() {
        let a = IOPointer::from_captured("n", &json!([100]));
        let b = IOPointer::from_captured("n", &json!([100]));
        let c = IOPointer::from_captured("n", &json!([120]));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a[0].pointer_type, PointerType::Unknown);
        assert!(a[0].name.starts_with("n@"));
    }
}
