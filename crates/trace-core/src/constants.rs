//! Constantes del núcleo de trazado.
//!
//! Agrupa valores estáticos que forman parte del contrato observable: el
//! prefijo de descubrimiento de tests y las reglas de inferencia del tipo de
//! `IOPointer`. Cambiarlos altera qué métodos se ejecutan y cómo se
//! identifican los datos ya persistidos.

/// Prefijo literal (sensible a mayúsculas) que califica a un método de test
/// para ser ejecutado tras la función trazada. `Test...` no califica.
pub const TEST_METHOD_PREFIX: &str = "test";

/// Extensiones de archivo que se consideran artefactos de modelo.
pub const MODEL_EXTENSIONS: &[&str] = &["pkl", "joblib", "pt", "onnx", "h5", "bin"];

/// Separador entre nombre de variable y hash para valores no nombrables.
pub const HASHED_POINTER_SEPARATOR: char = '@';
