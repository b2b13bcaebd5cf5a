//! Tests posteriores a la ejecución de un componente.
//!
//! Un test expone una lista explícita y ordenada de métodos con nombre
//! (`ComponentTest::methods`). Sólo se ejecutan los que empiezan con el
//! prefijo literal `test` (ver `discover`); el resto se ignora aunque esté
//! registrado. Orden de ejecución: fábricas en el orden de `after_tests`,
//! métodos en el orden en que el test los registra.

mod macros;
mod runner;

pub use runner::run_after_tests;

use crate::constants::TEST_METHOD_PREFIX;
use crate::instrument::CapturedVars;

/// Resultado de un método de test: `Err(mensaje)` aborta la llamada trazada.
pub type CheckResult = Result<(), String>;

/// Método de test con nombre. Recibe todas las variables de salida
/// capturadas y puede mutarlas en sitio.
pub struct TestMethod<'a> {
    name: String,
    func: Box<dyn Fn(&mut CapturedVars) -> CheckResult + 'a>,
}

impl<'a> TestMethod<'a> {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
        where F: Fn(&mut CapturedVars) -> CheckResult + 'a
    {
        Self { name: name.into(),
               func: Box::new(func) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, outputs: &mut CapturedVars) -> CheckResult {
        (self.func)(outputs)
    }
}

impl std::fmt::Debug for TestMethod<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestMethod").field("name", &self.name).finish()
    }
}

/// Validador pluggable ligado a un `Component`.
pub trait ComponentTest {
    /// Nombre amigable del test (aparece en `TestFailure`).
    fn name(&self) -> &str;

    /// Todos los métodos registrados, en orden de declaración.
    fn methods(&self) -> Vec<TestMethod<'_>>;
}

/// `true` si el nombre califica como método de test ejecutable.
pub fn is_test_method(name: &str) -> bool {
    name.starts_with(TEST_METHOD_PREFIX)
}

/// Métodos ejecutables de `test`, preservando el orden de registro.
pub fn discover(test: &dyn ComponentTest) -> Vec<TestMethod<'_>> {
    test.methods().into_iter().filter(|m| is_test_method(m.name())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component_test;

    component_test! {
        Decoys("Decoys") {
            fn TestNotCorrect(_vars) { Err("TestNotCorrect called!".into()) }
            fn testFirst(_vars) { Ok(()) }
            fn notCorrect(_vars) { Err("notCorrect called!".into()) }
            fn Test(_vars) { Err("Test called!".into()) }
            fn test_second(_vars) { Ok(()) }
            fn tEsting(_vars) { Err("tEsting called!".into()) }
        }
    }

    #[test]
    fn prefix_is_case_sensitive() {
        assert!(is_test_method("test"));
        assert!(is_test_method("testCorrect"));
        assert!(!is_test_method("Test"));
        assert!(!is_test_method("TestNotCorrect"));
        assert!(!is_test_method("notCorrect"));
        assert!(!is_test_method("atest"));
    }

    #[test]
    fn discover_filters_and_keeps_registration_order() {
        let t = Decoys;
        assert_eq!(t.methods().len(), 6);
        let names: Vec<String> = discover(&t).iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, vec!["testFirst".to_string(), "test_second".to_string()]);
    }
}
