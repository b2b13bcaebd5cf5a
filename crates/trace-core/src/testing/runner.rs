use log::debug;

use super::discover;
use crate::errors::TestFailure;
use crate::instrument::CapturedVars;
use crate::model::TestFactory;

/// Instancia cada test y ejecuta sus métodos descubiertos sobre `outputs`.
///
/// Devuelve la cantidad de métodos invocados. El primer fallo se propaga y
/// los métodos restantes no se ejecutan.
pub fn run_after_tests(factories: &[TestFactory], outputs: &mut CapturedVars) -> Result<usize, TestFailure> {
    let mut invoked = 0;
    for factory in factories {
        let test = factory();
        for method in discover(test.as_ref()) {
            debug!("after_test:call test={} method={}", test.name(), method.name());
            method.call(outputs).map_err(|message| TestFailure { test: test.name().to_string(),
                                                                 method: method.name().to_string(),
                                                                 message })?;
            invoked += 1;
        }
    }
    Ok(invoked)
}
