//! Macro utilitaria para declarar tests de componente sin boilerplate.
//!
//! Exportada en la raíz del crate:
//!   use trace_core::component_test;

/// Declara un test unitario (struct sin campos, `Default`) con sus métodos en
/// orden de declaración. Los nombres de método se registran literalmente, de
/// modo que el filtro por prefijo `test` se aplica sobre ellos.
///
/// ```ignore
/// component_test! {
///     pub RangeCheck("range") {
///         fn testPositive(vars) { ... }
///         fn helper(vars) { ... }   // registrado pero nunca ejecutado
///     }
/// }
/// ```
#[macro_export]
macro_rules! component_test {
    (
        $(#[$meta:meta])*
        $vis:vis $name:ident ($label:expr) {
            $( fn $method:ident ($vars:ident) $body:block )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;
        impl $crate::testing::ComponentTest for $name {
            fn name(&self) -> &str { $label }
            fn methods(&self) -> Vec<$crate::testing::TestMethod<'_>> {
                vec![
                    $(
                        $crate::testing::TestMethod::new(
                            stringify!($method),
                            |$vars: &mut $crate::instrument::CapturedVars| -> $crate::testing::CheckResult { $body },
                        )
                    ),*
                ]
            }
        }
    };
}
