//! Modelos neutrales (Component, ComponentRun, IOPointer, anotaciones).

pub mod annotation;
pub mod component;
pub mod component_run;
pub mod io_pointer;
pub mod status;

pub use annotation::DeletedLabel;
pub use component::{Component, ComponentRecord, TestFactory};
pub use component_run::ComponentRun;
pub use io_pointer::{IOPointer, PointerType};
pub use status::RunStatus;
