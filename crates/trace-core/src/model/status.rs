use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Estado de un `ComponentRun`.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Success`
/// - `Pending` -> `Failed`
///
/// Un run finalizado no vuelve a `Pending` ni se reutiliza.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Run creado, aún sin finalizar.
    #[default]
    Pending,
    /// La función y todos sus tests terminaron correctamente.
    Success,
    /// El run se registró como fallido.
    Failed,
}

impl RunStatus {
    /// Representación estable en minúsculas (columna `status`).
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Pending)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}
