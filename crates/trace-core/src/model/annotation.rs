//! Anotaciones auxiliares: tags (sobre componentes) y labels (sobre pointers).
//! Un label eliminado deja rastro en `DeletedLabel` (soft delete).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::IOPointer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedLabel {
    pub label: String,
    pub pointer: IOPointer,
    pub deleted_at: DateTime<Utc>,
}
