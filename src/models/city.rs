use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Ciudad - dato de referencia inmutable para el núcleo de viajes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct City {
    pub id: i32,
    pub name: String,
    /// Código de región (UF)
    pub region: String,
}
