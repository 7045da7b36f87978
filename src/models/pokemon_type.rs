//! Elemental type model (Fire, Water, ...).

use serde::{Deserialize, Serialize};

/// An elemental type that Pokémon and skills refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonType {
    pub id: i64,
    pub name: String,
}

/// Request body for creating a type. The id is assigned by the store when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTypeRequest {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

/// Request body for renaming a type.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTypeRequest {
    pub name: String,
}
