//! Skill (ability) model.

use serde::{Deserialize, Serialize};

/// A move a Pokémon can learn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub power: Option<i64>,
    pub accuracy: Option<i64>,
    /// Maximum power points, stored as `max_life_point`
    pub pp_max: Option<i64>,
    /// Name of the type this skill belongs to
    pub type_name: Option<String>,
}

/// Request body for creating or fully replacing a skill.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillRequest {
    /// Only honoured on create; ignored on update where the path id wins
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub power: Option<i64>,
    #[serde(default)]
    pub accuracy: Option<i64>,
    #[serde(default, alias = "max_life_point")]
    pub pp_max: Option<i64>,
    #[serde(default)]
    pub type_name: Option<String>,
}
