//! Pokémon model.

use serde::{Deserialize, Serialize};

/// A Pokédex entry with its type and skill references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id_pokedex: i64,
    pub name: String,
    pub size: Option<f64>,
    pub weight: Option<f64>,
    pub stats: Option<f64>,
    pub image: Option<String>,
    /// Type ids in declaration order
    pub types: Vec<i64>,
    /// Skill ids in declaration order
    pub skills: Vec<i64>,
}

/// Request body shared by create and full-record update.
#[derive(Debug, Clone, Deserialize)]
pub struct PokemonRequest {
    /// Required on create; on update it must match the path id when present
    #[serde(default)]
    pub id_pokedex: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub stats: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub types: Vec<i64>,
    #[serde(default)]
    pub skills: Vec<i64>,
}

impl PokemonRequest {
    /// First id listed twice in `types` or `skills`, with the kind of list it came from.
    pub fn repeated_ref(&self) -> Option<(&'static str, i64)> {
        first_repeat(&self.types)
            .map(|id| ("Type", id))
            .or_else(|| first_repeat(&self.skills).map(|id| ("Skill", id)))
    }
}

fn first_repeat(ids: &[i64]) -> Option<i64> {
    ids.iter()
        .enumerate()
        .find(|&(i, &id)| ids[..i].contains(&id))
        .map(|(_, &id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(types: serde_json::Value, skills: serde_json::Value) -> PokemonRequest {
        serde_json::from_value(serde_json::json!({
            "id_pokedex": 6,
            "name": "Charizard",
            "types": types,
            "skills": skills
        }))
        .unwrap()
    }

    #[test]
    fn test_repeated_ref_finds_first_repeat() {
        let ok = request(serde_json::json!([2, 1]), serde_json::json!([3, 4]));
        assert_eq!(ok.repeated_ref(), None);

        let types = request(serde_json::json!([2, 1, 2]), serde_json::json!([3, 3]));
        assert_eq!(types.repeated_ref(), Some(("Type", 2)));

        let skills = request(serde_json::json!([1]), serde_json::json!([5, 3, 3]));
        assert_eq!(skills.repeated_ref(), Some(("Skill", 3)));
    }

    #[test]
    fn test_optional_fields_default() {
        let request: PokemonRequest =
            serde_json::from_value(serde_json::json!({ "name": "Ditto" })).unwrap();
        assert!(request.id_pokedex.is_none());
        assert!(request.types.is_empty());
        assert!(request.stats.is_none());
    }
}
