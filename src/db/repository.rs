//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity.

use std::collections::HashMap;

use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};

use super::validate::{validate_pokemon_refs, validate_skill_refs};
use crate::errors::AppError;
use crate::models::{
    CreateTypeRequest, Pokemon, PokemonRequest, PokemonType, Skill, SkillRequest,
    UpdateTypeRequest,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start a write transaction that holds SQLite's write lock from the
    /// first statement, so concurrent writers queue on the busy timeout.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, AppError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    // ==================== TYPE OPERATIONS ====================

    /// List all types.
    pub async fn list_types(&self) -> Result<Vec<PokemonType>, AppError> {
        let rows = sqlx::query("SELECT id, name FROM types ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(type_from_row).collect())
    }

    /// Get a type by ID.
    pub async fn get_type(&self, id: i64) -> Result<Option<PokemonType>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_type(&mut conn, id).await
    }

    /// Create a new type.
    pub async fn create_type(&self, request: &CreateTypeRequest) -> Result<PokemonType, AppError> {
        let name = request.name.trim();
        let mut tx = self.begin_write().await?;

        if type_id_by_name(&mut tx, name).await?.is_some() {
            return Err(AppError::DuplicateKey(format!(
                "Type '{}' already exists",
                name
            )));
        }
        if let Some(id) = request.id {
            if fetch_type(&mut tx, id).await?.is_some() {
                return Err(AppError::DuplicateKey(format!("Type {} already exists", id)));
            }
        }

        let result = sqlx::query("INSERT INTO types (id, name) VALUES (?, ?)")
            .bind(request.id)
            .bind(name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(PokemonType {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    /// Rename a type. Skills referring to the old name follow the rename.
    pub async fn update_type(
        &self,
        id: i64,
        request: &UpdateTypeRequest,
    ) -> Result<PokemonType, AppError> {
        let name = request.name.trim();
        let mut tx = self.begin_write().await?;

        if fetch_type(&mut tx, id).await?.is_none() {
            return Err(AppError::NotFound(format!("Type {} not found", id)));
        }
        if let Some(owner) = type_id_by_name(&mut tx, name).await? {
            if owner != id {
                return Err(AppError::DuplicateKey(format!(
                    "Type '{}' already exists",
                    name
                )));
            }
        }

        sqlx::query("UPDATE types SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(PokemonType {
            id,
            name: name.to_string(),
        })
    }

    /// Delete a type that no Pokémon or skill refers to.
    pub async fn delete_type(&self, id: i64) -> Result<PokemonType, AppError> {
        let mut tx = self.begin_write().await?;

        let existing = fetch_type(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Type {} not found", id)))?;

        let in_use: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM pokemon_types WHERE type_id = ?)
                   OR EXISTS(SELECT 1 FROM skills WHERE type_name = ?)"#,
        )
        .bind(id)
        .bind(&existing.name)
        .fetch_one(&mut *tx)
        .await?;

        if in_use {
            return Err(AppError::Conflict(format!(
                "Type {} is still referenced by a Pokemon or skill",
                id
            )));
        }

        sqlx::query("DELETE FROM types WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(existing)
    }

    // ==================== SKILL OPERATIONS ====================

    /// List all skills.
    pub async fn list_skills(&self) -> Result<Vec<Skill>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, name, description, power, accuracy, max_life_point, type_name
               FROM skills ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(skill_from_row).collect())
    }

    /// Get a skill by ID.
    pub async fn get_skill(&self, id: i64) -> Result<Option<Skill>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_skill(&mut conn, id).await
    }

    /// Create a new skill.
    pub async fn create_skill(&self, request: &SkillRequest) -> Result<Skill, AppError> {
        let mut tx = self.begin_write().await?;

        if let Some(id) = request.id {
            if fetch_skill(&mut tx, id).await?.is_some() {
                return Err(AppError::DuplicateKey(format!(
                    "Skill {} already exists",
                    id
                )));
            }
        }
        validate_skill_refs(&mut tx, request.type_name.as_deref()).await?;

        let result = sqlx::query(
            r#"INSERT INTO skills (id, name, description, power, accuracy, max_life_point, type_name)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(request.id)
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.power)
        .bind(request.accuracy)
        .bind(request.pp_max)
        .bind(&request.type_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(skill_from_request(result.last_insert_rowid(), request))
    }

    /// Replace every field of an existing skill.
    pub async fn update_skill(&self, id: i64, request: &SkillRequest) -> Result<Skill, AppError> {
        let mut tx = self.begin_write().await?;

        if fetch_skill(&mut tx, id).await?.is_none() {
            return Err(AppError::NotFound(format!("Skill {} not found", id)));
        }
        if let Some(body_id) = request.id {
            if body_id != id {
                return Err(AppError::Validation(format!(
                    "id {} in body does not match {} in path",
                    body_id, id
                )));
            }
        }
        validate_skill_refs(&mut tx, request.type_name.as_deref()).await?;

        sqlx::query(
            r#"UPDATE skills SET
                name = ?, description = ?, power = ?, accuracy = ?,
                max_life_point = ?, type_name = ?
            WHERE id = ?"#,
        )
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.power)
        .bind(request.accuracy)
        .bind(request.pp_max)
        .bind(&request.type_name)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(skill_from_request(id, request))
    }

    /// Delete a skill no Pokémon knows.
    pub async fn delete_skill(&self, id: i64) -> Result<Skill, AppError> {
        let mut tx = self.begin_write().await?;

        let existing = fetch_skill(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Skill {} not found", id)))?;

        let in_use: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pokemon_skills WHERE skill_id = ?)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if in_use {
            return Err(AppError::Conflict(format!(
                "Skill {} is still known by a Pokemon",
                id
            )));
        }

        sqlx::query("DELETE FROM skills WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(existing)
    }

    // ==================== POKEMON OPERATIONS ====================

    /// List all Pokémon ordered by Pokédex number.
    pub async fn list_pokemons(&self) -> Result<Vec<Pokemon>, AppError> {
        // One read transaction so rows and reference lists share a snapshot
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            "SELECT id_pokedex, name, size, weight, stats, image FROM pokemons ORDER BY id_pokedex",
        )
        .fetch_all(&mut *tx)
        .await?;

        let mut types = grouped_refs(
            &mut tx,
            "SELECT pokemon_id, type_id AS ref_id FROM pokemon_types ORDER BY pokemon_id, slot",
        )
        .await?;
        let mut skills = grouped_refs(
            &mut tx,
            "SELECT pokemon_id, skill_id AS ref_id FROM pokemon_skills ORDER BY pokemon_id, slot",
        )
        .await?;

        tx.commit().await?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: i64 = row.get("id_pokedex");
                pokemon_from_row(
                    row,
                    types.remove(&id).unwrap_or_default(),
                    skills.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    /// Get a Pokémon by Pokédex number.
    pub async fn get_pokemon(&self, id: i64) -> Result<Option<Pokemon>, AppError> {
        let mut tx = self.pool.begin().await?;
        let pokemon = fetch_pokemon(&mut tx, id).await?;
        tx.commit().await?;
        Ok(pokemon)
    }

    /// Create a Pokémon after checking every type and skill it refers to.
    pub async fn create_pokemon(&self, request: &PokemonRequest) -> Result<Pokemon, AppError> {
        let id = request
            .id_pokedex
            .ok_or_else(|| AppError::Validation("id_pokedex is required".to_string()))?;
        reject_repeated_refs(request)?;

        let mut tx = self.begin_write().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pokemons WHERE id_pokedex = ?)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if exists {
            return Err(AppError::DuplicateKey(format!(
                "Pokemon {} already exists",
                id
            )));
        }

        validate_pokemon_refs(&mut tx, &request.types, &request.skills).await?;

        sqlx::query(
            r#"INSERT INTO pokemons (id_pokedex, name, size, weight, stats, image)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(id)
        .bind(request.name.trim())
        .bind(request.size)
        .bind(request.weight)
        .bind(request.stats)
        .bind(&request.image)
        .execute(&mut *tx)
        .await?;

        write_refs(&mut tx, id, &request.types, &request.skills).await?;

        tx.commit().await?;

        Ok(pokemon_from_request(id, request))
    }

    /// Replace every field of an existing Pokémon, including its references.
    pub async fn update_pokemon(
        &self,
        id: i64,
        request: &PokemonRequest,
    ) -> Result<Pokemon, AppError> {
        let mut tx = self.begin_write().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pokemons WHERE id_pokedex = ?)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Err(AppError::NotFound(format!("Pokemon {} not found", id)));
        }
        if let Some(body_id) = request.id_pokedex {
            if body_id != id {
                return Err(AppError::Validation(format!(
                    "id_pokedex {} in body does not match {} in path",
                    body_id, id
                )));
            }
        }
        reject_repeated_refs(request)?;

        validate_pokemon_refs(&mut tx, &request.types, &request.skills).await?;

        sqlx::query(
            r#"UPDATE pokemons SET
                name = ?, size = ?, weight = ?, stats = ?, image = ?
            WHERE id_pokedex = ?"#,
        )
        .bind(request.name.trim())
        .bind(request.size)
        .bind(request.weight)
        .bind(request.stats)
        .bind(&request.image)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM pokemon_types WHERE pokemon_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM pokemon_skills WHERE pokemon_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        write_refs(&mut tx, id, &request.types, &request.skills).await?;

        tx.commit().await?;

        Ok(pokemon_from_request(id, request))
    }

    /// Delete a Pokémon and return what was removed.
    pub async fn delete_pokemon(&self, id: i64) -> Result<Pokemon, AppError> {
        let mut tx = self.begin_write().await?;

        let existing = fetch_pokemon(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pokemon {} not found", id)))?;

        // Join rows go with it via ON DELETE CASCADE
        sqlx::query("DELETE FROM pokemons WHERE id_pokedex = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(existing)
    }
}

// Lookups shared by the pool and transaction paths

async fn fetch_type(conn: &mut SqliteConnection, id: i64) -> Result<Option<PokemonType>, AppError> {
    let row = sqlx::query("SELECT id, name FROM types WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(row.as_ref().map(type_from_row))
}

async fn type_id_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<i64>, AppError> {
    let id = sqlx::query_scalar("SELECT id FROM types WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(id)
}

async fn fetch_skill(conn: &mut SqliteConnection, id: i64) -> Result<Option<Skill>, AppError> {
    let row = sqlx::query(
        r#"SELECT id, name, description, power, accuracy, max_life_point, type_name
           FROM skills WHERE id = ?"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row.as_ref().map(skill_from_row))
}

async fn fetch_pokemon(conn: &mut SqliteConnection, id: i64) -> Result<Option<Pokemon>, AppError> {
    let row = sqlx::query(
        "SELECT id_pokedex, name, size, weight, stats, image FROM pokemons WHERE id_pokedex = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let types: Vec<i64> =
        sqlx::query_scalar("SELECT type_id FROM pokemon_types WHERE pokemon_id = ? ORDER BY slot")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;
    let skills: Vec<i64> = sqlx::query_scalar(
        "SELECT skill_id FROM pokemon_skills WHERE pokemon_id = ? ORDER BY slot",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(pokemon_from_row(&row, types, skills)))
}

/// Collect `(pokemon_id, ref_id)` rows into per-Pokémon lists, keeping row order.
async fn grouped_refs(
    conn: &mut SqliteConnection,
    sql: &'static str,
) -> Result<HashMap<i64, Vec<i64>>, AppError> {
    let rows = sqlx::query(sql).fetch_all(conn).await?;

    let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in &rows {
        grouped
            .entry(row.get("pokemon_id"))
            .or_default()
            .push(row.get("ref_id"));
    }
    Ok(grouped)
}

async fn write_refs(
    conn: &mut SqliteConnection,
    pokemon_id: i64,
    types: &[i64],
    skills: &[i64],
) -> Result<(), AppError> {
    for (slot, type_id) in types.iter().enumerate() {
        sqlx::query("INSERT INTO pokemon_types (pokemon_id, type_id, slot) VALUES (?, ?, ?)")
            .bind(pokemon_id)
            .bind(type_id)
            .bind(slot as i64)
            .execute(&mut *conn)
            .await?;
    }
    for (slot, skill_id) in skills.iter().enumerate() {
        sqlx::query("INSERT INTO pokemon_skills (pokemon_id, skill_id, slot) VALUES (?, ?, ?)")
            .bind(pokemon_id)
            .bind(skill_id)
            .bind(slot as i64)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn reject_repeated_refs(request: &PokemonRequest) -> Result<(), AppError> {
    match request.repeated_ref() {
        Some((kind, id)) => Err(AppError::Validation(format!(
            "{} {} is listed more than once",
            kind, id
        ))),
        None => Ok(()),
    }
}

// Helper functions for row conversion

fn type_from_row(row: &sqlx::sqlite::SqliteRow) -> PokemonType {
    PokemonType {
        id: row.get("id"),
        name: row.get("name"),
    }
}

fn skill_from_row(row: &sqlx::sqlite::SqliteRow) -> Skill {
    Skill {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        power: row.get("power"),
        accuracy: row.get("accuracy"),
        pp_max: row.get("max_life_point"),
        type_name: row.get("type_name"),
    }
}

fn skill_from_request(id: i64, request: &SkillRequest) -> Skill {
    Skill {
        id,
        name: request.name.trim().to_string(),
        description: request.description.clone(),
        power: request.power,
        accuracy: request.accuracy,
        pp_max: request.pp_max,
        type_name: request.type_name.clone(),
    }
}

fn pokemon_from_row(row: &sqlx::sqlite::SqliteRow, types: Vec<i64>, skills: Vec<i64>) -> Pokemon {
    Pokemon {
        id_pokedex: row.get("id_pokedex"),
        name: row.get("name"),
        size: row.get("size"),
        weight: row.get("weight"),
        stats: row.get("stats"),
        image: row.get("image"),
        types,
        skills,
    }
}

fn pokemon_from_request(id: i64, request: &PokemonRequest) -> Pokemon {
    Pokemon {
        id_pokedex: id,
        name: request.name.trim().to_string(),
        size: request.size,
        weight: request.weight,
        stats: request.stats,
        image: request.image.clone(),
        types: request.types.clone(),
        skills: request.skills.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{memory_pool, ReferenceError};

    async fn repo() -> Repository {
        Repository::new(memory_pool().await)
    }

    fn charmander(types: Vec<i64>, skills: Vec<i64>) -> PokemonRequest {
        PokemonRequest {
            id_pokedex: Some(4),
            name: "Charmander".to_string(),
            size: Some(0.6),
            weight: Some(8.5),
            stats: Some(0.0),
            image: Some("charmander.png".to_string()),
            types,
            skills,
        }
    }

    async fn seed_fire(repo: &Repository) {
        repo.create_type(&CreateTypeRequest {
            id: None,
            name: "Fire".to_string(),
        })
        .await
        .unwrap();
        repo.create_skill(&SkillRequest {
            id: Some(1),
            name: "Ember".to_string(),
            description: None,
            power: Some(40),
            accuracy: Some(100),
            pp_max: Some(25),
            type_name: Some("Fire".to_string()),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_empty_tables_list_empty() {
        let repo = repo().await;
        assert!(repo.list_pokemons().await.unwrap().is_empty());
        assert!(repo.list_types().await.unwrap().is_empty());
        assert!(repo.list_skills().await.unwrap().is_empty());
        assert!(repo.get_pokemon(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_pokemon_round_trip() {
        let repo = repo().await;
        seed_fire(&repo).await;

        let created = repo.create_pokemon(&charmander(vec![1], vec![1])).await.unwrap();
        let fetched = repo.get_pokemon(4).await.unwrap().unwrap();
        assert_eq!(created, fetched);

        let listed = repo.list_pokemons().await.unwrap();
        assert_eq!(listed, vec![fetched]);
    }

    #[tokio::test]
    async fn test_create_pokemon_missing_reference_inserts_nothing() {
        let repo = repo().await;
        seed_fire(&repo).await;

        let err = repo
            .create_pokemon(&charmander(vec![1], vec![1, 9]))
            .await
            .unwrap_err();
        match err {
            AppError::MissingReference(missing) => {
                assert_eq!(missing, ReferenceError::MissingSkill(9))
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(repo.get_pokemon(4).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_update_leaves_record_unchanged() {
        let repo = repo().await;
        seed_fire(&repo).await;
        let original = repo.create_pokemon(&charmander(vec![1], vec![1])).await.unwrap();

        let mut changed = charmander(vec![99], vec![1]);
        changed.name = "Charmeleon".to_string();
        let err = repo.update_pokemon(4, &changed).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingReference(ReferenceError::MissingType(99))
        ));

        assert_eq!(repo.get_pokemon(4).await.unwrap().unwrap(), original);
    }

    #[tokio::test]
    async fn test_type_rename_cascades_to_skills() {
        let repo = repo().await;
        seed_fire(&repo).await;

        repo.update_type(
            1,
            &UpdateTypeRequest {
                name: "Feu".to_string(),
            },
        )
        .await
        .unwrap();

        let skill = repo.get_skill(1).await.unwrap().unwrap();
        assert_eq!(skill.type_name.as_deref(), Some("Feu"));
    }

    #[tokio::test]
    async fn test_referenced_type_and_skill_cannot_be_deleted() {
        let repo = repo().await;
        seed_fire(&repo).await;
        repo.create_pokemon(&charmander(vec![1], vec![1])).await.unwrap();

        assert!(matches!(repo.delete_type(1).await, Err(AppError::Conflict(_))));
        assert!(matches!(repo.delete_skill(1).await, Err(AppError::Conflict(_))));

        repo.delete_pokemon(4).await.unwrap();
        repo.delete_skill(1).await.unwrap();
        repo.delete_type(1).await.unwrap();
        assert!(matches!(repo.delete_type(1).await, Err(AppError::NotFound(_))));
    }
}
