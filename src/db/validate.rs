//! Referential checks run before Pokémon and skill writes.
//!
//! Every check takes the caller's connection so it can run inside the
//! transaction that performs the write.

use std::fmt;

use serde_json::json;
use sqlx::SqliteConnection;

/// A write referenced a row that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    MissingType(i64),
    MissingSkill(i64),
    MissingTypeName(String),
}

impl ReferenceError {
    /// Machine-readable form for the error envelope.
    pub fn details(&self) -> serde_json::Value {
        match self {
            ReferenceError::MissingType(id) => json!({ "kind": "missing_type", "id": id }),
            ReferenceError::MissingSkill(id) => json!({ "kind": "missing_skill", "id": id }),
            ReferenceError::MissingTypeName(name) => {
                json!({ "kind": "missing_type_name", "id": name })
            }
        }
    }
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceError::MissingType(id) => write!(f, "Type {} does not exist", id),
            ReferenceError::MissingSkill(id) => write!(f, "Skill {} does not exist", id),
            ReferenceError::MissingTypeName(name) => write!(f, "Type '{}' does not exist", name),
        }
    }
}

impl std::error::Error for ReferenceError {}

/// Why a reference validation did not pass.
#[derive(Debug)]
pub enum ValidationFailure {
    Missing(ReferenceError),
    Store(sqlx::Error),
}

impl From<sqlx::Error> for ValidationFailure {
    fn from(err: sqlx::Error) -> Self {
        ValidationFailure::Store(err)
    }
}

impl From<ValidationFailure> for crate::errors::AppError {
    fn from(failure: ValidationFailure) -> Self {
        match failure {
            ValidationFailure::Missing(missing) => missing.into(),
            ValidationFailure::Store(err) => err.into(),
        }
    }
}

pub async fn type_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM types WHERE id = ?)")
        .bind(id)
        .fetch_one(conn)
        .await
}

pub async fn skill_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM skills WHERE id = ?)")
        .bind(id)
        .fetch_one(conn)
        .await
}

pub async fn type_name_exists(conn: &mut SqliteConnection, name: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM types WHERE name = ?)")
        .bind(name)
        .fetch_one(conn)
        .await
}

/// Check every type id, then every skill id, stopping at the first one missing.
pub async fn validate_pokemon_refs(
    conn: &mut SqliteConnection,
    types: &[i64],
    skills: &[i64],
) -> Result<(), ValidationFailure> {
    for &id in types {
        if !type_exists(&mut *conn, id).await? {
            return Err(ValidationFailure::Missing(ReferenceError::MissingType(id)));
        }
    }
    for &id in skills {
        if !skill_exists(&mut *conn, id).await? {
            return Err(ValidationFailure::Missing(ReferenceError::MissingSkill(id)));
        }
    }
    Ok(())
}

/// Check the optional type name a skill points at.
pub async fn validate_skill_refs(
    conn: &mut SqliteConnection,
    type_name: Option<&str>,
) -> Result<(), ValidationFailure> {
    if let Some(name) = type_name {
        if !type_name_exists(conn, name).await? {
            return Err(ValidationFailure::Missing(ReferenceError::MissingTypeName(
                name.to_string(),
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    async fn seeded() -> sqlx::SqlitePool {
        let pool = memory_pool().await;
        sqlx::query("INSERT INTO types (id, name) VALUES (1, 'Fire'), (2, 'Flying')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO skills (id, name, type_name) VALUES (1, 'Ember', 'Fire')")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_existence_checks() {
        let pool = seeded().await;
        let mut conn = pool.acquire().await.unwrap();

        assert!(type_exists(&mut conn, 1).await.unwrap());
        assert!(!type_exists(&mut conn, 3).await.unwrap());
        assert!(skill_exists(&mut conn, 1).await.unwrap());
        assert!(!skill_exists(&mut conn, 2).await.unwrap());
        assert!(type_name_exists(&mut conn, "Flying").await.unwrap());
        assert!(!type_name_exists(&mut conn, "Water").await.unwrap());
    }

    #[tokio::test]
    async fn test_validate_pokemon_refs_names_first_missing_id() {
        let pool = seeded().await;
        let mut conn = pool.acquire().await.unwrap();

        assert!(validate_pokemon_refs(&mut conn, &[1, 2], &[1]).await.is_ok());
        assert!(validate_pokemon_refs(&mut conn, &[], &[]).await.is_ok());

        match validate_pokemon_refs(&mut conn, &[1, 99, 98], &[42]).await {
            Err(ValidationFailure::Missing(missing)) => {
                assert_eq!(missing, ReferenceError::MissingType(99))
            }
            other => panic!("unexpected result: {:?}", other),
        }

        match validate_pokemon_refs(&mut conn, &[2], &[1, 7]).await {
            Err(ValidationFailure::Missing(missing)) => {
                assert_eq!(missing, ReferenceError::MissingSkill(7))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validate_skill_refs() {
        let pool = seeded().await;
        let mut conn = pool.acquire().await.unwrap();

        assert!(validate_skill_refs(&mut conn, None).await.is_ok());
        assert!(validate_skill_refs(&mut conn, Some("Fire")).await.is_ok());
        match validate_skill_refs(&mut conn, Some("Water")).await {
            Err(ValidationFailure::Missing(missing)) => assert_eq!(
                missing,
                ReferenceError::MissingTypeName("Water".to_string())
            ),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
