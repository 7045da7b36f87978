//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data.

mod repository;
mod validate;

pub use repository::*;
pub use validate::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(sqlx::Error::Io)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
pub(crate) async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS types (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS skills (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            power INTEGER,
            accuracy INTEGER,
            max_life_point INTEGER,
            type_name TEXT REFERENCES types(name) ON UPDATE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pokemons (
            id_pokedex INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            size REAL,
            weight REAL,
            stats REAL,
            image TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pokemon_types (
            pokemon_id INTEGER NOT NULL REFERENCES pokemons(id_pokedex) ON DELETE CASCADE,
            type_id INTEGER NOT NULL REFERENCES types(id),
            slot INTEGER NOT NULL,
            PRIMARY KEY (pokemon_id, type_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pokemon_skills (
            pokemon_id INTEGER NOT NULL REFERENCES pokemons(id_pokedex) ON DELETE CASCADE,
            skill_id INTEGER NOT NULL REFERENCES skills(id),
            slot INTEGER NOT NULL,
            PRIMARY KEY (pokemon_id, skill_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for reverse lookups
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_pokemon_types_type ON pokemon_types(type_id);
        CREATE INDEX IF NOT EXISTS idx_pokemon_skills_skill ON pokemon_skills(skill_id);
        CREATE INDEX IF NOT EXISTS idx_skills_type_name ON skills(type_name);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    // One connection: every in-memory connection is its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_database_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pokemon.sqlite");
        let pool = init_database(&path, 1).await.unwrap();
        pool.close().await;
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_init_database_reports_unusable_parent() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = init_database(&blocker.join("pokemon.sqlite"), 1).await;
        assert!(matches!(result, Err(sqlx::Error::Io(_))));
    }
}
