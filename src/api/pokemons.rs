//! Pokémon API endpoints.

use axum::extract::State;

use super::{require_name, ApiJson, ApiResponse, ApiResult, Confirmation, IdPath};
use crate::errors::AppError;
use crate::models::{Pokemon, PokemonRequest};
use crate::AppState;

/// GET /api/pokemons - List all Pokémon. An empty table is an empty list.
pub async fn list_pokemons(State(state): State<AppState>) -> ApiResult<Vec<Pokemon>> {
    let pokemons = state.repo.list_pokemons().await?;
    Ok(ApiResponse::new(pokemons))
}

/// GET /api/pokemons/:id - Get a single Pokémon by Pokédex number.
pub async fn get_pokemon(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Pokemon> {
    match state.repo.get_pokemon(id).await? {
        Some(pokemon) => Ok(ApiResponse::new(pokemon)),
        None => Err(AppError::NotFound(format!("Pokemon {} not found", id))),
    }
}

/// POST /api/pokemons - Add a Pokémon.
pub async fn create_pokemon(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PokemonRequest>,
) -> ApiResult<Confirmation> {
    require_name(&request.name, "Pokemon")?;

    let pokemon = state.repo.create_pokemon(&request).await?;
    tracing::info!(id = pokemon.id_pokedex, name = %pokemon.name, "Pokemon created");

    Ok(ApiResponse::created(Confirmation::new(
        pokemon.id_pokedex,
        format!("Pokemon {} created", pokemon.name),
    )))
}

/// PUT /api/pokemons/:id - Replace a Pokémon record.
pub async fn update_pokemon(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    ApiJson(request): ApiJson<PokemonRequest>,
) -> ApiResult<Confirmation> {
    require_name(&request.name, "Pokemon")?;

    let pokemon = state.repo.update_pokemon(id, &request).await?;
    tracing::info!(id, name = %pokemon.name, "Pokemon updated");

    Ok(ApiResponse::new(Confirmation::new(
        id,
        format!("Pokemon {} updated", pokemon.name),
    )))
}

/// DELETE /api/pokemons/:id - Delete a Pokémon.
pub async fn delete_pokemon(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Confirmation> {
    let pokemon = state.repo.delete_pokemon(id).await?;
    tracing::info!(id, name = %pokemon.name, "Pokemon deleted");

    Ok(ApiResponse::new(Confirmation::new(
        id,
        format!("Pokemon {} deleted", pokemon.name),
    )))
}
