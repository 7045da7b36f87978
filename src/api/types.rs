//! Type API endpoints.

use axum::extract::State;

use super::{require_name, ApiJson, ApiResponse, ApiResult, Confirmation, IdPath};
use crate::errors::AppError;
use crate::models::{CreateTypeRequest, PokemonType, UpdateTypeRequest};
use crate::AppState;

/// GET /api/types - List all types.
pub async fn list_types(State(state): State<AppState>) -> ApiResult<Vec<PokemonType>> {
    let types = state.repo.list_types().await?;
    Ok(ApiResponse::new(types))
}

/// GET /api/types/:id - Get a single type.
pub async fn get_type(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<PokemonType> {
    match state.repo.get_type(id).await? {
        Some(pokemon_type) => Ok(ApiResponse::new(pokemon_type)),
        None => Err(AppError::NotFound(format!("Type {} not found", id))),
    }
}

/// POST /api/types - Create a type.
pub async fn create_type(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTypeRequest>,
) -> ApiResult<PokemonType> {
    require_name(&request.name, "Type")?;

    let pokemon_type = state.repo.create_type(&request).await?;
    tracing::info!(id = pokemon_type.id, name = %pokemon_type.name, "Type created");

    Ok(ApiResponse::created(pokemon_type))
}

/// PUT /api/types/:id - Rename a type.
pub async fn update_type(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    ApiJson(request): ApiJson<UpdateTypeRequest>,
) -> ApiResult<PokemonType> {
    require_name(&request.name, "Type")?;

    let pokemon_type = state.repo.update_type(id, &request).await?;
    Ok(ApiResponse::new(pokemon_type))
}

/// DELETE /api/types/:id - Delete an unreferenced type.
pub async fn delete_type(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Confirmation> {
    let pokemon_type = state.repo.delete_type(id).await?;
    tracing::info!(id, name = %pokemon_type.name, "Type deleted");

    Ok(ApiResponse::new(Confirmation::new(
        id,
        format!("Type {} deleted", pokemon_type.name),
    )))
}
