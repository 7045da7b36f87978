//! Ability (skill) API endpoints.

use axum::extract::State;

use super::{require_name, ApiJson, ApiResponse, ApiResult, Confirmation, IdPath};
use crate::errors::AppError;
use crate::models::{Skill, SkillRequest};
use crate::AppState;

/// GET /api/abilities - List all skills.
pub async fn list_abilities(State(state): State<AppState>) -> ApiResult<Vec<Skill>> {
    let skills = state.repo.list_skills().await?;
    Ok(ApiResponse::new(skills))
}

/// GET /api/abilities/:id - Get a single skill.
pub async fn get_ability(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Skill> {
    match state.repo.get_skill(id).await? {
        Some(skill) => Ok(ApiResponse::new(skill)),
        None => Err(AppError::NotFound(format!("Skill {} not found", id))),
    }
}

/// POST /api/abilities - Create a skill.
pub async fn create_ability(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SkillRequest>,
) -> ApiResult<Skill> {
    require_name(&request.name, "Skill")?;

    let skill = state.repo.create_skill(&request).await?;
    tracing::info!(id = skill.id, name = %skill.name, "Skill created");

    Ok(ApiResponse::created(skill))
}

/// PUT /api/abilities/:id - Replace a skill.
pub async fn update_ability(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    ApiJson(request): ApiJson<SkillRequest>,
) -> ApiResult<Skill> {
    require_name(&request.name, "Skill")?;

    let skill = state.repo.update_skill(id, &request).await?;
    Ok(ApiResponse::new(skill))
}

/// DELETE /api/abilities/:id - Delete a skill no Pokémon knows.
pub async fn delete_ability(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Confirmation> {
    let skill = state.repo.delete_skill(id).await?;
    tracing::info!(id, name = %skill.name, "Skill deleted");

    Ok(ApiResponse::new(Confirmation::new(
        id,
        format!("Skill {} deleted", skill.name),
    )))
}
