use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::db::models::Reaction;
use crate::error::{AppError, AppResult};
use crate::extractors::{ApiPath, ApiQuery, CurrentUser};
use crate::reactions::{self, ReactionKind};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// `?action=like|dislike`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActionQuery {
    pub action: String,
}

impl ActionQuery {
    pub fn kind(&self) -> AppResult<ReactionKind> {
        self.action
            .parse()
            .map_err(|_| AppError::InvalidRequest(format!("unknown action {:?}", self.action)))
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/likes/{id}",
        get(list_reactions).post(react).delete(unreact_by_id),
    )
}

async fn list_reactions(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
) -> AppResult<ApiResponse<Vec<Reaction>>> {
    let conn = state.db.get()?;
    Ok(ApiResponse::ok(reactions::reactions_for_post(&conn, post_id)?))
}

pub(crate) async fn react(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(post_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ActionQuery>,
) -> AppResult<ApiResponse<Reaction>> {
    let kind = query.kind()?;
    let profile_id = caller.require_profile()?;

    let conn = state.db.get()?;
    let reaction = reactions::react(&conn, profile_id, post_id, kind)?;
    Ok(ApiResponse::created(reaction))
}

async fn unreact_by_id(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(reaction_id): ApiPath<i64>,
) -> AppResult<ApiResponse<&'static str>> {
    let profile_id = caller.require_profile()?;

    let conn = state.db.get()?;
    reactions::unreact_by_id(&conn, profile_id, reaction_id)?;
    Ok(ApiResponse::ok("Like deleted"))
}
