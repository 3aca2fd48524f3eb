use axum::extract::{Multipart, State};
use axum::routing::{get, put};
use axum::Router;
use serde::Deserialize;

use crate::cascade;
use crate::db::models::Profile;
use crate::error::AppResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::guard;
use crate::routes::{read_image, ApiResponse};
use crate::state::AppState;
use crate::store::profiles::{self, PictureSlot, ProfileInput};
use crate::store::Input;

#[derive(Debug, Deserialize)]
pub struct PictureQuery {
    #[serde(rename = "type")]
    pub slot: PictureSlot,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profiles", get(list_profiles).post(create_profile))
        .route(
            "/profiles/{id}",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/avatar/profiles/{id}", put(update_picture))
}

async fn create_profile(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(input): ApiJson<ProfileInput>,
) -> AppResult<ApiResponse<Profile>> {
    let input = input.prepare()?;

    let conn = state.db.get()?;
    let profile = profiles::create(&conn, caller.id, &caller.username, &input)?;
    tracing::info!("Created profile {} for user {}", profile.id, caller.id);
    Ok(ApiResponse::created(profile))
}

async fn list_profiles(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<Profile>>> {
    let conn = state.db.get()?;
    Ok(ApiResponse::ok(profiles::list(&conn)?))
}

async fn get_profile(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Profile>> {
    let conn = state.db.get()?;
    Ok(ApiResponse::ok(profiles::get(&conn, id)?))
}

async fn update_profile(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ProfileInput>,
) -> AppResult<ApiResponse<Profile>> {
    let conn = state.db.get()?;
    let profile = profiles::get(&conn, id)?;
    guard::ensure_account_owner(caller.id, &profile)?;
    let input = input.prepare()?;

    Ok(ApiResponse::ok(profiles::update(&conn, id, &input)?))
}

async fn update_picture(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PictureQuery>,
    multipart: Multipart,
) -> AppResult<ApiResponse<Profile>> {
    {
        let conn = state.db.get()?;
        let profile = profiles::get(&conn, id)?;
        guard::ensure_account_owner(caller.id, &profile)?;
    }

    let upload = read_image(multipart).await?;
    upload.validate(state.config.storage.max_upload_bytes)?;
    let folder = match query.slot {
        PictureSlot::ProfilePic => "profiles",
        PictureSlot::CoverPic => "covers",
    };
    let key = upload.object_key(folder);
    let url = state.blobs.upload(upload.bytes, &key).await?;

    let conn = state.db.get()?;
    Ok(ApiResponse::ok(profiles::set_picture(
        &conn, id, query.slot, &url,
    )?))
}

async fn delete_profile(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<&'static str>> {
    let conn = state.db.get()?;
    let profile = profiles::get(&conn, id)?;
    guard::ensure_account_owner(caller.id, &profile)?;

    cascade::delete_profile(&conn, profile.id)?;
    Ok(ApiResponse::ok("User deleted"))
}
