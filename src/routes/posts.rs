use axum::extract::State;
use axum::routing::{delete, get};
use axum::Router;

use crate::cascade;
use crate::error::AppResult;
use crate::extractors::{ApiJson, ApiPath, CurrentUser};
use crate::guard;
use crate::reactions;
use crate::routes::{likes, ApiResponse};
use crate::state::AppState;
use crate::store::posts::{self, PostInput, PostView};
use crate::store::{profiles, Input};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post)
                .put(update_post)
                .delete(delete_post)
                .post(likes::react),
        )
        .route("/posts/{id}/reaction", delete(unreact))
        .route("/user_posts/{id}", get(list_user_posts))
}

async fn create_post(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(input): ApiJson<PostInput>,
) -> AppResult<ApiResponse<PostView>> {
    let author_id = caller.require_profile()?;
    let input = input.prepare()?;

    let conn = state.db.get()?;
    let post = posts::create(&conn, author_id, &input)?;
    tracing::info!("Profile {} published post {}", author_id, post.id);
    Ok(ApiResponse::created(posts::view(&conn, post)?))
}

async fn list_posts(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<PostView>>> {
    let conn = state.db.get()?;
    let views = posts::list(&conn)?
        .into_iter()
        .map(|post| posts::view(&conn, post))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(ApiResponse::ok(views))
}

async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<PostView>> {
    let conn = state.db.get()?;
    let post = posts::get(&conn, id)?;
    Ok(ApiResponse::ok(posts::view(&conn, post)?))
}

async fn update_post(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<PostInput>,
) -> AppResult<ApiResponse<PostView>> {
    let conn = state.db.get()?;
    let post = posts::get(&conn, id)?;
    guard::ensure_owner(caller.require_profile()?, &post)?;
    let input = input.prepare()?;

    let post = posts::update(&conn, id, &input)?;
    Ok(ApiResponse::ok(posts::view(&conn, post)?))
}

async fn delete_post(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<&'static str>> {
    let conn = state.db.get()?;
    let post = posts::get(&conn, id)?;
    guard::ensure_owner(caller.require_profile()?, &post)?;

    cascade::delete_post(&conn, post.id)?;
    Ok(ApiResponse::ok("Post deleted"))
}

async fn unreact(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<&'static str>> {
    let profile_id = caller.require_profile()?;

    let conn = state.db.get()?;
    posts::ensure_exists(&conn, id)?;
    reactions::unreact(&conn, profile_id, id)?;
    Ok(ApiResponse::ok("Like deleted"))
}

async fn list_user_posts(
    State(state): State<AppState>,
    ApiPath(profile_id): ApiPath<i64>,
) -> AppResult<ApiResponse<Vec<PostView>>> {
    let conn = state.db.get()?;
    profiles::get(&conn, profile_id)?;
    let views = posts::list_by_author(&conn, profile_id)?
        .into_iter()
        .map(|post| posts::view(&conn, post))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(ApiResponse::ok(views))
}
