use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::cascade;
use crate::db::models::Comment;
use crate::error::AppResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::guard;
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::store::comments::{self, BodyInput};
use crate::store::{posts, Input};

/// `?commentID=`
#[derive(Debug, Deserialize)]
pub struct CommentQuery {
    #[serde(rename = "commentID")]
    pub comment_id: i64,
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/comments/{post_id}",
        get(list_comments)
            .post(create_comment)
            .put(update_comment)
            .delete(delete_comment),
    )
}

async fn create_comment(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(post_id): ApiPath<i64>,
    ApiJson(input): ApiJson<BodyInput>,
) -> AppResult<ApiResponse<Comment>> {
    let profile_id = caller.require_profile()?;

    let conn = state.db.get()?;
    posts::ensure_exists(&conn, post_id)?;
    let input = input.prepare()?;

    let comment = comments::create(&conn, post_id, profile_id, &input.body)?;
    Ok(ApiResponse::created(comment))
}

async fn list_comments(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
) -> AppResult<ApiResponse<Vec<Comment>>> {
    let conn = state.db.get()?;
    posts::ensure_exists(&conn, post_id)?;
    Ok(ApiResponse::ok(comments::list_for_post(&conn, post_id)?))
}

async fn update_comment(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(post_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<CommentQuery>,
    ApiJson(input): ApiJson<BodyInput>,
) -> AppResult<ApiResponse<Comment>> {
    let conn = state.db.get()?;
    posts::ensure_exists(&conn, post_id)?;
    let comment = comments::get_on_post(&conn, post_id, query.comment_id)?;
    guard::ensure_owner(caller.require_profile()?, &comment)?;
    let input = input.prepare()?;

    Ok(ApiResponse::ok(comments::update(&conn, comment.id, &input.body)?))
}

async fn delete_comment(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(post_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<CommentQuery>,
) -> AppResult<ApiResponse<&'static str>> {
    let conn = state.db.get()?;
    posts::ensure_exists(&conn, post_id)?;
    let comment = comments::get_on_post(&conn, post_id, query.comment_id)?;
    guard::ensure_owner(caller.require_profile()?, &comment)?;

    cascade::delete_comment(&conn, comment.id)?;
    Ok(ApiResponse::ok("Comment deleted"))
}
