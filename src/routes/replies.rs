use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::cascade;
use crate::db::models::Reply;
use crate::error::AppResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::guard;
use crate::routes::comments::CommentQuery;
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::store::comments::{self, BodyInput};
use crate::store::{posts, replies, Input};

/// `?commentID=&replyID=`
#[derive(Debug, Deserialize)]
pub struct ReplyQuery {
    #[serde(rename = "commentID")]
    pub comment_id: i64,
    #[serde(rename = "replyID")]
    pub reply_id: i64,
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/comments/replyes/{post_id}",
        get(list_replies)
            .post(create_reply)
            .put(update_reply)
            .delete(delete_reply),
    )
}

async fn create_reply(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(post_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<CommentQuery>,
    ApiJson(input): ApiJson<BodyInput>,
) -> AppResult<ApiResponse<Reply>> {
    let profile_id = caller.require_profile()?;

    let conn = state.db.get()?;
    posts::ensure_exists(&conn, post_id)?;
    let comment = comments::get_on_post(&conn, post_id, query.comment_id)?;
    let input = input.prepare()?;

    let reply = replies::create(&conn, comment.id, post_id, profile_id, &input.body)?;
    Ok(ApiResponse::created(reply))
}

async fn list_replies(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<CommentQuery>,
) -> AppResult<ApiResponse<Vec<Reply>>> {
    let conn = state.db.get()?;
    posts::ensure_exists(&conn, post_id)?;
    let comment = comments::get_on_post(&conn, post_id, query.comment_id)?;
    Ok(ApiResponse::ok(replies::list_for_comment(&conn, comment.id)?))
}

async fn update_reply(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(post_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ReplyQuery>,
    ApiJson(input): ApiJson<BodyInput>,
) -> AppResult<ApiResponse<Reply>> {
    let conn = state.db.get()?;
    posts::ensure_exists(&conn, post_id)?;
    let comment = comments::get_on_post(&conn, post_id, query.comment_id)?;
    let reply = replies::get_on_comment(&conn, comment.id, query.reply_id)?;
    guard::ensure_owner(caller.require_profile()?, &reply)?;
    let input = input.prepare()?;

    Ok(ApiResponse::ok(replies::update(&conn, reply.id, &input.body)?))
}

async fn delete_reply(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(post_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ReplyQuery>,
) -> AppResult<ApiResponse<&'static str>> {
    let conn = state.db.get()?;
    posts::ensure_exists(&conn, post_id)?;
    let comment = comments::get_on_post(&conn, post_id, query.comment_id)?;
    let reply = replies::get_on_comment(&conn, comment.id, query.reply_id)?;
    guard::ensure_owner(caller.require_profile()?, &reply)?;

    cascade::delete_reply(&conn, reply.id)?;
    Ok(ApiResponse::ok("Reply deleted"))
}
