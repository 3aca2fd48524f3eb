use axum::extract::{Multipart, State};
use axum::routing::{get, put};
use axum::Router;

use crate::auth::password;
use crate::cascade;
use crate::db::models::User;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::extractors::{ApiJson, ApiPath, CurrentUser};
use crate::guard;
use crate::routes::{read_image, ApiResponse};
use crate::state::AppState;
use crate::store::users::{self, NewUser, UserUpdate};
use crate::store::Input;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/avatar/users/{id}", put(update_avatar))
}

async fn create_user(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewUser>,
) -> AppResult<ApiResponse<User>> {
    let input = input.prepare()?;
    let hash = password::hash(&input.password)?;

    let conn = state.db.get()?;
    let user = users::create(&conn, &input.username, &input.email, &hash)?;
    tracing::info!("Created user {} ({})", user.id, user.username);
    Ok(ApiResponse::created(user))
}

async fn list_users(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<User>>> {
    let conn = state.db.get()?;
    Ok(ApiResponse::ok(users::list(&conn)?))
}

async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<User>> {
    let conn = state.db.get()?;
    Ok(ApiResponse::ok(users::get(&conn, id)?))
}

async fn update_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UserUpdate>,
) -> AppResult<ApiResponse<User>> {
    let conn = state.db.get()?;
    let user = users::get(&conn, id)?;
    guard::ensure_account_owner(caller.id, &user)?;
    let input = input.prepare()?;

    let new_hash = if input.changes_password() {
        if !password::verify(&user.password_hash, &input.current_password) {
            return Err(AppError::Validation(FieldErrors::single(
                "Password_mismatch",
                "The password not correct",
            )));
        }
        Some(password::hash(&input.new_password)?)
    } else {
        None
    };

    let user = users::update(&conn, id, &input.email, new_hash.as_deref())?;
    Ok(ApiResponse::ok(user))
}

async fn update_avatar(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    multipart: Multipart,
) -> AppResult<ApiResponse<User>> {
    {
        let conn = state.db.get()?;
        let user = users::get(&conn, id)?;
        guard::ensure_account_owner(caller.id, &user)?;
    }

    let upload = read_image(multipart).await?;
    upload.validate(state.config.storage.max_upload_bytes)?;
    let key = upload.object_key("avatars");
    let url = state.blobs.upload(upload.bytes, &key).await?;

    let conn = state.db.get()?;
    Ok(ApiResponse::ok(users::set_avatar(&conn, id, &url)?))
}

async fn delete_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<&'static str>> {
    let conn = state.db.get()?;
    let user = users::get(&conn, id)?;
    guard::ensure_account_owner(caller.id, &user)?;

    cascade::delete_user(&conn, user.id)?;
    Ok(ApiResponse::ok("User deleted"))
}
