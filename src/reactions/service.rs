// Reaction storage - applies domain plans against SQLite
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::domain::{ReactPlan, ReactionCounts, ReactionError, ReactionKind, ReactionState};
use crate::db::models::Reaction;
use crate::error::{AppError, AppResult, Resource};
use crate::guard;
use crate::store::{posts, profiles, unique_violation};

impl From<ReactionError> for AppError {
    fn from(err: ReactionError) -> Self {
        match err {
            ReactionError::Duplicate(kind) => AppError::DuplicateReaction(kind),
            ReactionError::NotFound => AppError::ReactionNotFound,
        }
    }
}

const SELECT_REACTION: &str =
    "SELECT id, profile_id, post_id, action, created_at FROM reactions";

fn row_to_reaction(row: &Row) -> rusqlite::Result<Reaction> {
    Ok(Reaction {
        id: row.get(0)?,
        profile_id: row.get(1)?,
        post_id: row.get(2)?,
        action: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn current(conn: &Connection, profile_id: i64, post_id: i64) -> AppResult<Option<Reaction>> {
    Ok(conn
        .query_row(
            &format!("{} WHERE profile_id = ?1 AND post_id = ?2", SELECT_REACTION),
            params![profile_id, post_id],
            row_to_reaction,
        )
        .optional()?)
}

fn get(conn: &Connection, id: i64) -> AppResult<Reaction> {
    conn.query_row(
        &format!("{} WHERE id = ?1", SELECT_REACTION),
        params![id],
        row_to_reaction,
    )
    .optional()?
    .ok_or(AppError::ReactionNotFound)
}

fn insert(conn: &Connection, profile_id: i64, post_id: i64, kind: ReactionKind) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO reactions (profile_id, post_id, action) VALUES (?1, ?2, ?3)",
        params![profile_id, post_id, kind],
    )
    .map_err(|e| match unique_violation(&e) {
        Some(_) => AppError::DuplicateReaction(kind),
        None => AppError::Database(e),
    })?;
    Ok(conn.last_insert_rowid())
}

/// Like or dislike a post, replacing the opposite reaction if one is held.
///
/// Existence checks, read, delete and insert run in one immediate
/// transaction. A concurrent react that wins the race trips the
/// (profile, post) UNIQUE constraint and this call fails with
/// `DuplicateReaction`.
pub fn react(
    conn: &Connection,
    profile_id: i64,
    post_id: i64,
    kind: ReactionKind,
) -> AppResult<Reaction> {
    conn.execute_batch("BEGIN IMMEDIATE")?;

    let result: AppResult<Reaction> = (|| {
        posts::ensure_exists(conn, post_id)?;
        if !profiles::exists(conn, profile_id)? {
            return Err(AppError::NotFound(Resource::Profile));
        }

        let held = current(conn, profile_id, post_id)?;
        let state = ReactionState::from_current(held.as_ref().map(|r| r.action));
        let plan = state.react(kind)?;

        if let (ReactPlan::Replace { .. }, Some(held)) = (plan, &held) {
            conn.execute("DELETE FROM reactions WHERE id = ?1", params![held.id])?;
        }
        let id = insert(conn, profile_id, post_id, plan.target())?;

        tracing::info!(
            "Reaction on post {} by profile {}: {} -> {}",
            post_id,
            profile_id,
            state.state_name(),
            plan.resulting_state().state_name()
        );

        get(conn, id)
    })();

    match result {
        Ok(reaction) => {
            conn.execute_batch("COMMIT")?;
            Ok(reaction)
        }
        Err(e) => {
            if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                tracing::error!("Rollback after failed react failed: {}", rollback);
            }
            Err(e)
        }
    }
}

/// Remove whatever reaction the profile holds on the post.
pub fn unreact(conn: &Connection, profile_id: i64, post_id: i64) -> AppResult<()> {
    let held = current(conn, profile_id, post_id)?;
    ReactionState::from_current(held.as_ref().map(|r| r.action)).unreact()?;

    let rows = conn.execute(
        "DELETE FROM reactions WHERE profile_id = ?1 AND post_id = ?2",
        params![profile_id, post_id],
    )?;
    if rows == 0 {
        return Err(AppError::ReactionNotFound);
    }
    Ok(())
}

/// Remove a reaction by id; only the profile that left it may do so.
pub fn unreact_by_id(conn: &Connection, caller_profile_id: i64, reaction_id: i64) -> AppResult<()> {
    let reaction = get(conn, reaction_id)?;
    guard::ensure_owner(caller_profile_id, &reaction)?;

    let rows = conn.execute("DELETE FROM reactions WHERE id = ?1", params![reaction.id])?;
    if rows == 0 {
        return Err(AppError::ReactionNotFound);
    }
    Ok(())
}

pub fn reactions_for_post(conn: &Connection, post_id: i64) -> AppResult<Vec<Reaction>> {
    posts::ensure_exists(conn, post_id)?;
    let mut stmt = conn.prepare(&format!(
        "{} WHERE post_id = ?1 ORDER BY created_at DESC, id DESC",
        SELECT_REACTION
    ))?;
    let reactions = stmt
        .query_map(params![post_id], row_to_reaction)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reactions)
}

pub fn reaction_counts(conn: &Connection, post_id: i64) -> AppResult<ReactionCounts> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(action = 'like'), 0), COALESCE(SUM(action = 'dislike'), 0)
         FROM reactions WHERE post_id = ?1",
        params![post_id],
        |row| {
            Ok(ReactionCounts {
                likes: row.get(0)?,
                dislikes: row.get(1)?,
            })
        },
    )?)
}

pub fn delete_reactions_for_post(conn: &Connection, post_id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM reactions WHERE post_id = ?1",
        params![post_id],
    )?)
}

pub fn delete_reactions_for_profile(conn: &Connection, profile_id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM reactions WHERE profile_id = ?1",
        params![profile_id],
    )?)
}
