use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;

use super::{sanitize, Input};
use crate::db::models::Comment;
use crate::error::{AppError, AppResult, FieldErrors, Resource};

const SELECT_COMMENT: &str =
    "SELECT id, post_id, profile_id, body, created_at, updated_at FROM comments";

fn row_to_comment(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        profile_id: row.get(2)?,
        body: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Body of a comment or a reply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BodyInput {
    pub body: String,
}

impl Input for BodyInput {
    fn sanitized(self) -> Self {
        Self {
            body: sanitize(&self.body),
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.body.is_empty() {
            errors.add("Required_body", "Required Comment");
        }
        errors
    }
}

pub fn create(conn: &Connection, post_id: i64, profile_id: i64, body: &str) -> AppResult<Comment> {
    conn.execute(
        "INSERT INTO comments (post_id, profile_id, body) VALUES (?1, ?2, ?3)",
        params![post_id, profile_id, body],
    )?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Comment> {
    conn.query_row(
        &format!("{} WHERE id = ?1", SELECT_COMMENT),
        params![id],
        row_to_comment,
    )
    .optional()?
    .ok_or(AppError::NotFound(Resource::Comment))
}

/// A comment that must also belong to `post_id`.
pub fn get_on_post(conn: &Connection, post_id: i64, id: i64) -> AppResult<Comment> {
    let comment = get(conn, id)?;
    if comment.post_id != post_id {
        return Err(AppError::NotFound(Resource::Comment));
    }
    Ok(comment)
}

pub fn list_for_post(conn: &Connection, post_id: i64) -> AppResult<Vec<Comment>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE post_id = ?1 ORDER BY created_at DESC, id DESC",
        SELECT_COMMENT
    ))?;
    let comments = stmt
        .query_map(params![post_id], row_to_comment)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn update(conn: &Connection, id: i64, body: &str) -> AppResult<Comment> {
    let rows = conn.execute(
        "UPDATE comments SET body = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![id, body],
    )?;
    if rows == 0 {
        return Err(AppError::NotFound(Resource::Comment));
    }
    get(conn, id)
}

pub(crate) fn delete(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?)
}

pub(crate) fn delete_for_post(conn: &Connection, post_id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM comments WHERE post_id = ?1", params![post_id])?)
}

pub(crate) fn delete_by_profile(conn: &Connection, profile_id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM comments WHERE profile_id = ?1",
        params![profile_id],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::store::fixtures;

    #[test]
    fn create_list_update() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let (_, author) = fixtures::author(&conn, "ann");
        let post = fixtures::post(&conn, author, "Post");

        let first = create(&conn, post, author, "first").unwrap();
        let second = create(&conn, post, author, "second").unwrap();
        let listed: Vec<i64> = list_for_post(&conn, post).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(listed, vec![second.id, first.id]);

        let edited = update(&conn, first.id, "edited").unwrap();
        assert_eq!(edited.body, "edited");
    }

    #[test]
    fn comment_must_belong_to_post() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let (_, author) = fixtures::author(&conn, "ann");
        let post = fixtures::post(&conn, author, "One");
        let other = fixtures::post(&conn, author, "Two");
        let comment = create(&conn, post, author, "hi").unwrap();

        assert!(get_on_post(&conn, post, comment.id).is_ok());
        assert!(matches!(
            get_on_post(&conn, other, comment.id),
            Err(AppError::NotFound(Resource::Comment))
        ));
    }

    #[test]
    fn comment_on_missing_post_is_a_storage_error() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let (_, author) = fixtures::author(&conn, "ann");
        assert!(matches!(
            create(&conn, 404, author, "orphan"),
            Err(AppError::Database(_))
        ));
    }

    #[test]
    fn body_is_required() {
        let err = BodyInput { body: "   ".into() }.prepare().unwrap_err();
        match err {
            AppError::Validation(errors) => assert!(errors.contains("Required_body")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
