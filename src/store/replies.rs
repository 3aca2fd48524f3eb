use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::Reply;
use crate::error::{AppError, AppResult, Resource};

const SELECT_REPLY: &str =
    "SELECT id, comment_id, post_id, profile_id, body, created_at, updated_at FROM replies";

fn row_to_reply(row: &Row) -> rusqlite::Result<Reply> {
    Ok(Reply {
        id: row.get(0)?,
        comment_id: row.get(1)?,
        post_id: row.get(2)?,
        profile_id: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub fn create(
    conn: &Connection,
    comment_id: i64,
    post_id: i64,
    profile_id: i64,
    body: &str,
) -> AppResult<Reply> {
    conn.execute(
        "INSERT INTO replies (comment_id, post_id, profile_id, body) VALUES (?1, ?2, ?3, ?4)",
        params![comment_id, post_id, profile_id, body],
    )?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Reply> {
    conn.query_row(
        &format!("{} WHERE id = ?1", SELECT_REPLY),
        params![id],
        row_to_reply,
    )
    .optional()?
    .ok_or(AppError::NotFound(Resource::Reply))
}

/// A reply that must hang off `comment_id`.
pub fn get_on_comment(conn: &Connection, comment_id: i64, id: i64) -> AppResult<Reply> {
    let reply = get(conn, id)?;
    if reply.comment_id != comment_id {
        return Err(AppError::NotFound(Resource::Reply));
    }
    Ok(reply)
}

pub fn list_for_comment(conn: &Connection, comment_id: i64) -> AppResult<Vec<Reply>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE comment_id = ?1 ORDER BY created_at DESC, id DESC",
        SELECT_REPLY
    ))?;
    let replies = stmt
        .query_map(params![comment_id], row_to_reply)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(replies)
}

pub fn update(conn: &Connection, id: i64, body: &str) -> AppResult<Reply> {
    let rows = conn.execute(
        "UPDATE replies SET body = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![id, body],
    )?;
    if rows == 0 {
        return Err(AppError::NotFound(Resource::Reply));
    }
    get(conn, id)
}

pub(crate) fn delete(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM replies WHERE id = ?1", params![id])?)
}

pub(crate) fn delete_for_comment(conn: &Connection, comment_id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM replies WHERE comment_id = ?1",
        params![comment_id],
    )?)
}

/// Replies under any comment on the post, whoever wrote them.
pub(crate) fn delete_for_post(conn: &Connection, post_id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM replies
         WHERE post_id = ?1 OR comment_id IN (SELECT id FROM comments WHERE post_id = ?1)",
        params![post_id],
    )?)
}

/// Replies hanging off comments the profile wrote.
pub(crate) fn delete_on_comments_by(conn: &Connection, profile_id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM replies
         WHERE comment_id IN (SELECT id FROM comments WHERE profile_id = ?1)",
        params![profile_id],
    )?)
}

pub(crate) fn delete_by_profile(conn: &Connection, profile_id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM replies WHERE profile_id = ?1",
        params![profile_id],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::store::fixtures;

    #[test]
    fn create_and_list_for_comment() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let (_, author) = fixtures::author(&conn, "ann");
        let post = fixtures::post(&conn, author, "Post");
        let comment = fixtures::comment(&conn, post, author);

        let reply = create(&conn, comment, post, author, "thanks").unwrap();
        assert_eq!(reply.comment_id, comment);
        assert_eq!(list_for_comment(&conn, comment).unwrap().len(), 1);
        assert_eq!(update(&conn, reply.id, "edited").unwrap().body, "edited");
    }

    #[test]
    fn reply_must_belong_to_comment() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let (_, author) = fixtures::author(&conn, "ann");
        let post = fixtures::post(&conn, author, "Post");
        let comment = fixtures::comment(&conn, post, author);
        let other = fixtures::comment(&conn, post, author);
        let reply = fixtures::reply(&conn, comment, post, author);

        assert!(matches!(
            get_on_comment(&conn, other, reply),
            Err(AppError::NotFound(Resource::Reply))
        ));
    }

    #[test]
    fn bulk_deletes_pick_the_right_rows() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let (_, ann) = fixtures::author(&conn, "ann");
        let (_, bob) = fixtures::author(&conn, "bob");
        let post = fixtures::post(&conn, ann, "Post");
        let anns_comment = fixtures::comment(&conn, post, ann);
        let bobs_comment = fixtures::comment(&conn, post, bob);
        fixtures::reply(&conn, anns_comment, post, bob);
        fixtures::reply(&conn, bobs_comment, post, ann);

        assert_eq!(delete_on_comments_by(&conn, ann).unwrap(), 1);
        assert_eq!(delete_by_profile(&conn, ann).unwrap(), 1);
        assert_eq!(fixtures::count(&conn, "replies"), 0);
        assert_eq!(delete_for_post(&conn, post).unwrap(), 0);
    }
}
