use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::PasswordReset;
use crate::error::AppResult;

pub fn create(conn: &Connection, email: &str, token: &str) -> AppResult<PasswordReset> {
    conn.execute(
        "INSERT INTO password_resets (email, token) VALUES (?1, ?2)",
        params![email, token],
    )?;
    let id = conn.last_insert_rowid();
    Ok(conn.query_row(
        "SELECT id, email, token, created_at FROM password_resets WHERE id = ?1",
        params![id],
        |row| {
            Ok(PasswordReset {
                id: row.get(0)?,
                email: row.get(1)?,
                token: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )?)
}

pub fn find_by_token(conn: &Connection, token: &str) -> AppResult<Option<PasswordReset>> {
    Ok(conn
        .query_row(
            "SELECT id, email, token, created_at FROM password_resets WHERE token = ?1",
            params![token],
            |row| {
                Ok(PasswordReset {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    token: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        )
        .optional()?)
}

pub fn delete(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM password_resets WHERE id = ?1",
        params![id],
    )?)
}

pub(crate) fn delete_for_email(conn: &Connection, email: &str) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM password_resets WHERE email = ?1",
        params![email],
    )?)
}
