use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::AppResult;

/// Identity behind a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub profile_id: Option<i64>,
}

/// Create a new session for a user. Returns the session token.
pub fn create(conn: &Connection, user_id: i64, hours: u64) -> AppResult<String> {
    let token = generate_token();

    conn.execute(
        "INSERT INTO sessions (user_id, token, expires_at) VALUES (?1, ?2, datetime('now', ?3))",
        params![user_id, token, format!("+{} hours", hours)],
    )?;

    tracing::debug!("Session issued for user {}", user_id);
    Ok(token)
}

/// Resolve an unexpired token to its user.
pub fn resolve(conn: &Connection, token: &str) -> AppResult<Option<SessionUser>> {
    Ok(conn
        .query_row(
            "SELECT u.id, u.username, u.email, p.id FROM sessions s
             JOIN users u ON u.id = s.user_id
             LEFT JOIN profiles p ON p.user_id = u.id
             WHERE s.token = ?1 AND s.expires_at > datetime('now')",
            params![token],
            |row| {
                Ok(SessionUser {
                    user_id: row.get(0)?,
                    username: row.get(1)?,
                    email: row.get(2)?,
                    profile_id: row.get(3)?,
                })
            },
        )
        .optional()?)
}

/// Delete a session by token.
pub fn delete(conn: &Connection, token: &str) -> AppResult<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

pub(crate) fn delete_for_user(conn: &Connection, user_id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM sessions WHERE user_id = ?1",
        params![user_id],
    )?)
}

/// Generate a cryptographically random 32-byte hex token.
pub(crate) fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::store::fixtures;

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn resolve_carries_profile_id() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let (user_id, profile_id) = fixtures::author(&conn, "ann");
        let token = create(&conn, user_id, 24).unwrap();

        let user = resolve(&conn, &token).unwrap().unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.username, "ann");
        assert_eq!(user.profile_id, Some(profile_id));
    }

    #[test]
    fn expired_or_deleted_sessions_do_not_resolve() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let (user_id, _) = fixtures::author(&conn, "ann");

        let expired = create(&conn, user_id, 0).unwrap();
        assert!(resolve(&conn, &expired).unwrap().is_none());

        let token = create(&conn, user_id, 1).unwrap();
        delete(&conn, &token).unwrap();
        assert!(resolve(&conn, &token).unwrap().is_none());
        assert!(resolve(&conn, "bogus").unwrap().is_none());
    }
}
