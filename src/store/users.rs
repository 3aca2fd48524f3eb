use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;

use super::{classify, is_valid_email, resets, sanitize, Input, LIST_LIMIT};
use crate::db::models::User;
use crate::error::{AppError, AppResult, FieldErrors, Resource};

pub const MIN_PASSWORD_LEN: usize = 6;

const SELECT_USER: &str = "SELECT u.id, u.username, u.email, u.password_hash, u.avatar_path, p.id,
            u.created_at, u.updated_at
     FROM users u LEFT JOIN profiles p ON p.user_id = u.id";

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        avatar_path: row.get(4)?,
        profile_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if email.is_empty() {
        errors.add("Required_email", "Required Email");
    } else if !is_valid_email(email) {
        errors.add("Invalid_email", "Invalid Email");
    }
}

fn check_new_password(password: &str, errors: &mut FieldErrors) {
    if password.is_empty() {
        errors.add("Required_password", "Required Password");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("Invalid_password", "Password should be atleast 6 characters");
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Input for NewUser {
    fn sanitized(self) -> Self {
        Self {
            username: sanitize(&self.username),
            email: sanitize(&self.email),
            password: self.password,
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.username.is_empty() {
            errors.add("Required_username", "Required Username");
        }
        check_new_password(&self.password, &mut errors);
        check_email(&self.email, &mut errors);
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Input for Credentials {
    fn sanitized(self) -> Self {
        Self {
            email: sanitize(&self.email),
            password: self.password,
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.add("Required_password", "Required Password");
        }
        errors
    }
}

/// Account update: email, plus an optional password change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    pub email: String,
    pub current_password: String,
    pub new_password: String,
}

impl UserUpdate {
    pub fn changes_password(&self) -> bool {
        !self.current_password.is_empty() || !self.new_password.is_empty()
    }
}

impl Input for UserUpdate {
    fn sanitized(self) -> Self {
        Self {
            email: sanitize(&self.email),
            ..self
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_email(&self.email, &mut errors);
        if self.changes_password() {
            if self.current_password.is_empty() {
                errors.add("Empty_current", "Please Provide current password");
            }
            if self.new_password.chars().count() < MIN_PASSWORD_LEN {
                errors.add("Invalid_password", "Password should be atleast 6 characters");
            }
        }
        errors
    }
}

pub fn create(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
) -> AppResult<User> {
    conn.execute(
        "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
        params![username, email, password_hash],
    )
    .map_err(classify)?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> AppResult<User> {
    conn.query_row(
        &format!("{} WHERE u.id = ?1", SELECT_USER),
        params![id],
        row_to_user,
    )
    .optional()?
    .ok_or(AppError::NotFound(Resource::User))
}

pub fn find_by_email(conn: &Connection, email: &str) -> AppResult<Option<User>> {
    Ok(conn
        .query_row(
            &format!("{} WHERE u.email = ?1", SELECT_USER),
            params![email],
            row_to_user,
        )
        .optional()?)
}

pub fn list(conn: &Connection) -> AppResult<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY u.created_at DESC, u.id DESC LIMIT ?1",
        SELECT_USER
    ))?;
    let users = stmt
        .query_map(params![LIST_LIMIT], row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Change the email and, when given, the password hash.
pub fn update(
    conn: &Connection,
    id: i64,
    email: &str,
    password_hash: Option<&str>,
) -> AppResult<User> {
    let previous = get(conn, id)?;
    let rows = conn
        .execute(
            "UPDATE users SET email = ?2, password_hash = COALESCE(?3, password_hash),
                 updated_at = datetime('now')
             WHERE id = ?1",
            params![id, email, password_hash],
        )
        .map_err(classify)?;
    if rows == 0 {
        return Err(AppError::NotFound(Resource::User));
    }
    // Outstanding reset links were issued to the old address.
    if previous.email != email {
        resets::delete_for_email(conn, &previous.email)?;
    }
    get(conn, id)
}

pub fn set_avatar(conn: &Connection, id: i64, avatar_path: &str) -> AppResult<User> {
    let rows = conn.execute(
        "UPDATE users SET avatar_path = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![id, avatar_path],
    )?;
    if rows == 0 {
        return Err(AppError::NotFound(Resource::User));
    }
    get(conn, id)
}

pub fn set_password_by_email(conn: &Connection, email: &str, password_hash: &str) -> AppResult<usize> {
    Ok(conn.execute(
        "UPDATE users SET password_hash = ?2, updated_at = datetime('now') WHERE email = ?1",
        params![email, password_hash],
    )?)
}

/// Row only; sessions and the profile must already be gone.
pub(crate) fn delete(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM users WHERE id = ?1", params![id])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::store::fixtures;

    #[test]
    fn create_and_get() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let user = create(&conn, "ann", "ann@example.com", "hash").unwrap();
        assert_eq!(user.username, "ann");
        assert_eq!(user.profile_id, None);

        let fetched = get(&conn, user.id).unwrap();
        assert_eq!(fetched.email, "ann@example.com");
        assert_eq!(fetched.password_hash, "hash");
    }

    #[test]
    fn profile_id_is_derived() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let (user_id, profile_id) = fixtures::author(&conn, "ann");
        assert_eq!(get(&conn, user_id).unwrap().profile_id, Some(profile_id));
    }

    #[test]
    fn duplicate_email_is_a_field_error() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        create(&conn, "ann", "ann@example.com", "h").unwrap();
        let err = create(&conn, "bob", "ann@example.com", "h").unwrap_err();
        match err {
            AppError::Validation(errors) => assert!(errors.contains("Taken_email")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_user_is_not_found() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        assert!(matches!(
            get(&conn, 99),
            Err(AppError::NotFound(Resource::User))
        ));
        assert!(find_by_email(&conn, "nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn update_keeps_hash_unless_given() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let user = create(&conn, "ann", "ann@example.com", "old").unwrap();

        let user = update(&conn, user.id, "ann@new.io", None).unwrap();
        assert_eq!(user.email, "ann@new.io");
        assert_eq!(user.password_hash, "old");

        let user = update(&conn, user.id, "ann@new.io", Some("new")).unwrap();
        assert_eq!(user.password_hash, "new");
    }

    #[test]
    fn new_user_validation_collects_every_field() {
        let errors = NewUser::default().validate();
        assert!(errors.contains("Required_username"));
        assert!(errors.contains("Required_password"));
        assert!(errors.contains("Required_email"));

        let input = NewUser {
            username: "ann".into(),
            email: "not-an-email".into(),
            password: "123".into(),
        };
        let errors = input.validate();
        assert!(errors.contains("Invalid_email"));
        assert!(errors.contains("Invalid_password"));
        assert!(!errors.contains("Required_username"));
    }

    #[test]
    fn prepare_sanitizes_before_validating() {
        let input = NewUser {
            username: "  <ann>  ".into(),
            email: " ann@example.com ".into(),
            password: " secret ".into(),
        }
        .prepare()
        .unwrap();
        assert_eq!(input.username, "&lt;ann&gt;");
        assert_eq!(input.email, "ann@example.com");
        assert_eq!(input.password, " secret ");
    }

    #[test]
    fn password_change_needs_current_password() {
        let input = UserUpdate {
            email: "ann@example.com".into(),
            current_password: String::new(),
            new_password: "longenough".into(),
        };
        assert!(input.validate().contains("Empty_current"));

        let plain = UserUpdate {
            email: "ann@example.com".into(),
            ..Default::default()
        };
        assert!(plain.validate().is_empty());
    }

    #[test]
    fn email_change_revokes_reset_links() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let user = create(&conn, "ann", "ann@example.com", "h").unwrap();
        resets::create(&conn, "ann@example.com", "old-link").unwrap();

        update(&conn, user.id, "ann@example.com", None).unwrap();
        assert!(resets::find_by_token(&conn, "old-link").unwrap().is_some());

        update(&conn, user.id, "ann@new.example.com", None).unwrap();
        assert!(resets::find_by_token(&conn, "old-link").unwrap().is_none());
    }
}
