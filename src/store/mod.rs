//! Entity store: per-entity SQL on a borrowed connection.
//!
//! Functions here never delete dependents; removing anything that other rows
//! point at goes through `crate::cascade`.

pub mod comments;
pub mod posts;
pub mod profiles;
pub mod replies;
pub mod resets;
pub mod users;

use rusqlite::ErrorCode;

use crate::error::{AppError, AppResult, FieldErrors};

/// Upper bound for the unfiltered listing endpoints.
pub const LIST_LIMIT: i64 = 100;

/// Request payloads that are cleaned and checked before they reach SQL.
pub trait Input: Sized {
    fn sanitized(self) -> Self;
    fn validate(&self) -> FieldErrors;

    fn prepare(self) -> AppResult<Self> {
        let input = self.sanitized();
        input.validate().into_result()?;
        Ok(input)
    }
}

/// Trim and HTML-escape free text before it is stored.
pub fn sanitize(input: &str) -> String {
    let trimmed = input.trim();
    let mut out = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Loose shape check: one `@`, a non-empty local part, a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// `table.column` named by a UNIQUE failure, if `err` is one.
pub fn unique_violation(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) if e.code == ErrorCode::ConstraintViolation => {
            msg.strip_prefix("UNIQUE constraint failed: ")
        }
        _ => None,
    }
}

/// Map known uniqueness failures to field errors; everything else is storage.
pub fn classify(err: rusqlite::Error) -> AppError {
    let field = match unique_violation(&err) {
        Some("users.username") => Some(("Taken_username", "Username Already Taken")),
        Some("users.email") => Some(("Taken_email", "Email Already Taken")),
        Some("posts.title") => Some(("Taken_title", "Title Already Taken")),
        Some("profiles.user_id") => Some(("Profile_exists", "You already have a profile")),
        _ => None,
    };
    match field {
        Some((key, message)) => AppError::Validation(FieldErrors::single(key, message)),
        None => AppError::Database(err),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn sanitize_trims_and_escapes() {
        assert_eq!(sanitize("  hello  "), "hello");
        assert_eq!(
            sanitize("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&#34;Tom&#34; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(sanitize("   "), "");
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ann@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("ann"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ann@example"));
        assert!(!is_valid_email("ann@@example.com"));
        assert!(!is_valid_email("ann @example.com"));
        assert!(!is_valid_email("ann@.com"));
    }

    #[test]
    fn classify_maps_unique_columns() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        fixtures::author(&conn, "ann");

        let err = conn
            .execute(
                "INSERT INTO users (username, email, password_hash) VALUES ('ann', 'other@example.com', 'x')",
                [],
            )
            .unwrap_err();
        assert_eq!(unique_violation(&err), Some("users.username"));
        match classify(err) {
            AppError::Validation(errors) => assert!(errors.contains("Taken_username")),
            other => panic!("unexpected {:?}", other),
        }

        let err = conn
            .execute(
                "INSERT INTO users (username, email, password_hash) VALUES ('bob', 'ann@example.com', 'x')",
                [],
            )
            .unwrap_err();
        match classify(err) {
            AppError::Validation(errors) => assert!(errors.contains("Taken_email")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn classify_leaves_foreign_key_failures_as_storage() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        let err = conn
            .execute(
                "INSERT INTO comments (post_id, profile_id, body) VALUES (42, 42, 'x')",
                [],
            )
            .unwrap_err();
        assert!(unique_violation(&err).is_none());
        assert!(matches!(classify(err), AppError::Database(_)));
    }
}
