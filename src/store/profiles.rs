use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;

use super::{classify, sanitize, Input, LIST_LIMIT};
use crate::db::models::{Profile, SocialLinks};
use crate::error::{AppError, AppResult, FieldErrors, Resource};

const SELECT_PROFILE: &str = "SELECT id, user_id, username, name, title, bio, profile_pic, cover_pic,
            social_links, created_at, updated_at
     FROM profiles";

fn row_to_profile(row: &Row) -> rusqlite::Result<Profile> {
    let links: Option<String> = row.get(8)?;
    let social_links = match links {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?,
        None => SocialLinks::default(),
    };
    Ok(Profile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        name: row.get(3)?,
        title: row.get(4)?,
        bio: row.get(5)?,
        profile_pic: row.get(6)?,
        cover_pic: row.get(7)?,
        social_links,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn links_json(links: &SocialLinks) -> AppResult<String> {
    serde_json::to_string(links).map_err(|e| AppError::Internal(e.to_string()))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileInput {
    pub name: String,
    pub title: String,
    pub bio: String,
    pub social_links: SocialLinks,
}

impl Input for ProfileInput {
    fn sanitized(self) -> Self {
        let clean = |v: Option<String>| v.map(|s| sanitize(&s)).filter(|s| !s.is_empty());
        let links = self.social_links;
        Self {
            name: sanitize(&self.name),
            title: sanitize(&self.title),
            bio: sanitize(&self.bio),
            social_links: SocialLinks {
                website: clean(links.website),
                github: clean(links.github),
                linkedin: clean(links.linkedin),
                twitter: clean(links.twitter),
                facebook: clean(links.facebook),
                instagram: clean(links.instagram),
            },
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let name_len = self.name.chars().count();
        if name_len == 0 {
            errors.add("Required_name", "Name is required");
        } else if !(2..=50).contains(&name_len) {
            errors.add("Name_length", "Name should be between 2 and 50 characters");
        }
        if self.title.is_empty() {
            errors.add("Required_title", "Title is required");
        } else if self.title.chars().count() > 100 {
            errors.add("Title_length", "Title should not exceed 100 characters");
        }
        if self.bio.is_empty() {
            errors.add("Required_bio", "Bio is required");
        } else if self.bio.chars().count() > 500 {
            errors.add("Bio_length", "Bio should not exceed 500 characters");
        }
        errors
    }
}

/// Which of a profile's two images an upload replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PictureSlot {
    ProfilePic,
    CoverPic,
}

impl PictureSlot {
    fn column(self) -> &'static str {
        match self {
            Self::ProfilePic => "profile_pic",
            Self::CoverPic => "cover_pic",
        }
    }
}

pub fn create(
    conn: &Connection,
    user_id: i64,
    username: &str,
    input: &ProfileInput,
) -> AppResult<Profile> {
    conn.execute(
        "INSERT INTO profiles (user_id, username, name, title, bio, social_links)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            username,
            input.name,
            input.title,
            input.bio,
            links_json(&input.social_links)?
        ],
    )
    .map_err(classify)?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Profile> {
    conn.query_row(
        &format!("{} WHERE id = ?1", SELECT_PROFILE),
        params![id],
        row_to_profile,
    )
    .optional()?
    .ok_or(AppError::NotFound(Resource::Profile))
}

pub fn find_by_user(conn: &Connection, user_id: i64) -> AppResult<Option<Profile>> {
    Ok(conn
        .query_row(
            &format!("{} WHERE user_id = ?1", SELECT_PROFILE),
            params![user_id],
            row_to_profile,
        )
        .optional()?)
}

pub fn exists(conn: &Connection, id: i64) -> AppResult<bool> {
    Ok(conn.query_row(
        "SELECT COUNT(*) > 0 FROM profiles WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?)
}

pub fn list(conn: &Connection) -> AppResult<Vec<Profile>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY created_at DESC, id DESC LIMIT ?1",
        SELECT_PROFILE
    ))?;
    let profiles = stmt
        .query_map(params![LIST_LIMIT], row_to_profile)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(profiles)
}

pub fn update(conn: &Connection, id: i64, input: &ProfileInput) -> AppResult<Profile> {
    let rows = conn.execute(
        "UPDATE profiles SET name = ?2, title = ?3, bio = ?4, social_links = ?5,
             updated_at = datetime('now')
         WHERE id = ?1",
        params![
            id,
            input.name,
            input.title,
            input.bio,
            links_json(&input.social_links)?
        ],
    )?;
    if rows == 0 {
        return Err(AppError::NotFound(Resource::Profile));
    }
    get(conn, id)
}

pub fn set_picture(conn: &Connection, id: i64, slot: PictureSlot, path: &str) -> AppResult<Profile> {
    let rows = conn.execute(
        &format!(
            "UPDATE profiles SET {} = ?2, updated_at = datetime('now') WHERE id = ?1",
            slot.column()
        ),
        params![id, path],
    )?;
    if rows == 0 {
        return Err(AppError::NotFound(Resource::Profile));
    }
    get(conn, id)
}

/// Row only; see `cascade::delete_profile`.
pub(crate) fn delete(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM profiles WHERE id = ?1", params![id])?)
}
