use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{classify, sanitize, Input, LIST_LIMIT};
use crate::db::models::{Post, Profile};
use crate::error::{AppError, AppResult, FieldErrors, Resource};
use crate::postformat;
use crate::reactions::{self, ReactionCounts};
use crate::store::profiles;

const SELECT_POST: &str = "SELECT id, author_id, title, permalink, content, tags, thumbnail,
            read_time, created_at, updated_at
     FROM posts";

fn row_to_post(row: &Row) -> rusqlite::Result<Post> {
    let tags: String = row.get(5)?;
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        title: row.get(2)?,
        permalink: row.get(3)?,
        content: row.get(4)?,
        tags: serde_json::from_str(&tags)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        thumbnail: row.get(6)?,
        read_time: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn tags_json(tags: &[String]) -> AppResult<String> {
    serde_json::to_string(tags).map_err(|e| AppError::Internal(e.to_string()))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    #[serde(deserialize_with = "postformat::deserialize_tags")]
    pub tags: Vec<String>,
    pub thumbnail: Option<String>,
}

impl Input for PostInput {
    fn sanitized(self) -> Self {
        Self {
            title: sanitize(&self.title),
            content: sanitize(&self.content),
            tags: self
                .tags
                .iter()
                .map(|t| sanitize(t))
                .filter(|t| !t.is_empty())
                .collect(),
            thumbnail: self.thumbnail.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.title.is_empty() {
            errors.add("Required_title", "Required Title");
        }
        if self.content.is_empty() {
            errors.add("Required_content", "Required Content");
        }
        if self.tags.is_empty() {
            errors.add("Invalid_tags", "Please add at least one tag");
        }
        errors
    }
}

/// A post as clients see it: author and reaction tally attached.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: Profile,
    #[serde(flatten)]
    pub reactions: ReactionCounts,
}

pub fn view(conn: &Connection, post: Post) -> AppResult<PostView> {
    let author = profiles::get(conn, post.author_id)?;
    let reactions = reactions::reaction_counts(conn, post.id)?;
    Ok(PostView {
        post,
        author,
        reactions,
    })
}

pub fn create(conn: &Connection, author_id: i64, input: &PostInput) -> AppResult<Post> {
    conn.execute(
        "INSERT INTO posts (author_id, title, permalink, content, tags, thumbnail, read_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            author_id,
            input.title,
            postformat::permalink(&input.title),
            input.content,
            tags_json(&input.tags)?,
            input.thumbnail,
            postformat::read_time(&input.content),
        ],
    )
    .map_err(classify)?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Post> {
    conn.query_row(
        &format!("{} WHERE id = ?1", SELECT_POST),
        params![id],
        row_to_post,
    )
    .optional()?
    .ok_or(AppError::NotFound(Resource::Post))
}

pub fn exists(conn: &Connection, id: i64) -> AppResult<bool> {
    Ok(conn.query_row(
        "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?)
}

/// Fail with `No_post` unless the post is there.
pub fn ensure_exists(conn: &Connection, id: i64) -> AppResult<()> {
    if exists(conn, id)? {
        Ok(())
    } else {
        Err(AppError::NotFound(Resource::Post))
    }
}

pub fn list(conn: &Connection) -> AppResult<Vec<Post>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY created_at DESC, id DESC LIMIT ?1",
        SELECT_POST
    ))?;
    let posts = stmt
        .query_map(params![LIST_LIMIT], row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn list_by_author(conn: &Connection, author_id: i64) -> AppResult<Vec<Post>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE author_id = ?1 ORDER BY created_at DESC, id DESC",
        SELECT_POST
    ))?;
    let posts = stmt
        .query_map(params![author_id], row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn ids_by_author(conn: &Connection, author_id: i64) -> AppResult<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM posts WHERE author_id = ?1 ORDER BY id")?;
    let ids = stmt
        .query_map(params![author_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

pub fn update(conn: &Connection, id: i64, input: &PostInput) -> AppResult<Post> {
    let rows = conn
        .execute(
            "UPDATE posts SET title = ?2, permalink = ?3, content = ?4, tags = ?5,
                 thumbnail = COALESCE(?6, thumbnail), read_time = ?7, updated_at = datetime('now')
             WHERE id = ?1",
            params![
                id,
                input.title,
                postformat::permalink(&input.title),
                input.content,
                tags_json(&input.tags)?,
                input.thumbnail,
                postformat::read_time(&input.content),
            ],
        )
        .map_err(classify)?;
    if rows == 0 {
        return Err(AppError::NotFound(Resource::Post));
    }
    get(conn, id)
}

/// Row only; see `cascade::delete_post`.
pub(crate) fn delete(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?)
}
