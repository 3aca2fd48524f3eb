//! Cascade coordinator: the only code that removes rows other rows point at.
//!
//! Steps run children-first in a fixed order and stop at the first failure.
//! Completed steps are not rolled back; the foreign keys guarantee a wrong
//! order fails loudly instead of orphaning rows.

use std::fmt;

use rusqlite::Connection;
use serde::Serialize;

use crate::auth::session;
use crate::error::AppResult;
use crate::reactions;
use crate::store::{comments, posts, profiles, replies, resets, users};

/// Rows removed by one cascade, per entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub users: usize,
    pub sessions: usize,
    pub profiles: usize,
    pub posts: usize,
    pub comments: usize,
    pub replies: usize,
    pub reactions: usize,
    pub resets: usize,
}

impl CascadeReport {
    fn absorb(&mut self, other: CascadeReport) {
        self.users += other.users;
        self.sessions += other.sessions;
        self.profiles += other.profiles;
        self.posts += other.posts;
        self.comments += other.comments;
        self.replies += other.replies;
        self.reactions += other.reactions;
        self.resets += other.resets;
    }
}

impl fmt::Display for CascadeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "users={} sessions={} profiles={} posts={} comments={} replies={} reactions={} resets={}",
            self.users,
            self.sessions,
            self.profiles,
            self.posts,
            self.comments,
            self.replies,
            self.reactions,
            self.resets
        )
    }
}

/// Replies, comments and reactions on the post, then the post.
pub fn delete_post(conn: &Connection, post_id: i64) -> AppResult<CascadeReport> {
    posts::ensure_exists(conn, post_id)?;

    let report = CascadeReport {
        replies: replies::delete_for_post(conn, post_id)?,
        comments: comments::delete_for_post(conn, post_id)?,
        reactions: reactions::delete_reactions_for_post(conn, post_id)?,
        posts: posts::delete(conn, post_id)?,
        ..Default::default()
    };

    tracing::info!("Deleted post {}: {}", post_id, report);
    Ok(report)
}

/// Replies to the comment, then the comment.
pub fn delete_comment(conn: &Connection, comment_id: i64) -> AppResult<CascadeReport> {
    comments::get(conn, comment_id)?;

    let report = CascadeReport {
        replies: replies::delete_for_comment(conn, comment_id)?,
        comments: comments::delete(conn, comment_id)?,
        ..Default::default()
    };

    tracing::info!("Deleted comment {}: {}", comment_id, report);
    Ok(report)
}

/// Single reply; nothing references replies.
pub fn delete_reply(conn: &Connection, reply_id: i64) -> AppResult<CascadeReport> {
    replies::get(conn, reply_id)?;

    let report = CascadeReport {
        replies: replies::delete(conn, reply_id)?,
        ..Default::default()
    };

    tracing::debug!("Deleted reply {}", reply_id);
    Ok(report)
}

/// Everything the profile authored, the profile, then its owning account.
pub fn delete_profile(conn: &Connection, profile_id: i64) -> AppResult<CascadeReport> {
    let profile = profiles::get(conn, profile_id)?;
    let user = users::get(conn, profile.user_id)?;
    let mut report = CascadeReport::default();

    for post_id in posts::ids_by_author(conn, profile_id)? {
        report.absorb(delete_post(conn, post_id)?);
    }

    report.replies += replies::delete_on_comments_by(conn, profile_id)?;
    report.comments += comments::delete_by_profile(conn, profile_id)?;
    report.replies += replies::delete_by_profile(conn, profile_id)?;
    report.reactions += reactions::delete_reactions_for_profile(conn, profile_id)?;
    report.profiles += profiles::delete(conn, profile_id)?;
    report.sessions += session::delete_for_user(conn, profile.user_id)?;
    report.resets += resets::delete_for_email(conn, &user.email)?;
    report.users += users::delete(conn, profile.user_id)?;

    tracing::info!(
        "Deleted profile {} (user {}): {}",
        profile_id,
        profile.user_id,
        report
    );
    Ok(report)
}

/// Account removal; goes through the profile cascade when there is one.
pub fn delete_user(conn: &Connection, user_id: i64) -> AppResult<CascadeReport> {
    let user = users::get(conn, user_id)?;
    if let Some(profile_id) = user.profile_id {
        return delete_profile(conn, profile_id);
    }

    let report = CascadeReport {
        sessions: session::delete_for_user(conn, user_id)?,
        resets: resets::delete_for_email(conn, &user.email)?,
        users: users::delete(conn, user_id)?,
        ..Default::default()
    };

    tracing::info!("Deleted user {}: {}", user_id, report);
    Ok(report)
}
