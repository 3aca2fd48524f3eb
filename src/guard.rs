//! Ownership checks run before any mutation.
//!
//! Existence is checked by the caller first, so a missing row surfaces as
//! `NotFound` and never as `Unauthorized`.

use crate::db::models::{Comment, Post, Profile, Reaction, Reply, User};
use crate::error::{AppError, AppResult};

/// Content owned by a profile.
pub trait Owned {
    fn owner_profile_id(&self) -> i64;
}

impl Owned for Post {
    fn owner_profile_id(&self) -> i64 {
        self.author_id
    }
}

impl Owned for Comment {
    fn owner_profile_id(&self) -> i64 {
        self.profile_id
    }
}

impl Owned for Reply {
    fn owner_profile_id(&self) -> i64 {
        self.profile_id
    }
}

impl Owned for Reaction {
    fn owner_profile_id(&self) -> i64 {
        self.profile_id
    }
}

pub fn ensure_owner<T: Owned>(caller_profile_id: i64, resource: &T) -> AppResult<()> {
    if resource.owner_profile_id() == caller_profile_id {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Accounts and profiles are owned by the user, not the profile.
pub trait AccountOwned {
    fn owner_user_id(&self) -> i64;
}

impl AccountOwned for User {
    fn owner_user_id(&self) -> i64 {
        self.id
    }
}

impl AccountOwned for Profile {
    fn owner_user_id(&self) -> i64 {
        self.user_id
    }
}

pub fn ensure_account_owner<T: AccountOwned>(caller_user_id: i64, resource: &T) -> AppResult<()> {
    if resource.owner_user_id() == caller_user_id {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::SocialLinks;

    fn comment(profile_id: i64) -> Comment {
        Comment {
            id: 1,
            post_id: 1,
            profile_id,
            body: "hi".into(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn owner_passes_and_others_fail() {
        assert!(ensure_owner(7, &comment(7)).is_ok());
        assert!(matches!(
            ensure_owner(8, &comment(7)),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn post_owner_is_its_author() {
        let post = Post {
            id: 3,
            author_id: 5,
            title: "t".into(),
            permalink: "t".into(),
            content: "c".into(),
            tags: vec![],
            thumbnail: None,
            read_time: "0 min read".into(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert!(ensure_owner(5, &post).is_ok());
        assert!(ensure_owner(3, &post).is_err());
    }

    #[test]
    fn profile_is_owned_by_its_user() {
        let profile = Profile {
            id: 10,
            user_id: 2,
            username: "ann".into(),
            name: "Ann".into(),
            title: "t".into(),
            bio: "b".into(),
            profile_pic: None,
            cover_pic: None,
            social_links: SocialLinks::default(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert!(ensure_account_owner(2, &profile).is_ok());
        assert!(matches!(
            ensure_account_owner(10, &profile),
            Err(AppError::Unauthorized)
        ));
    }
}
