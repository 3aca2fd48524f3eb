// Reaction domain - pure transitions, no storage
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two mutually exclusive reactions a profile can leave on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reaction action: {0:?}")]
pub struct UnknownReaction(pub String);

impl FromStr for ReactionKind {
    type Err = UnknownReaction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            other => Err(UnknownReaction(other.to_string())),
        }
    }
}

/// What a (profile, post) pair currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionState {
    None,
    Liked,
    Disliked,
}

impl ReactionState {
    pub fn from_current(current: Option<ReactionKind>) -> Self {
        match current {
            None => Self::None,
            Some(ReactionKind::Like) => Self::Liked,
            Some(ReactionKind::Dislike) => Self::Disliked,
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Liked => "Liked",
            Self::Disliked => "Disliked",
        }
    }

    pub fn current(&self) -> Option<ReactionKind> {
        match self {
            Self::None => None,
            Self::Liked => Some(ReactionKind::Like),
            Self::Disliked => Some(ReactionKind::Dislike),
        }
    }

    /// Decide the storage work for `react(kind)` from this state.
    pub fn react(self, kind: ReactionKind) -> Result<ReactPlan, ReactionError> {
        match (self.current(), kind) {
            (None, kind) => Ok(ReactPlan::Insert(kind)),
            (Some(held), wanted) if held == wanted => Err(ReactionError::Duplicate(wanted)),
            (Some(held), wanted) => Ok(ReactPlan::Replace {
                from: held,
                to: wanted,
            }),
        }
    }

    /// Unreacting is only valid while a reaction is held.
    pub fn unreact(self) -> Result<Self, ReactionError> {
        match self {
            Self::None => Err(ReactionError::NotFound),
            Self::Liked | Self::Disliked => Ok(Self::None),
        }
    }
}

/// Storage work for a successful react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactPlan {
    Insert(ReactionKind),
    /// Delete the held row, then insert the opposite one.
    Replace {
        from: ReactionKind,
        to: ReactionKind,
    },
}

impl ReactPlan {
    pub fn target(&self) -> ReactionKind {
        match self {
            Self::Insert(kind) => *kind,
            Self::Replace { to, .. } => *to,
        }
    }

    pub fn resulting_state(&self) -> ReactionState {
        ReactionState::from_current(Some(self.target()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReactionError {
    #[error("already reacted with {0}")]
    Duplicate(ReactionKind),
    #[error("no reaction to remove")]
    NotFound,
}

/// Per-post tally shown alongside a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCounts {
    pub likes: i64,
    pub dislikes: i64,
}
