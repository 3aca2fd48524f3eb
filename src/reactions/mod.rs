pub mod domain;
pub mod service;

pub use domain::{ReactPlan, ReactionCounts, ReactionError, ReactionKind, ReactionState, UnknownReaction};
pub use service::{
    delete_reactions_for_post, delete_reactions_for_profile, reaction_counts, react,
    reactions_for_post, unreact, unreact_by_id,
};
