//! Blind Match - explainable candidate/assignment matching service
//!
//! This library scores candidate profiles against open assignments with
//! weighted, explainable dimension scores, records directed interest, and
//! keeps conversations masked until an interview reveals both identities.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    compute_match_score, get_preset, normalize_weights, ConversationStageMachine, Dimension,
    InterestLedger, MatchGenerator, MatchRefresher, PartialWeights, WeightPreset, WeightSet,
};
pub use crate::error::MatchError;
pub use crate::models::{Conversation, Interest, InterestTarget, Match, MatchScoreResult};
