use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Assignment, Conversation, Interest, Match, Profile};

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Result of an insert guarded by a uniqueness key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Result of moving a conversation to the revealed stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// This call moved the stage forward
    Revealed,
    AlreadyRevealed,
    NotFound,
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    /// Ready profiles whose matches were never refreshed or refreshed before `cutoff`, oldest first
    async fn list_stale_profiles(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Uuid>, StoreError>;

    async fn mark_matches_refreshed(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError>;

    /// Published assignments without a soft-delete marker
    async fn list_published(&self) -> Result<Vec<Assignment>, StoreError>;
}

#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn match_exists(&self, profile_id: Uuid, assignment_id: Uuid) -> Result<bool, StoreError>;

    /// Insert unless a match for the same (profile, assignment) pair exists
    async fn insert_match(&self, m: &Match) -> Result<InsertOutcome, StoreError>;

    async fn list_matches_for_profile(&self, profile_id: Uuid) -> Result<Vec<Match>, StoreError>;
}

#[async_trait]
pub trait InterestRepository: Send + Sync {
    /// Insert unless the same (actor, assignment, target) interest exists
    async fn insert_interest(&self, interest: &Interest) -> Result<InsertOutcome, StoreError>;

    async fn list_interests(&self, assignment_id: Uuid) -> Result<Vec<Interest>, StoreError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError>;

    /// Insert `conversation` or return the one already open for the same
    /// assignment and participants
    async fn open_conversation(&self, conversation: &Conversation) -> Result<Conversation, StoreError>;

    /// Move a conversation to the revealed stage as one atomic step.
    /// Of several concurrent callers exactly one sees `Revealed`.
    async fn reveal_conversation(&self, id: Uuid) -> Result<RevealOutcome, StoreError>;
}

/// Every repository a full deployment needs
pub trait Store:
    ProfileRepository + AssignmentRepository + MatchRepository + InterestRepository + ConversationRepository
{
}

impl<T> Store for T where
    T: ProfileRepository
        + AssignmentRepository
        + MatchRepository
        + InterestRepository
        + ConversationRepository
{
}
