use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Assignment, Conversation, Interest, InterestTarget, Match, Profile};
use crate::services::store::{
    AssignmentRepository, ConversationRepository, InsertOutcome, InterestRepository,
    MatchRepository, ProfileRepository, RevealOutcome, StoreError,
};

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    assignments: HashMap<Uuid, Assignment>,
    matches: HashMap<(Uuid, Uuid), Match>,
    interests: HashMap<(Uuid, Uuid, InterestTarget), Interest>,
    conversations: HashMap<Uuid, Conversation>,
}

/// In-process store used for development and tests.
///
/// Each check-then-insert runs under one write guard, so uniqueness holds
/// under concurrent callers the same way a unique index would.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile
    pub async fn put_profile(&self, profile: Profile) {
        self.tables.write().await.profiles.insert(profile.id, profile);
    }

    /// Insert or replace an assignment
    pub async fn put_assignment(&self, assignment: Assignment) {
        self.tables.write().await.assignments.insert(assignment.id, assignment);
    }

    pub async fn match_count(&self) -> usize {
        self.tables.read().await.matches.len()
    }

    pub async fn conversation_count(&self) -> usize {
        self.tables.read().await.conversations.len()
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.tables.read().await.profiles.get(&id).cloned())
    }

    async fn list_stale_profiles(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Uuid>, StoreError> {
        let tables = self.tables.read().await;
        let mut stale: Vec<(Option<DateTime<Utc>>, Uuid)> = tables
            .profiles
            .values()
            .filter(|p| p.ready_for_matching)
            .filter(|p| p.matches_refreshed_at.map_or(true, |at| at < cutoff))
            .map(|p| (p.matches_refreshed_at, p.id))
            .collect();

        // never-refreshed first (None sorts before Some), then oldest
        stale.sort();
        Ok(stale.into_iter().take(limit).map(|(_, id)| id).collect())
    }

    async fn mark_matches_refreshed(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(profile) = self.tables.write().await.profiles.get_mut(&id) {
            profile.matches_refreshed_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for MemoryStore {
    async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError> {
        Ok(self.tables.read().await.assignments.get(&id).cloned())
    }

    async fn list_published(&self) -> Result<Vec<Assignment>, StoreError> {
        let tables = self.tables.read().await;
        let mut open: Vec<Assignment> = tables
            .assignments
            .values()
            .filter(|a| a.is_open())
            .cloned()
            .collect();
        open.sort_by_key(|a| a.id);
        Ok(open)
    }
}

#[async_trait]
impl MatchRepository for MemoryStore {
    async fn match_exists(&self, profile_id: Uuid, assignment_id: Uuid) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .matches
            .contains_key(&(profile_id, assignment_id)))
    }

    async fn insert_match(&self, m: &Match) -> Result<InsertOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        let key = (m.profile_id, m.assignment_id);
        if tables.matches.contains_key(&key) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        tables.matches.insert(key, m.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn list_matches_for_profile(&self, profile_id: Uuid) -> Result<Vec<Match>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .matches
            .values()
            .filter(|m| m.profile_id == profile_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InterestRepository for MemoryStore {
    async fn insert_interest(&self, interest: &Interest) -> Result<InsertOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        let key = interest.key();
        if tables.interests.contains_key(&key) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        tables.interests.insert(key, interest.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn list_interests(&self, assignment_id: Uuid) -> Result<Vec<Interest>, StoreError> {
        let tables = self.tables.read().await;
        let mut interests: Vec<Interest> = tables
            .interests
            .values()
            .filter(|i| i.assignment_id == assignment_id)
            .cloned()
            .collect();
        interests.sort_by_key(|i| (i.created_at, i.id));
        Ok(interests)
    }
}

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError> {
        Ok(self.tables.read().await.conversations.get(&id).cloned())
    }

    async fn open_conversation(&self, conversation: &Conversation) -> Result<Conversation, StoreError> {
        let mut tables = self.tables.write().await;
        let key = conversation.key();
        if let Some(existing) = tables.conversations.values().find(|c| c.key() == key) {
            return Ok(existing.clone());
        }
        tables.conversations.insert(conversation.id, conversation.clone());
        Ok(conversation.clone())
    }

    async fn reveal_conversation(&self, id: Uuid) -> Result<RevealOutcome, StoreError> {
        Ok(match self.tables.write().await.conversations.get_mut(&id) {
            Some(conversation) => {
                if conversation.reveal() {
                    RevealOutcome::Revealed
                } else {
                    RevealOutcome::AlreadyRevealed
                }
            }
            None => RevealOutcome::NotFound,
        })
    }
}
