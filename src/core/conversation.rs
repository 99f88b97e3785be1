use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::core::bounded;
use crate::error::MatchError;
use crate::models::{Conversation, ParticipantRole, Profile};
use crate::services::{
    AnalyticsEvent, ConversationRepository, EventKind, EventPublisher, ProfileRepository,
    RevealOutcome,
};

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Shown instead of an empty display name once identities are revealed
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// How one participant is presented to the other
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayIdentity {
    pub profile_id: Uuid,
    pub role: ParticipantRole,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub revealed: bool,
}

impl DisplayIdentity {
    /// Masked conversations show only the role label and never an avatar,
    /// whatever the profile contains.
    pub fn resolve(
        conversation: &Conversation,
        profile_id: Uuid,
        role: ParticipantRole,
        profile: Option<&Profile>,
    ) -> Self {
        if !conversation.is_revealed() {
            return Self {
                profile_id,
                role,
                display_name: role.label().to_string(),
                avatar_url: None,
                revealed: false,
            };
        }

        let display_name = profile
            .and_then(|p| p.display_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS_NAME)
            .to_string();

        Self {
            profile_id,
            role,
            display_name,
            avatar_url: profile.and_then(|p| p.avatar_url.clone()),
            revealed: true,
        }
    }
}

/// Owns the masked/revealed stage of conversations
pub struct ConversationStageMachine {
    conversations: Arc<dyn ConversationRepository>,
    profiles: Arc<dyn ProfileRepository>,
    events: EventPublisher,
    fetch_timeout: Duration,
}

impl ConversationStageMachine {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        profiles: Arc<dyn ProfileRepository>,
        events: EventPublisher,
    ) -> Self {
        Self {
            conversations,
            profiles,
            events,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn from_store<S>(store: Arc<S>, events: EventPublisher) -> Self
    where
        S: ConversationRepository + ProfileRepository + 'static,
    {
        Self::new(store.clone(), store, events)
    }

    pub fn with_fetch_timeout(mut self, fetch: Duration) -> Self {
        self.fetch_timeout = fetch;
        self
    }

    /// Open a masked conversation, or return the one already open for the
    /// same assignment and participants
    pub async fn open_conversation(
        &self,
        assignment_id: Uuid,
        candidate_profile_id: Uuid,
        organization_profile_id: Uuid,
        match_id: Option<Uuid>,
    ) -> Result<Conversation, MatchError> {
        if candidate_profile_id == organization_profile_id {
            return Err(MatchError::validation(
                "conversation participants must be different profiles",
            ));
        }

        let fresh = Conversation::masked(assignment_id, candidate_profile_id, organization_profile_id, match_id);
        let opened = bounded(
            self.fetch_timeout,
            "conversation open",
            self.conversations.open_conversation(&fresh),
        )
        .await?;

        if opened.id == fresh.id {
            tracing::info!(
                "Opened conversation {} for assignment {}",
                opened.id,
                assignment_id
            );
        }

        Ok(opened)
    }

    pub async fn get_conversation(&self, conversation_id: Uuid) -> Result<Conversation, MatchError> {
        bounded(
            self.fetch_timeout,
            "conversation fetch",
            self.conversations.get_conversation(conversation_id),
        )
        .await?
        .ok_or_else(|| MatchError::not_found("conversation", conversation_id))
    }

    /// Reveal both identities. Calling it again is a no-op.
    ///
    /// `identity_revealed` is published only by the call that actually moved
    /// the stage, even when several callers race.
    pub async fn trigger_identity_reveal(&self, conversation_id: Uuid) -> Result<(), MatchError> {
        let conversation = self.get_conversation(conversation_id).await?;

        let outcome = bounded(
            self.fetch_timeout,
            "conversation reveal",
            self.conversations.reveal_conversation(conversation_id),
        )
        .await?;

        match outcome {
            RevealOutcome::NotFound => Err(MatchError::not_found("conversation", conversation_id)),
            RevealOutcome::AlreadyRevealed => {
                tracing::debug!("Conversation {} already revealed", conversation_id);
                Ok(())
            }
            RevealOutcome::Revealed => {
                tracing::info!("Revealed identities in conversation {}", conversation_id);
                self.events.publish(AnalyticsEvent::new(
                    EventKind::IdentityRevealed,
                    json!({
                        "conversationId": conversation_id,
                        "assignmentId": conversation.assignment_id,
                    }),
                ));
                Ok(())
            }
        }
    }

    pub async fn is_revealed(&self, conversation_id: Uuid) -> Result<bool, MatchError> {
        Ok(self.get_conversation(conversation_id).await?.is_revealed())
    }

    /// How the other participant should be shown to `viewer_id`
    pub async fn display_identity(
        &self,
        conversation_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<DisplayIdentity, MatchError> {
        let conversation = self.get_conversation(conversation_id).await?;
        self.identity_in(&conversation, viewer_id).await
    }

    /// Same as [`Self::display_identity`] for an already loaded conversation
    pub async fn identity_in(
        &self,
        conversation: &Conversation,
        viewer_id: Uuid,
    ) -> Result<DisplayIdentity, MatchError> {
        let (other_id, role) = conversation.other_party(viewer_id).ok_or_else(|| {
            MatchError::validation(format!(
                "profile {} is not a participant of conversation {}",
                viewer_id, conversation.id
            ))
        })?;

        // masked identities never need the profile
        let profile = if conversation.is_revealed() {
            bounded(self.fetch_timeout, "profile fetch", self.profiles.get_profile(other_id)).await?
        } else {
            None
        };

        Ok(DisplayIdentity::resolve(conversation, other_id, role, profile.as_ref()))
    }
}
