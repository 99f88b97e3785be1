use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::core::presets::{Dimension, WeightConfig};
use crate::core::signals::{AssignmentSignals, ProfileSignals};
use crate::error::MatchError;

/// Days a suggested match stays valid after generation
pub const MATCH_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "profile_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Individual,
    Organization,
}

/// Profile snapshot consumed by matching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub kind: ProfileKind,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub ready_for_matching: bool,
    #[serde(default)]
    pub matches_refreshed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub signals: ProfileSignals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "assignment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Draft,
    Published,
    Paused,
    Closed,
}

/// Assignment requirement snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub organization_profile_id: Uuid,
    pub role_title: String,
    pub status: AssignmentStatus,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub weights: Option<WeightConfig>,
    #[serde(default)]
    pub signals: AssignmentSignals,
}

impl Assignment {
    /// Published and not soft-deleted
    pub fn is_open(&self) -> bool {
        self.status == AssignmentStatus::Published && self.deleted_at.is_none()
    }
}

/// Raw score and weight for one dimension of a scoring pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScore {
    pub dimension: Dimension,
    /// Raw 0-100 score, `None` when the dimension had no data
    pub raw_score: Option<f64>,
    /// Configured weight
    pub weight: f64,
    /// Share of the overall score, zero for absent dimensions
    pub applied_weight: f64,
}

/// One dimension-labeled explainability statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub dimension: Dimension,
    pub score: f64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explainability {
    pub strengths: Vec<Statement>,
    pub gaps: Vec<Statement>,
    pub improvement_suggestions: Vec<Statement>,
}

/// Output of one scoring pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScoreResult {
    pub overall_score: u8,
    pub is_strong_match: bool,
    pub is_near_match: bool,
    pub breakdown: Vec<DimensionScore>,
    pub explainability: Explainability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Suggested,
    Accepted,
    Declined,
    Expired,
}

/// Persisted outcome of scoring one (profile, assignment) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub assignment_id: Uuid,
    pub overall_score: u8,
    pub is_strong_match: bool,
    pub is_near_match: bool,
    pub breakdown: Vec<DimensionScore>,
    pub explainability: Explainability,
    pub status: MatchStatus,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Match {
    /// New suggestion valid for [`MATCH_TTL_DAYS`] from `now`
    pub fn suggested(
        profile_id: Uuid,
        assignment_id: Uuid,
        result: MatchScoreResult,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            profile_id,
            assignment_id,
            overall_score: result.overall_score,
            is_strong_match: result.is_strong_match,
            is_near_match: result.is_near_match,
            breakdown: result.breakdown,
            explainability: result.explainability,
            status: MatchStatus::Suggested,
            generated_at: now,
            expires_at: now + Duration::days(MATCH_TTL_DAYS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == MatchStatus::Expired || self.expires_at <= now
    }
}

/// Who an interest is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterestTarget {
    /// An individual's interest in the assignment itself
    #[default]
    General,
    /// An organization singling out one candidate
    TargetedAt(Uuid),
}

impl InterestTarget {
    pub fn from_option(target: Option<Uuid>) -> Self {
        match target {
            Some(id) => InterestTarget::TargetedAt(id),
            None => InterestTarget::General,
        }
    }

    pub fn profile_id(&self) -> Option<Uuid> {
        match self {
            InterestTarget::General => None,
            InterestTarget::TargetedAt(id) => Some(*id),
        }
    }
}

impl Serialize for InterestTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.profile_id().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InterestTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<Uuid>::deserialize(deserializer).map(InterestTarget::from_option)
    }
}

/// One directed expression of interest. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    pub id: Uuid,
    pub actor_profile_id: Uuid,
    pub assignment_id: Uuid,
    #[serde(rename = "targetProfileId", default)]
    pub target: InterestTarget,
    pub created_at: DateTime<Utc>,
}

impl Interest {
    pub fn new(actor_profile_id: Uuid, assignment_id: Uuid, target: InterestTarget) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_profile_id,
            assignment_id,
            target,
            created_at: Utc::now(),
        }
    }

    /// Uniqueness key
    pub fn key(&self) -> (Uuid, Uuid, InterestTarget) {
        (self.actor_profile_id, self.assignment_id, self.target)
    }
}

/// Identity-disclosure stage. Only ever moves forward.
///
/// Stored and serialized as its number: 1 masked, 2 revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum ConversationStage {
    Masked = 1,
    Revealed = 2,
}

impl ConversationStage {
    pub fn as_i16(self) -> i16 {
        self as i16
    }
}

impl From<ConversationStage> for i16 {
    fn from(stage: ConversationStage) -> Self {
        stage.as_i16()
    }
}

impl TryFrom<i16> for ConversationStage {
    type Error = MatchError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ConversationStage::Masked),
            2 => Ok(ConversationStage::Revealed),
            other => Err(MatchError::validation(format!("invalid conversation stage {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "conversation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Archived,
}

/// Side of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Candidate,
    Organization,
}

impl ParticipantRole {
    pub fn label(self) -> &'static str {
        match self {
            ParticipantRole::Candidate => "Candidate",
            ParticipantRole::Organization => "Organization",
        }
    }
}

/// Conversation between a candidate and an organization about one assignment.
///
/// `stage` is private: the only way to change it is [`Conversation::reveal`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub match_id: Option<Uuid>,
    pub candidate_profile_id: Uuid,
    pub organization_profile_id: Uuid,
    stage: ConversationStage,
    pub status: ConversationStatus,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// A fresh conversation in the masked stage
    pub fn masked(
        assignment_id: Uuid,
        candidate_profile_id: Uuid,
        organization_profile_id: Uuid,
        match_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            assignment_id,
            match_id,
            candidate_profile_id,
            organization_profile_id,
            stage: ConversationStage::Masked,
            status: ConversationStatus::Active,
            last_message_at: None,
            created_at: Utc::now(),
        }
    }

    /// Rebuild a stored conversation
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: Uuid,
        assignment_id: Uuid,
        match_id: Option<Uuid>,
        candidate_profile_id: Uuid,
        organization_profile_id: Uuid,
        stage: ConversationStage,
        status: ConversationStatus,
        last_message_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            assignment_id,
            match_id,
            candidate_profile_id,
            organization_profile_id,
            stage,
            status,
            last_message_at,
            created_at,
        }
    }

    pub fn stage(&self) -> ConversationStage {
        self.stage
    }

    pub fn is_revealed(&self) -> bool {
        self.stage == ConversationStage::Revealed
    }

    /// Move to the revealed stage. Returns whether the stage changed.
    pub fn reveal(&mut self) -> bool {
        let changed = self.stage < ConversationStage::Revealed;
        self.stage = self.stage.max(ConversationStage::Revealed);
        changed
    }

    /// Uniqueness key: one conversation per assignment and participant pair
    pub fn key(&self) -> (Uuid, Uuid, Uuid) {
        (self.assignment_id, self.candidate_profile_id, self.organization_profile_id)
    }

    /// The participant on the other side from `viewer`, with their role
    pub fn other_party(&self, viewer: Uuid) -> Option<(Uuid, ParticipantRole)> {
        if viewer == self.candidate_profile_id {
            Some((self.organization_profile_id, ParticipantRole::Organization))
        } else if viewer == self.organization_profile_id {
            Some((self.candidate_profile_id, ParticipantRole::Candidate))
        } else {
            None
        }
    }
}
