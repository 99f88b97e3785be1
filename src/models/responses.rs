use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::conversation::DisplayIdentity;
use crate::core::near::NearMatch;
use crate::core::presets::{WeightPreset, WeightSet};
use crate::models::domain::{ConversationStage, Interest, Match};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchesResponse {
    pub matches: Vec<Match>,
    pub total_results: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearMatchesResponse {
    pub near_matches: Vec<NearMatch>,
    pub total_results: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetResponse {
    pub preset: WeightPreset,
    pub weights: WeightSet,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInterestResponse {
    pub mutual: bool,
    /// Set when the interest made the pair mutual and a conversation is open
    pub conversation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestsResponse {
    pub interests: Vec<Interest>,
}

/// A conversation as seen by one participant
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationViewResponse {
    pub conversation_id: Uuid,
    pub assignment_id: Uuid,
    pub stage: ConversationStage,
    pub revealed: bool,
    pub other_party: DisplayIdentity,
}
