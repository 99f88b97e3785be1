use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::core::presets::{PartialWeights, WeightPreset};
use crate::core::signals::{AssignmentSignals, ProfileSignals, SkillLevel};

/// Request to generate matches for one profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMatchesRequest {
    #[serde(alias = "profile_id")]
    pub profile_id: Uuid,
}

/// Query for the active matches of a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileQuery {
    #[serde(alias = "profile_id")]
    pub profile_id: Uuid,
}

/// Query for the near matches of a profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NearMatchQuery {
    #[serde(alias = "profile_id")]
    pub profile_id: Uuid,
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
    #[serde(default, alias = "min_score")]
    #[validate(range(max = 100))]
    pub min_score: Option<u8>,
}

/// Ad-hoc scoring of one profile against one assignment.
///
/// At most one of `preset` and `weights` may be given; without either the
/// configured default preset applies.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_score_request"))]
pub struct ScoreRequest {
    pub profile: ProfileSignals,
    pub assignment: AssignmentSignals,
    #[serde(default)]
    pub preset: Option<WeightPreset>,
    #[serde(default)]
    pub weights: Option<PartialWeights>,
}

fn validate_score_request(req: &ScoreRequest) -> Result<(), ValidationError> {
    if req.preset.is_some() && req.weights.is_some() {
        return Err(ValidationError::new("preset_and_weights"));
    }

    let levels = req
        .profile
        .skills
        .iter()
        .chain(&req.assignment.required_skills)
        .chain(&req.assignment.nice_to_have_skills);
    if levels.into_iter().any(|s: &SkillLevel| s.level > 5) {
        return Err(ValidationError::new("skill_level_above_5"));
    }

    Ok(())
}

/// Request to normalize a partial weight map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeWeightsRequest {
    #[serde(default)]
    pub weights: PartialWeights,
}

/// Request to record interest
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_interest_request"))]
pub struct RecordInterestRequest {
    #[serde(alias = "actor_profile_id")]
    pub actor_profile_id: Uuid,
    #[serde(alias = "assignment_id")]
    pub assignment_id: Uuid,
    #[serde(default, alias = "target_profile_id")]
    pub target_profile_id: Option<Uuid>,
}

fn validate_interest_request(req: &RecordInterestRequest) -> Result<(), ValidationError> {
    if req.target_profile_id == Some(req.actor_profile_id) {
        return Err(ValidationError::new("target_is_actor"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentQuery {
    #[serde(alias = "assignment_id")]
    pub assignment_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerQuery {
    #[serde(alias = "viewer_id")]
    pub viewer_id: Uuid,
}
