//! Partial matches with the reason they fall short.
//!
//! Unlike generated matches these are computed on request, never stored,
//! and keep assignments whose must-have skills are not met.

use serde::Serialize;
use uuid::Uuid;

use crate::core::presets::Dimension;
use crate::core::signals::{DimensionScores, SkillAssessment, SkillGap};
use crate::models::MatchScoreResult;

/// Minimum overall score listed when the caller gives none
pub const DEFAULT_NEAR_MIN_SCORE: u8 = 30;
pub const DEFAULT_NEAR_LIMIT: usize = 10;
pub const MAX_NEAR_LIMIT: usize = 100;

/// Raw score below which a logistics or values dimension is named as the reason
const WEAK_DIMENSION: f64 = 50.0;

/// Main reason a near match is not a full one, most blocking first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum NearMatchReason {
    MissingRequiredSkills { count: usize },
    SkillGaps { count: usize },
    LocationMismatch,
    AvailabilityMismatch,
    CompensationMismatch,
    ValuesDifferences,
    PartialMatch,
}

impl NearMatchReason {
    pub fn message(self) -> String {
        match self {
            NearMatchReason::MissingRequiredSkills { count } => {
                format!("Missing {} required skill(s)", count)
            }
            NearMatchReason::SkillGaps { count } => format!("Skill gaps in {} area(s)", count),
            NearMatchReason::LocationMismatch => "Location preference mismatch".to_string(),
            NearMatchReason::AvailabilityMismatch => "Availability timing mismatch".to_string(),
            NearMatchReason::CompensationMismatch => "Compensation range mismatch".to_string(),
            NearMatchReason::ValuesDifferences => "Some values alignment differences".to_string(),
            NearMatchReason::PartialMatch => "Good partial match".to_string(),
        }
    }
}

/// Pick the reason for a partial match.
///
/// Skill shortfalls win, then the first weak dimension among location,
/// availability, compensation and values. Absent dimensions are never weak.
pub fn near_match_reason(scores: &DimensionScores, skills: Option<&SkillAssessment>) -> NearMatchReason {
    if let Some(skills) = skills {
        if !skills.missing.is_empty() {
            return NearMatchReason::MissingRequiredSkills { count: skills.missing.len() };
        }
        if !skills.gaps.is_empty() {
            return NearMatchReason::SkillGaps { count: skills.gaps.len() };
        }
    }

    let weak = |dimension: Dimension| scores.get(dimension).is_some_and(|raw| raw < WEAK_DIMENSION);

    if weak(Dimension::Location) {
        NearMatchReason::LocationMismatch
    } else if weak(Dimension::Availability) {
        NearMatchReason::AvailabilityMismatch
    } else if weak(Dimension::Compensation) {
        NearMatchReason::CompensationMismatch
    } else if weak(Dimension::Values) {
        NearMatchReason::ValuesDifferences
    } else {
        NearMatchReason::PartialMatch
    }
}

/// An open assignment a profile almost fits. Carries no organization identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearMatch {
    pub assignment_id: Uuid,
    pub role_title: String,
    pub reason: NearMatchReason,
    pub summary: String,
    pub missing_skills: Vec<String>,
    pub skill_gaps: Vec<SkillGap>,
    pub score: MatchScoreResult,
}

impl NearMatch {
    pub fn overall_score(&self) -> u8 {
        self.score.overall_score
    }
}
