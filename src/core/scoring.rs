use crate::core::presets::{Dimension, WeightSet, DIMENSION_COUNT};
use crate::core::signals::{
    assess_skills, derive_dimension_scores, AssignmentSignals, DimensionScores, ProfileSignals,
    SkillAssessment,
};
use crate::error::MatchError;
use crate::models::{DimensionScore, Explainability, MatchScoreResult, Statement};

/// Overall score at or above which a match is strong
pub const STRONG_MATCH_THRESHOLD: u8 = 80;
/// Overall score at or above which a match is near (below strong)
pub const NEAR_MATCH_THRESHOLD: u8 = 60;
/// Raw dimension score at or above which the dimension is a strength
pub const STRENGTH_THRESHOLD: f64 = 75.0;
/// Raw dimension score below which a heavily weighted dimension is a gap
pub const GAP_THRESHOLD: f64 = 40.0;

/// Calculate an explainable match score (0-100) from profile and assignment signals
///
/// overall = Σ(raw_i * w_i) / Σ(w_i for dimensions with data), rounded.
/// Dimensions with no data contribute to neither sum.
pub fn compute_match_score(
    profile: &ProfileSignals,
    assignment: &AssignmentSignals,
    weights: &WeightSet,
) -> Result<MatchScoreResult, MatchError> {
    let scores = derive_dimension_scores(profile, assignment);
    let skills = assess_skills(
        &assignment.required_skills,
        &assignment.nice_to_have_skills,
        &profile.skills,
    );
    combine(&scores, weights, skills.as_ref())
}

/// Combine already-computed raw dimension scores with weights
pub fn score_dimensions(
    scores: &DimensionScores,
    weights: &WeightSet,
) -> Result<MatchScoreResult, MatchError> {
    combine(scores, weights, None)
}

fn combine(
    scores: &DimensionScores,
    weights: &WeightSet,
    skills: Option<&SkillAssessment>,
) -> Result<MatchScoreResult, MatchError> {
    scores.validate()?;

    let mut weighted_sum = 0.0;
    let mut present_weight = 0.0;
    for (dimension, weight) in weights.iter() {
        if let Some(raw) = scores.get(dimension) {
            weighted_sum += raw * weight;
            present_weight += weight;
        }
    }

    let overall_score = if present_weight > 0.0 {
        (weighted_sum / present_weight).round().clamp(0.0, 100.0) as u8
    } else {
        0
    };

    let breakdown = weights
        .iter()
        .map(|(dimension, weight)| {
            let raw_score = scores.get(dimension);
            let applied_weight = match raw_score {
                Some(_) if present_weight > 0.0 => weight / present_weight,
                _ => 0.0,
            };
            DimensionScore {
                dimension,
                raw_score,
                weight,
                applied_weight,
            }
        })
        .collect();

    Ok(MatchScoreResult {
        overall_score,
        is_strong_match: is_strong_match(overall_score),
        is_near_match: is_near_match(overall_score),
        breakdown,
        explainability: explain(scores, weights, skills),
    })
}

#[inline]
pub fn is_strong_match(overall_score: u8) -> bool {
    overall_score >= STRONG_MATCH_THRESHOLD
}

#[inline]
pub fn is_near_match(overall_score: u8) -> bool {
    (NEAR_MATCH_THRESHOLD..STRONG_MATCH_THRESHOLD).contains(&overall_score)
}

/// Strengths, gaps and suggestions, listed in dimension declaration order.
/// A skills assessment, when given, names the skills behind a Skills gap.
fn explain(scores: &DimensionScores, weights: &WeightSet, skills: Option<&SkillAssessment>) -> Explainability {
    let heavy = top_half_of_weights(weights);
    let mut explainability = Explainability::default();

    for dimension in Dimension::ALL {
        let Some(raw) = scores.get(dimension) else {
            continue;
        };

        if raw >= STRENGTH_THRESHOLD {
            explainability.strengths.push(Statement {
                dimension,
                score: raw,
                message: strength_message(dimension).to_string(),
            });
        } else if raw < GAP_THRESHOLD && heavy[dimension.index()] {
            let detail = skills.filter(|a| dimension == Dimension::Skills && !a.is_complete());
            explainability.gaps.push(Statement {
                dimension,
                score: raw,
                message: match detail {
                    Some(a) => skills_gap_message(a),
                    None => gap_message(dimension).to_string(),
                },
            });
            explainability.improvement_suggestions.push(Statement {
                dimension,
                score: raw,
                message: match detail {
                    Some(a) => skills_suggestion_message(a),
                    None => suggestion_message(dimension).to_string(),
                },
            });
        }
    }

    explainability
}

/// Flags the upper half (rounded up) of dimensions with a positive weight.
/// Equal weights rank by declaration order.
fn top_half_of_weights(weights: &WeightSet) -> [bool; DIMENSION_COUNT] {
    let mut ranked: Vec<(Dimension, f64)> = weights.iter().filter(|(_, w)| *w > 0.0).collect();
    // stable sort keeps declaration order among ties
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut heavy = [false; DIMENSION_COUNT];
    let take = ranked.len().div_ceil(2);
    for (dimension, _) in ranked.into_iter().take(take) {
        heavy[dimension.index()] = true;
    }
    heavy
}

/// e.g. "Missing required skills: rust, sql; below the required level: facilitation (2 of 4)"
fn skills_gap_message(assessment: &SkillAssessment) -> String {
    let mut parts = Vec::new();
    if !assessment.missing.is_empty() {
        parts.push(format!("Missing required skills: {}", assessment.missing.join(", ")));
    }
    if !assessment.gaps.is_empty() {
        let below: Vec<String> = assessment
            .gaps
            .iter()
            .map(|g| format!("{} ({} of {})", g.id, g.have, g.required))
            .collect();
        let label = if parts.is_empty() { "Below" } else { "below" };
        parts.push(format!("{} the required level: {}", label, below.join(", ")));
    }
    parts.join("; ")
}

fn skills_suggestion_message(assessment: &SkillAssessment) -> String {
    let mut steps: Vec<String> = assessment
        .missing
        .iter()
        .map(|id| format!("add {}", id))
        .collect();
    steps.extend(
        assessment
            .gaps
            .iter()
            .map(|g| format!("raise {} to level {}", g.id, g.required)),
    );
    format!("Add verified proofs for the required skills: {}", steps.join(", "))
}

fn strength_message(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Values => "Shares the organization's core values",
        Dimension::Causes => "Cares about the same causes as the organization",
        Dimension::Skills => "Skills cover the assignment's requirements",
        Dimension::Experience => "Brings substantial relevant experience",
        Dimension::Verifications => "Holds the verifications this assignment requires",
        Dimension::Availability => "Availability fits the assignment's start window and hours",
        Dimension::Location => "Working mode and location are compatible",
        Dimension::Compensation => "Compensation expectations overlap",
        Dimension::Language => "Meets the language requirement",
    }
}

fn gap_message(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Values => "Little overlap with the organization's values",
        Dimension::Causes => "Few shared causes with the organization",
        Dimension::Skills => "Required skills are missing or below the required level",
        Dimension::Experience => "Limited experience for this assignment",
        Dimension::Verifications => "Required verifications are missing",
        Dimension::Availability => "Availability does not fit the start window or hours",
        Dimension::Location => "Working mode or location is incompatible",
        Dimension::Compensation => "Compensation expectations do not overlap",
        Dimension::Language => "Language level is below the requirement",
    }
}

fn suggestion_message(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Values => "Describe the values that drive your work in your profile",
        Dimension::Causes => "Add the causes you care about to your profile",
        Dimension::Skills => "Add verified proofs for the required skills",
        Dimension::Experience => "Record the months of experience behind your core skills",
        Dimension::Verifications => "Complete the verifications this assignment requires",
        Dimension::Availability => "Update your earliest start date and weekly hours",
        Dimension::Location => "Review your preferred working mode and location",
        Dimension::Compensation => "Review your compensation range",
        Dimension::Language => "Add or certify your language proficiency",
    }
}
