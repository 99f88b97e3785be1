//! Per-dimension raw sub-scores (0-100) derived from profile and assignment signals.
//!
//! A dimension is reported as absent (`None`) when either side lacks the
//! data needed to compare it, so it can be left out of the weighted mean.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::core::presets::{Dimension, DIMENSION_COUNT};
use crate::error::MatchError;

/// Logistic midpoint for the experience curve, in months
const EXPERIENCE_MIDPOINT_MONTHS: f64 = 24.0;
/// Logistic steepness for the experience curve
const EXPERIENCE_STEEPNESS: f64 = 0.08;

/// Raw sub-scores indexed by dimension
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DimensionScores {
    scores: [Option<f64>; DIMENSION_COUNT],
}

impl DimensionScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, dimension: Dimension, raw: f64) {
        self.scores[dimension.index()] = Some(raw);
    }

    pub fn with(mut self, dimension: Dimension, raw: f64) -> Self {
        self.set(dimension, raw);
        self
    }

    #[inline]
    pub fn get(&self, dimension: Dimension) -> Option<f64> {
        self.scores[dimension.index()]
    }

    pub fn present_count(&self) -> usize {
        self.scores.iter().filter(|s| s.is_some()).count()
    }

    /// Reject scores outside [0, 100]
    pub fn validate(&self) -> Result<(), MatchError> {
        for dimension in Dimension::ALL {
            if let Some(raw) = self.get(dimension) {
                if !raw.is_finite() || !(0.0..=100.0).contains(&raw) {
                    return Err(MatchError::validation(format!(
                        "raw score for '{}' must be within [0, 100], got {}",
                        dimension, raw
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A skill with a proficiency level (0-5)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillLevel {
    pub id: String,
    pub level: u8,
    #[serde(default)]
    pub months: Option<u32>,
}

/// Inclusive numeric range (hours per week, compensation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

/// Window of acceptable start dates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateWindow {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    Remote,
    Onsite,
    Hybrid,
}

/// CEFR language proficiency, ordered A1 < A2 < B1 < B2 < C1 < C2
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

/// Capability, values and logistics snapshot of a candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSignals {
    pub values: Vec<String>,
    pub causes: Vec<String>,
    pub skills: Vec<SkillLevel>,
    pub experience_months: Option<u32>,
    pub verifications: Vec<String>,
    pub available_from: Option<NaiveDate>,
    pub hours_per_week: Option<Range>,
    pub location_mode: Option<LocationMode>,
    pub country: Option<String>,
    pub compensation: Option<Range>,
    pub language_level: Option<CefrLevel>,
}

/// Requirement snapshot of an assignment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignmentSignals {
    pub values: Vec<String>,
    pub causes: Vec<String>,
    pub required_skills: Vec<SkillLevel>,
    pub nice_to_have_skills: Vec<SkillLevel>,
    pub required_verifications: Vec<String>,
    pub start_window: Option<DateWindow>,
    pub hours_per_week: Option<Range>,
    pub location_mode: Option<LocationMode>,
    pub country: Option<String>,
    pub compensation: Option<Range>,
    pub min_language_level: Option<CefrLevel>,
}

/// Derive raw sub-scores for every dimension both sides have data for
pub fn derive_dimension_scores(
    profile: &ProfileSignals,
    assignment: &AssignmentSignals,
) -> DimensionScores {
    let mut scores = DimensionScores::new();

    let mut put = |dimension: Dimension, raw: Option<f64>| {
        if let Some(raw) = raw {
            scores.set(dimension, (raw * 100.0).clamp(0.0, 100.0));
        }
    };

    put(Dimension::Values, overlap_score(&profile.values, &assignment.values));
    put(Dimension::Causes, overlap_score(&profile.causes, &assignment.causes));
    put(
        Dimension::Skills,
        skills_score(&assignment.required_skills, &assignment.nice_to_have_skills, &profile.skills),
    );
    put(Dimension::Experience, experience_months(profile).map(experience_score));
    put(
        Dimension::Verifications,
        verification_score(&assignment.required_verifications, &profile.verifications),
    );
    put(
        Dimension::Availability,
        match (assignment.start_window, profile.available_from) {
            (Some(window), Some(start)) => Some(availability_score(
                window,
                start,
                assignment.hours_per_week,
                profile.hours_per_week,
            )),
            _ => None,
        },
    );
    put(
        Dimension::Location,
        match (assignment.location_mode, profile.location_mode) {
            (Some(a), Some(c)) => Some(location_score(
                a,
                c,
                assignment.country.as_deref(),
                profile.country.as_deref(),
            )),
            _ => None,
        },
    );
    put(
        Dimension::Compensation,
        match (assignment.compensation, profile.compensation) {
            (Some(a), Some(c)) => Some(compensation_score(a, c)),
            _ => None,
        },
    );
    put(
        Dimension::Language,
        match (assignment.min_language_level, profile.language_level) {
            (Some(min), Some(have)) => Some(if have >= min { 1.0 } else { 0.0 }),
            _ => None,
        },
    );

    scores
}

/// Jaccard similarity of two tag lists (case-insensitive), absent if either is empty
fn overlap_score(a: &[String], b: &[String]) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }

    let set_a: HashSet<String> = a.iter().map(|s| s.trim().to_lowercase()).collect();
    let set_b: HashSet<String> = b.iter().map(|s| s.trim().to_lowercase()).collect();

    let intersection = set_a.intersection(&set_b).count() as f64;
    let union = set_a.union(&set_b).count() as f64;

    Some(if union > 0.0 { intersection / union } else { 0.0 })
}

/// Required skill the candidate holds below the wanted level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    pub id: String,
    pub required: u8,
    pub have: u8,
}

/// Skills comparison with the reasons behind the score
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillAssessment {
    /// Fraction in [0, 1]; 0 on a hard fail
    pub score: f64,
    /// Required skills the candidate does not list at all
    pub missing: Vec<String>,
    /// Required skills held below the wanted level
    pub gaps: Vec<SkillGap>,
    pub hard_fail: bool,
}

impl SkillAssessment {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.gaps.is_empty()
    }
}

/// Compare candidate skills with must-have and nice-to-have requirements.
///
/// Every missing or under-levelled must-have is reported and makes the
/// result a hard fail. Absent when the assignment lists no skills.
pub fn assess_skills(
    required: &[SkillLevel],
    nice_to_have: &[SkillLevel],
    have: &[SkillLevel],
) -> Option<SkillAssessment> {
    if required.is_empty() && nice_to_have.is_empty() {
        return None;
    }

    let have: HashMap<&str, &SkillLevel> = have.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut assessment = SkillAssessment::default();

    for req in required {
        match have.get(req.id.as_str()) {
            None => assessment.missing.push(req.id.clone()),
            Some(candidate) if candidate.level < req.level => assessment.gaps.push(SkillGap {
                id: req.id.clone(),
                required: req.level,
                have: candidate.level,
            }),
            Some(_) => {}
        }
    }

    if !assessment.is_complete() {
        assessment.hard_fail = true;
        return Some(assessment);
    }

    let level_match = |candidate: &SkillLevel, wanted: &SkillLevel| {
        (candidate.level as f64 / (wanted.level.max(1)) as f64).min(1.5)
    };

    let mut total = 0.0;
    let mut max = 0.0;

    for req in required {
        if let Some(&candidate) = have.get(req.id.as_str()) {
            total += level_match(candidate, req) * 2.0;
        }
        max += 2.0;
    }

    for nice in nice_to_have {
        if let Some(&candidate) = have.get(nice.id.as_str()) {
            if candidate.level >= nice.level {
                total += level_match(candidate, nice);
            }
        }
        max += 1.0;
    }

    assessment.score = if max > 0.0 { (total / max).min(1.0) } else { 1.0 };
    Some(assessment)
}

fn skills_score(required: &[SkillLevel], nice_to_have: &[SkillLevel], have: &[SkillLevel]) -> Option<f64> {
    assess_skills(required, nice_to_have, have).map(|a| a.score)
}

/// Stated experience, else the average months recorded across skills.
/// Absent when neither is known.
pub fn experience_months(profile: &ProfileSignals) -> Option<u32> {
    if let Some(months) = profile.experience_months {
        return Some(months);
    }
    if profile.skills.iter().all(|s| s.months.is_none()) {
        return None;
    }
    // skills without a record count as zero months
    let total: u64 = profile.skills.iter().map(|s| u64::from(s.months.unwrap_or(0))).sum();
    Some((total / profile.skills.len() as u64) as u32)
}

/// Logistic curve approaching 1 as experience grows
fn experience_score(months: u32) -> f64 {
    let months = months as f64;
    1.0 / (1.0 + (-EXPERIENCE_STEEPNESS * (months - EXPERIENCE_MIDPOINT_MONTHS)).exp())
}

fn verification_score(required: &[String], have: &[String]) -> Option<f64> {
    if required.is_empty() {
        return None;
    }
    let passed = required.iter().filter(|r| have.contains(r)).count();
    Some(passed as f64 / required.len() as f64)
}

fn availability_score(
    window: DateWindow,
    start: NaiveDate,
    assignment_hours: Option<Range>,
    candidate_hours: Option<Range>,
) -> f64 {
    if start < window.earliest || start > window.latest {
        return 0.0;
    }

    let span = (window.latest - window.earliest).num_days() as f64 + 1.0;
    let offset = (start - window.earliest).num_days() as f64;
    let date_score = 1.0 - offset / span;

    let (assignment_hours, candidate_hours) = match (assignment_hours, candidate_hours) {
        (Some(a), Some(c)) => (a, c),
        _ => return date_score,
    };

    let overlap_min = assignment_hours.min.max(candidate_hours.min);
    let overlap_max = assignment_hours.max.min(candidate_hours.max);
    if overlap_min > overlap_max {
        return 0.0;
    }

    let union = assignment_hours.max.max(candidate_hours.max) - assignment_hours.min.min(candidate_hours.min);
    let hours_score = (overlap_max - overlap_min) / union.max(1.0);

    (date_score + hours_score) / 2.0
}

fn location_score(
    assignment: LocationMode,
    candidate: LocationMode,
    assignment_country: Option<&str>,
    candidate_country: Option<&str>,
) -> f64 {
    use LocationMode::*;

    match (assignment, candidate) {
        (Remote, _) | (_, Remote) => 1.0,
        (Hybrid, Hybrid) | (Hybrid, Onsite) | (Onsite, Hybrid) => 0.9,
        (Onsite, Onsite) => match (assignment_country, candidate_country) {
            (Some(a), Some(c)) if a.eq_ignore_ascii_case(c) => 1.0,
            (Some(_), Some(_)) => 0.0,
            _ => 0.5,
        },
    }
}

/// Share of the candidate's range covered by the assignment's range
fn compensation_score(assignment: Range, candidate: Range) -> f64 {
    let overlap_min = assignment.min.max(candidate.min);
    let overlap_max = assignment.max.min(candidate.max);
    if overlap_min > overlap_max {
        return 0.0;
    }
    let candidate_size = candidate.max - candidate.min;
    ((overlap_max - overlap_min) / candidate_size.max(1.0)).min(1.0)
}
