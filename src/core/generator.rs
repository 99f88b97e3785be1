use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::core::bounded;
use crate::core::near::{near_match_reason, NearMatch, MAX_NEAR_LIMIT};
use crate::core::presets::{WeightConfig, WeightPreset, WeightSet};
use crate::core::scoring::compute_match_score;
use crate::core::signals::{assess_skills, derive_dimension_scores};
use crate::error::MatchError;
use crate::models::{Assignment, Match, Profile};
use crate::services::{
    AnalyticsEvent, AssignmentRepository, EventKind, EventPublisher, InsertOutcome,
    MatchRepository, ProfileRepository,
};

/// Matches scoring below this are never persisted
pub const MIN_MATCH_SCORE: u8 = 40;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// One assignment that could not be processed during a generation run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentFailure {
    pub assignment_id: Uuid,
    pub reason: String,
}

/// Outcome of [`MatchGenerator::generate_matches`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub created: Vec<Match>,
    pub skipped_existing: usize,
    pub skipped_below_threshold: usize,
    pub failures: Vec<AssignmentFailure>,
}

enum PairOutcome {
    Created(Match),
    Existing,
    BelowThreshold(u8),
}

/// Scores a profile against every open assignment and persists new matches
pub struct MatchGenerator {
    profiles: Arc<dyn ProfileRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    matches: Arc<dyn MatchRepository>,
    events: EventPublisher,
    default_weights: WeightSet,
    fetch_timeout: Duration,
}

impl MatchGenerator {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        matches: Arc<dyn MatchRepository>,
        events: EventPublisher,
    ) -> Self {
        Self {
            profiles,
            assignments,
            matches,
            events,
            default_weights: WeightPreset::default().weights(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Build from one store backing every repository
    pub fn from_store<S>(store: Arc<S>, events: EventPublisher) -> Self
    where
        S: ProfileRepository + AssignmentRepository + MatchRepository + 'static,
    {
        Self::new(store.clone(), store.clone(), store, events)
    }

    /// Weights for assignments without their own configuration
    pub fn with_default_weights(mut self, weights: WeightSet) -> Self {
        self.default_weights = weights;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch: Duration) -> Self {
        self.fetch_timeout = fetch;
        self
    }

    /// Generate matches for one profile.
    ///
    /// Fails only for request-level problems (unknown or not-ready profile,
    /// unavailable assignment list). Errors for a single assignment are
    /// collected in the report and the run continues.
    pub async fn generate_matches(&self, profile_id: Uuid) -> Result<GenerationReport, MatchError> {
        let profile = bounded(self.fetch_timeout, "profile fetch", self.profiles.get_profile(profile_id))
            .await?
            .ok_or_else(|| MatchError::not_found("profile", profile_id))?;

        if !profile.ready_for_matching {
            return Err(MatchError::NotReady(profile_id));
        }

        let assignments = bounded(
            self.fetch_timeout,
            "published assignments fetch",
            self.assignments.list_published(),
        )
        .await?;

        let now = Utc::now();
        let mut report = GenerationReport::default();

        for assignment in &assignments {
            match self.generate_pair(&profile, assignment, now).await {
                Ok(PairOutcome::Created(m)) => {
                    self.publish_suggested(&m);
                    report.created.push(m);
                }
                Ok(PairOutcome::Existing) => report.skipped_existing += 1,
                Ok(PairOutcome::BelowThreshold(score)) => {
                    tracing::debug!(
                        "Skipping assignment {} for profile {}: score {} below {}",
                        assignment.id,
                        profile_id,
                        score,
                        MIN_MATCH_SCORE
                    );
                    report.skipped_below_threshold += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        profile_id = %profile_id,
                        assignment_id = %assignment.id,
                        error = %e,
                        "Match generation failed for assignment"
                    );
                    report.failures.push(AssignmentFailure {
                        assignment_id: assignment.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Err(e) = bounded(
            self.fetch_timeout,
            "refresh marker update",
            self.profiles.mark_matches_refreshed(profile_id, now),
        )
        .await
        {
            tracing::warn!("Could not mark profile {} as refreshed: {}", profile_id, e);
        }

        tracing::info!(
            "Generated matches for profile {}: {} created, {} existing, {} below threshold, {} failed",
            profile_id,
            report.created.len(),
            report.skipped_existing,
            report.skipped_below_threshold,
            report.failures.len()
        );

        Ok(report)
    }

    /// Non-expired matches for a profile, best score first
    pub async fn list_active_matches(&self, profile_id: Uuid) -> Result<Vec<Match>, MatchError> {
        let now = Utc::now();
        let mut active: Vec<Match> = bounded(
            self.fetch_timeout,
            "match listing",
            self.matches.list_matches_for_profile(profile_id),
        )
        .await?
        .into_iter()
        .filter(|m| !m.is_expired(now))
        .collect();

        active.sort_by_key(|m| (Reverse(m.overall_score), m.assignment_id));

        self.events.publish(AnalyticsEvent::new(
            EventKind::MatchViewed,
            json!({ "profileId": profile_id, "count": active.len() }),
        ));

        Ok(active)
    }

    /// Open assignments the profile partially fits, best score first.
    ///
    /// Scored live and never persisted. Assignments failing must-have skills
    /// are kept and report which skills are missing or under-levelled.
    /// The profile does not need to be ready for matching.
    pub async fn list_near_matches(
        &self,
        profile_id: Uuid,
        min_score: u8,
        limit: usize,
    ) -> Result<Vec<NearMatch>, MatchError> {
        let profile = bounded(self.fetch_timeout, "profile fetch", self.profiles.get_profile(profile_id))
            .await?
            .ok_or_else(|| MatchError::not_found("profile", profile_id))?;

        let assignments = bounded(
            self.fetch_timeout,
            "published assignments fetch",
            self.assignments.list_published(),
        )
        .await?;

        let mut near = Vec::new();
        for assignment in assignments {
            let weights = self.weights_for(&assignment);
            let score = match compute_match_score(&profile.signals, &assignment.signals, &weights) {
                Ok(score) => score,
                Err(e) => {
                    tracing::warn!("Skipping assignment {} in near matches: {}", assignment.id, e);
                    continue;
                }
            };
            if score.overall_score < min_score {
                continue;
            }

            let dimensions = derive_dimension_scores(&profile.signals, &assignment.signals);
            let skills = assess_skills(
                &assignment.signals.required_skills,
                &assignment.signals.nice_to_have_skills,
                &profile.signals.skills,
            )
            .unwrap_or_default();
            let reason = near_match_reason(&dimensions, Some(&skills));

            near.push(NearMatch {
                assignment_id: assignment.id,
                role_title: assignment.role_title,
                reason,
                summary: reason.message(),
                missing_skills: skills.missing,
                skill_gaps: skills.gaps,
                score,
            });
        }

        near.sort_by_key(|n| (Reverse(n.overall_score()), n.assignment_id));
        near.truncate(limit.min(MAX_NEAR_LIMIT));

        tracing::debug!("Found {} near matches for profile {}", near.len(), profile_id);
        Ok(near)
    }

    /// Resolve the weights an assignment is scored with
    pub fn weights_for(&self, assignment: &Assignment) -> WeightSet {
        assignment
            .weights
            .as_ref()
            .map(WeightConfig::resolve)
            .unwrap_or(self.default_weights)
    }

    async fn generate_pair(
        &self,
        profile: &Profile,
        assignment: &Assignment,
        now: DateTime<Utc>,
    ) -> Result<PairOutcome, MatchError> {
        if bounded(
            self.fetch_timeout,
            "match lookup",
            self.matches.match_exists(profile.id, assignment.id),
        )
        .await?
        {
            return Ok(PairOutcome::Existing);
        }

        let weights = self.weights_for(assignment);
        let result = compute_match_score(&profile.signals, &assignment.signals, &weights)?;

        if result.overall_score < MIN_MATCH_SCORE {
            return Ok(PairOutcome::BelowThreshold(result.overall_score));
        }

        let candidate = Match::suggested(profile.id, assignment.id, result, now);
        match bounded(self.fetch_timeout, "match insert", self.matches.insert_match(&candidate)).await? {
            InsertOutcome::Inserted => Ok(PairOutcome::Created(candidate)),
            // a concurrent run created the same pair first
            InsertOutcome::AlreadyExists => Ok(PairOutcome::Existing),
        }
    }

    fn publish_suggested(&self, m: &Match) {
        self.events.publish(AnalyticsEvent::new(
            EventKind::MatchSuggested,
            json!({
                "matchId": m.id,
                "profileId": m.profile_id,
                "assignmentId": m.assignment_id,
                "overallScore": m.overall_score,
                "isStrongMatch": m.is_strong_match,
            }),
        ));
    }
}
