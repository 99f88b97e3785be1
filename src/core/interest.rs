use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::core::bounded;
use crate::error::MatchError;
use crate::models::{Interest, InterestTarget};
use crate::services::{
    AnalyticsEvent, AssignmentRepository, EventKind, EventPublisher, InsertOutcome,
    InterestRepository,
};

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of recording an interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestOutcome {
    pub mutual: bool,
    /// The other side of the mutual pair, when there is one
    pub counterpart_profile_id: Option<Uuid>,
}

/// Append-only ledger of interest between candidates and assignments.
///
/// Reports mutual interest but never opens conversations itself.
pub struct InterestLedger {
    interests: Arc<dyn InterestRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    events: EventPublisher,
    fetch_timeout: Duration,
}

impl InterestLedger {
    pub fn new(
        interests: Arc<dyn InterestRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        events: EventPublisher,
    ) -> Self {
        Self {
            interests,
            assignments,
            events,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn from_store<S>(store: Arc<S>, events: EventPublisher) -> Self
    where
        S: InterestRepository + AssignmentRepository + 'static,
    {
        Self::new(store.clone(), store, events)
    }

    pub fn with_fetch_timeout(mut self, fetch: Duration) -> Self {
        self.fetch_timeout = fetch;
        self
    }

    /// Record that `actor` is interested, then report whether the interest is mutual.
    ///
    /// Recording the same interest again is a no-op and yields the same outcome.
    pub async fn record_interest(
        &self,
        actor_profile_id: Uuid,
        assignment_id: Uuid,
        target: InterestTarget,
    ) -> Result<InterestOutcome, MatchError> {
        if target == InterestTarget::TargetedAt(actor_profile_id) {
            return Err(MatchError::validation("a profile cannot target itself"));
        }

        bounded(
            self.fetch_timeout,
            "assignment fetch",
            self.assignments.get_assignment(assignment_id),
        )
        .await?
        .ok_or_else(|| MatchError::not_found("assignment", assignment_id))?;

        let interest = Interest::new(actor_profile_id, assignment_id, target);
        let inserted = bounded(self.fetch_timeout, "interest insert", self.interests.insert_interest(&interest))
            .await?
            == InsertOutcome::Inserted;

        let existing = self.list_interests(assignment_id).await?;
        let counterpart = find_counterpart(&existing, actor_profile_id, target);
        let outcome = InterestOutcome {
            mutual: counterpart.is_some(),
            counterpart_profile_id: counterpart,
        };

        if inserted {
            tracing::info!(
                "Recorded interest of {} in assignment {} (target: {:?}, mutual: {})",
                actor_profile_id,
                assignment_id,
                target.profile_id(),
                outcome.mutual
            );

            self.events.publish(AnalyticsEvent::new(
                EventKind::InterestRecorded,
                json!({
                    "actorProfileId": actor_profile_id,
                    "assignmentId": assignment_id,
                    "targetProfileId": target.profile_id(),
                }),
            ));

            if let Some(counterpart) = counterpart {
                self.events.publish(AnalyticsEvent::new(
                    EventKind::MutualInterest,
                    json!({
                        "assignmentId": assignment_id,
                        "profileIds": [actor_profile_id, counterpart],
                    }),
                ));
            }
        } else {
            tracing::debug!(
                "Interest of {} in assignment {} already recorded",
                actor_profile_id,
                assignment_id
            );
        }

        Ok(outcome)
    }

    /// Every interest recorded against an assignment, oldest first
    pub async fn list_interests(&self, assignment_id: Uuid) -> Result<Vec<Interest>, MatchError> {
        bounded(
            self.fetch_timeout,
            "interest listing",
            self.interests.list_interests(assignment_id),
        )
        .await
    }
}

/// Find the profile whose recorded interest answers `actor`'s interest.
///
/// A targeted interest (organization to candidate) is answered by the
/// candidate's general interest in the assignment or by the candidate
/// targeting the organization back. A general interest is answered by any
/// interest on the assignment that targets the actor.
pub fn find_counterpart(interests: &[Interest], actor: Uuid, target: InterestTarget) -> Option<Uuid> {
    match target {
        InterestTarget::TargetedAt(candidate) => interests
            .iter()
            .find(|i| {
                i.actor_profile_id == candidate
                    && match i.target {
                        InterestTarget::General => true,
                        InterestTarget::TargetedAt(back) => back == actor,
                    }
            })
            .map(|_| candidate),
        InterestTarget::General => interests
            .iter()
            .find(|i| i.actor_profile_id != actor && i.target == InterestTarget::TargetedAt(actor))
            .map(|i| i.actor_profile_id),
    }
}
