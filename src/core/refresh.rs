use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::core::bounded;
use crate::core::generator::MatchGenerator;
use crate::error::MatchError;
use crate::services::ProfileRepository;

/// Shortest period accepted by [`MatchRefresher::run_forever`]; tokio rejects zero
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Limits for one refresh run
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    /// Profiles picked per run
    pub batch_size: usize,
    /// Profiles refreshed longer ago than this are stale
    pub stale_after: chrono::Duration,
    /// Wall-clock budget for the whole run
    pub max_run: Duration,
    pub per_profile_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            stale_after: chrono::Duration::hours(24),
            max_run: Duration::from_secs(240),
            per_profile_timeout: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFailure {
    pub profile_id: Uuid,
    pub reason: String,
}

/// Outcome of one refresh run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: Vec<ProfileFailure>,
    /// Stale profiles left for the next run after cancellation or the deadline
    pub skipped: usize,
    pub matches_created: usize,
    pub cancelled: bool,
    pub deadline_reached: bool,
}

/// Regenerates matches for profiles whose matches have gone stale
pub struct MatchRefresher {
    generator: Arc<MatchGenerator>,
    profiles: Arc<dyn ProfileRepository>,
    options: RefreshOptions,
}

impl MatchRefresher {
    pub fn new(
        generator: Arc<MatchGenerator>,
        profiles: Arc<dyn ProfileRepository>,
        options: RefreshOptions,
    ) -> Self {
        Self {
            generator,
            profiles,
            options,
        }
    }

    /// Process one batch of stale profiles.
    ///
    /// Cancellation and the run deadline are checked between profiles. Each
    /// profile is isolated: its failure or timeout is recorded and the batch
    /// moves on.
    pub async fn run_once(&self, shutdown: &watch::Receiver<bool>) -> Result<RefreshSummary, MatchError> {
        let started = Instant::now();
        // None when the budget is too large to represent: the run is unbounded
        let deadline = started.checked_add(self.options.max_run);
        let cutoff = Utc::now()
            .checked_sub_signed(self.options.stale_after)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let stale = bounded(
            self.options.fetch_timeout,
            "stale profile listing",
            self.profiles.list_stale_profiles(cutoff, self.options.batch_size),
        )
        .await?;

        let mut summary = RefreshSummary::default();

        for (position, profile_id) in stale.iter().enumerate() {
            if *shutdown.borrow() {
                summary.cancelled = true;
                summary.skipped = stale.len() - position;
                break;
            }

            let remaining = deadline.map_or(Duration::MAX, |d| d.saturating_duration_since(Instant::now()));
            if remaining.is_zero() {
                summary.deadline_reached = true;
                summary.skipped = stale.len() - position;
                break;
            }

            let limit = self.options.per_profile_timeout.min(remaining);
            summary.processed += 1;

            match tokio::time::timeout(limit, self.generator.generate_matches(*profile_id)).await {
                Ok(Ok(report)) => {
                    summary.succeeded += 1;
                    summary.matches_created += report.created.len();
                }
                Ok(Err(e)) => {
                    tracing::warn!("Refresh failed for profile {}: {}", profile_id, e);
                    summary.failed.push(ProfileFailure {
                        profile_id: *profile_id,
                        reason: e.to_string(),
                    });
                }
                Err(_) => {
                    tracing::warn!(
                        "Refresh for profile {} timed out after {}ms",
                        profile_id,
                        limit.as_millis()
                    );
                    summary.failed.push(ProfileFailure {
                        profile_id: *profile_id,
                        reason: format!("timed out after {}ms", limit.as_millis()),
                    });
                }
            }
        }

        tracing::info!(
            "Refresh run finished in {}ms: {} processed, {} succeeded, {} failed, {} skipped, {} matches created",
            started.elapsed().as_millis(),
            summary.processed,
            summary.succeeded,
            summary.failed.len(),
            summary.skipped,
            summary.matches_created
        );

        Ok(summary)
    }

    /// Run on a fixed interval until `shutdown` flips to true or its sender is dropped
    pub async fn run_forever(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once(&shutdown).await {
                        tracing::error!("Refresh run failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Match refresher stopping");
                        break;
                    }
                }
            }
        }
    }
}
