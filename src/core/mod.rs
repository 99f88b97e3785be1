// Core algorithm exports
pub mod conversation;
pub mod generator;
pub mod interest;
pub mod near;
pub mod presets;
pub mod refresh;
pub mod scoring;
pub mod signals;

pub use conversation::{ConversationStageMachine, DisplayIdentity};
pub use generator::{AssignmentFailure, GenerationReport, MatchGenerator, MIN_MATCH_SCORE};
pub use interest::{InterestLedger, InterestOutcome};
pub use near::{NearMatch, NearMatchReason};
pub use presets::{get_preset, normalize_weights, Dimension, PartialWeights, WeightConfig, WeightPreset, WeightSet};
pub use refresh::{MatchRefresher, ProfileFailure, RefreshOptions, RefreshSummary};
pub use scoring::{compute_match_score, score_dimensions};
pub use signals::{
    assess_skills, derive_dimension_scores, AssignmentSignals, DimensionScores, ProfileSignals,
    SkillAssessment, SkillGap,
};

use std::future::Future;
use std::time::Duration;

use crate::error::MatchError;
use crate::services::StoreError;

/// Run a store call with an upper bound on its duration.
///
/// A call that exceeds `limit` becomes [`MatchError::Downstream`].
pub(crate) async fn bounded<T, F>(limit: Duration, what: &str, call: F) -> Result<T, MatchError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(MatchError::from),
        Err(_) => Err(MatchError::Downstream(format!(
            "{} timed out after {}ms",
            what,
            limit.as_millis()
        ))),
    }
}
