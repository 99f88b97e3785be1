use actix_web::{web, HttpResponse};

use crate::error::MatchError;
use crate::models::{
    AssignmentQuery, InterestTarget, InterestsResponse, RecordInterestRequest,
    RecordInterestResponse,
};
use crate::routes::{validate, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/interests", web::post().to(record_interest))
        .route("/interests", web::get().to(list_interests));
}

/// Record interest endpoint
///
/// POST /api/v1/interests
///
/// Request body:
/// ```json
/// {
///   "actorProfileId": "uuid",
///   "assignmentId": "uuid",
///   "targetProfileId": "uuid | null"
/// }
/// ```
///
/// A mutual pair gets a masked conversation; repeating the call returns the
/// same conversation.
async fn record_interest(
    state: web::Data<AppState>,
    req: web::Json<RecordInterestRequest>,
) -> Result<HttpResponse, MatchError> {
    validate(&req.0)?;

    let target = InterestTarget::from_option(req.target_profile_id);
    let outcome = state
        .ledger
        .record_interest(req.actor_profile_id, req.assignment_id, target)
        .await?;

    let conversation_id = match (outcome.counterpart_profile_id, target) {
        (None, _) => None,
        (Some(organization), InterestTarget::General) => {
            let conversation = state
                .conversations
                .open_conversation(req.assignment_id, req.actor_profile_id, organization, None)
                .await?;
            Some(conversation.id)
        }
        (Some(candidate), InterestTarget::TargetedAt(_)) => {
            let conversation = state
                .conversations
                .open_conversation(req.assignment_id, candidate, req.actor_profile_id, None)
                .await?;
            Some(conversation.id)
        }
    };

    Ok(HttpResponse::Ok().json(RecordInterestResponse {
        mutual: outcome.mutual,
        conversation_id,
    }))
}

/// GET /api/v1/interests?assignmentId=uuid
async fn list_interests(
    state: web::Data<AppState>,
    query: web::Query<AssignmentQuery>,
) -> Result<HttpResponse, MatchError> {
    let interests = state.ledger.list_interests(query.assignment_id).await?;
    Ok(HttpResponse::Ok().json(InterestsResponse { interests }))
}
