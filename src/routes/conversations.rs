use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error::MatchError;
use crate::models::{ConversationViewResponse, ViewerQuery};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/conversations/{id}/reveal", web::post().to(reveal))
        .route("/conversations/{id}", web::get().to(view));
}

/// Identity reveal hook for the scheduling integration
///
/// POST /api/v1/conversations/{id}/reveal
///
/// Safe to call repeatedly.
async fn reveal(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, MatchError> {
    state.conversations.trigger_identity_reveal(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/conversations/{id}?viewerId=uuid
async fn view(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ViewerQuery>,
) -> Result<HttpResponse, MatchError> {
    let conversation = state.conversations.get_conversation(path.into_inner()).await?;
    let other_party = state
        .conversations
        .identity_in(&conversation, query.viewer_id)
        .await?;

    Ok(HttpResponse::Ok().json(ConversationViewResponse {
        conversation_id: conversation.id,
        assignment_id: conversation.assignment_id,
        stage: conversation.stage(),
        revealed: conversation.is_revealed(),
        other_party,
    }))
}
