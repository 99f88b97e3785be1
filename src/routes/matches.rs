use actix_web::{web, HttpResponse};

use crate::core::near::{DEFAULT_NEAR_LIMIT, DEFAULT_NEAR_MIN_SCORE};
use crate::core::presets::normalize_weights;
use crate::core::scoring::compute_match_score;
use crate::error::MatchError;
use crate::models::{
    GenerateMatchesRequest, HealthResponse, MatchesResponse, NearMatchQuery, NearMatchesResponse,
    ProfileQuery, ScoreRequest,
};
use crate::routes::{validate, AppState};

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/generate", web::post().to(generate_matches))
        .route("/matches/score", web::post().to(score_pair))
        .route("/matches/near", web::get().to(list_near_matches))
        .route("/matches", web::get().to(list_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let (store, healthy) = match &state.postgres {
        Some(postgres) => ("postgres", postgres.health_check().await.unwrap_or(false)),
        None => ("memory", true),
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store.to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Generate matches endpoint
///
/// POST /api/v1/matches/generate
///
/// Request body:
/// ```json
/// { "profileId": "uuid" }
/// ```
async fn generate_matches(
    state: web::Data<AppState>,
    req: web::Json<GenerateMatchesRequest>,
) -> Result<HttpResponse, MatchError> {
    validate(&req.0)?;

    tracing::info!("Generating matches for profile: {}", req.profile_id);
    let report = state.generator.generate_matches(req.profile_id).await?;

    Ok(HttpResponse::Ok().json(report))
}

/// Active matches endpoint
///
/// GET /api/v1/matches?profileId=uuid
async fn list_matches(
    state: web::Data<AppState>,
    query: web::Query<ProfileQuery>,
) -> Result<HttpResponse, MatchError> {
    let matches = state.generator.list_active_matches(query.profile_id).await?;

    Ok(HttpResponse::Ok().json(MatchesResponse {
        total_results: matches.len(),
        matches,
    }))
}

/// Near matches endpoint
///
/// GET /api/v1/matches/near?profileId=uuid&limit=10&minScore=30
async fn list_near_matches(
    state: web::Data<AppState>,
    query: web::Query<NearMatchQuery>,
) -> Result<HttpResponse, MatchError> {
    validate(&query.0)?;

    let near = state
        .generator
        .list_near_matches(
            query.profile_id,
            query.min_score.unwrap_or(DEFAULT_NEAR_MIN_SCORE),
            query.limit.unwrap_or(DEFAULT_NEAR_LIMIT),
        )
        .await?;

    Ok(HttpResponse::Ok().json(NearMatchesResponse {
        total_results: near.len(),
        near_matches: near,
    }))
}

/// Score one profile against one assignment without persisting anything
///
/// POST /api/v1/matches/score
async fn score_pair(
    state: web::Data<AppState>,
    req: web::Json<ScoreRequest>,
) -> Result<HttpResponse, MatchError> {
    validate(&req.0)?;

    let weights = match (&req.preset, &req.weights) {
        (Some(preset), _) => preset.weights(),
        (None, Some(partial)) => normalize_weights(partial),
        (None, None) => state.default_weights,
    };

    let result = compute_match_score(&req.profile, &req.assignment, &weights)?;
    tracing::debug!("Scored ad-hoc pair: {}", result.overall_score);

    Ok(HttpResponse::Ok().json(result))
}
