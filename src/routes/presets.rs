use actix_web::{web, HttpResponse};

use crate::core::presets::{normalize_weights, WeightPreset};
use crate::error::MatchError;
use crate::models::{NormalizeWeightsRequest, PresetResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/presets/normalize", web::post().to(normalize))
        .route("/presets/{name}", web::get().to(get_preset));
}

/// GET /api/v1/presets/{name}
async fn get_preset(path: web::Path<String>) -> Result<HttpResponse, MatchError> {
    let preset: WeightPreset = path.parse()?;

    Ok(HttpResponse::Ok().json(PresetResponse {
        preset,
        weights: preset.weights(),
    }))
}

/// POST /api/v1/presets/normalize
///
/// Request body:
/// ```json
/// { "weights": { "skills": 2, "values": 1 } }
/// ```
async fn normalize(req: web::Json<NormalizeWeightsRequest>) -> HttpResponse {
    HttpResponse::Ok().json(normalize_weights(&req.weights))
}
