use actix_web::{web, HttpResponse};
use biograph_models::HealthResponse;
use std::collections::HashMap;

use crate::state::AppState;

/// Liveness only; never calls a downstream service
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let neo4j = if state.graph.is_some() { "configured" } else { "not configured" };
    let services = HashMap::from([
        ("api".to_string(), "running".to_string()),
        ("qdrant".to_string(), "configured".to_string()),
        ("neo4j".to_string(), neo4j.to_string()),
    ]);

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        services,
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
