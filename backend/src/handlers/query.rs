use actix_web::{web, HttpRequest, HttpResponse};
use biograph_models::{QueryRequest, QueryResponse};
use biograph_observability::get_request_id;
use tracing::{error, info};

use crate::errors::QueryError;
use crate::state::AppState;

pub async fn query(
    req: HttpRequest,
    body: web::Json<QueryRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, QueryError> {
    let request_id = get_request_id(&req);
    let request = body.into_inner();
    info!(
        request_id = %request_id.0,
        "🔷 Query request ({}, top_k={:?})",
        request.query_type,
        request.top_k
    );

    let answer = state
        .orchestrator
        .handle_query(&request.question, request.query_type, request.top_k)
        .await
        .map_err(|e| {
            error!(request_id = %request_id.0, "Query failed: {}", e);
            e
        })?;

    Ok(HttpResponse::Ok().json(QueryResponse::from(&answer)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/query", web::post().to(query));
}
