use actix_web::{web, HttpResponse};
use biograph_models::{NodeCounts, StatsResponse};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::errors::QueryError;
use crate::state::AppState;

/// Await a store call under the request timeout
async fn bounded<T, E>(
    limit: Duration,
    what: &str,
    call: impl Future<Output = Result<T, E>>,
) -> Result<T, QueryError>
where
    QueryError: From<E>,
{
    match timeout(limit, call).await {
        Ok(result) => result.map_err(QueryError::from),
        Err(_) => Err(QueryError::DownstreamTimeout(format!("{what} after {limit:?}"))),
    }
}

/// Live counts from both stores
pub async fn stats(state: web::Data<AppState>) -> Result<HttpResponse, QueryError> {
    let limit = state.orchestrator.settings().timeout();
    let papers_indexed = bounded(limit, "vector count", state.vectors.count()).await?;

    let (neo4j_nodes, citation_relationships) = match &state.graph {
        Some(graph) => {
            let stats = bounded(limit, "graph stats", graph.stats()).await?;
            (stats.node_counts(), stats.citation_relationships())
        }
        None => (NodeCounts::default(), 0),
    };

    Ok(HttpResponse::Ok().json(StatsResponse {
        papers_indexed,
        neo4j_nodes,
        citation_relationships,
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/stats", web::get().to(stats));
}
