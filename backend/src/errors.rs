use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use biograph_models::ErrorResponse;
use graph_rag::GraphError;
use thiserror::Error;
use vector_rag::VectorError;

use crate::services::llm::LlmError;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Downstream timeout: {0}")]
    DownstreamTimeout(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Answer synthesis failed: {0}")]
    Synthesis(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// Whether the same request may succeed if sent again
    pub fn retryable(&self) -> bool {
        !matches!(self, QueryError::InvalidRequest(_) | QueryError::Internal(_))
    }
}

impl ResponseError for QueryError {
    fn status_code(&self) -> StatusCode {
        match self {
            QueryError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            QueryError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            QueryError::DownstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            QueryError::Embedding(_) | QueryError::Synthesis(_) => StatusCode::BAD_GATEWAY,
            QueryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            retryable: self.retryable(),
        })
    }
}

impl From<VectorError> for QueryError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::StoreUnavailable(msg) => QueryError::StoreUnavailable(msg),
            // Client input is validated before search, so this is a misconfiguration
            VectorError::InvalidQuery(msg) => QueryError::Internal(msg),
            VectorError::Embedding(msg) => QueryError::Embedding(msg),
            VectorError::Timeout(msg) => QueryError::DownstreamTimeout(msg),
            VectorError::Serialization(e) => QueryError::Internal(e.to_string()),
        }
    }
}

impl From<GraphError> for QueryError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Unavailable(msg) | GraphError::Neo4j(msg) => QueryError::StoreUnavailable(msg),
            GraphError::Timeout(msg) => QueryError::DownstreamTimeout(msg),
            GraphError::UnknownTool(_) | GraphError::InvalidArguments { .. } => {
                QueryError::InvalidRequest(err.to_string())
            }
            GraphError::Serialization(e) => QueryError::Internal(e.to_string()),
        }
    }
}

impl From<LlmError> for QueryError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(msg) => QueryError::DownstreamTimeout(msg),
            other => QueryError::Synthesis(other.to_string()),
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (QueryError::InvalidRequest("q".into()), 400, false),
            (QueryError::StoreUnavailable("s".into()), 503, true),
            (QueryError::DownstreamTimeout("t".into()), 504, true),
            (QueryError::Embedding("e".into()), 502, true),
            (QueryError::Synthesis("l".into()), 502, true),
            (QueryError::Internal("i".into()), 500, false),
        ];
        for (err, status, retryable) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err}");
            assert_eq!(err.retryable(), retryable, "{err}");
        }
    }

    #[test]
    fn test_adapter_errors_convert() {
        assert!(matches!(
            QueryError::from(VectorError::Timeout("search".into())),
            QueryError::DownstreamTimeout(_)
        ));
        assert!(matches!(
            QueryError::from(VectorError::InvalidQuery("expected 1536 dimensions, got 768".into())),
            QueryError::Internal(_)
        ));
        assert!(matches!(
            QueryError::from(GraphError::Unavailable("down".into())),
            QueryError::StoreUnavailable(_)
        ));
        assert!(matches!(
            QueryError::from(LlmError::Timeout("chat".into())),
            QueryError::DownstreamTimeout(_)
        ));
        assert!(matches!(
            QueryError::from(LlmError::EmptyResponse),
            QueryError::Synthesis(_)
        ));
    }

    #[actix_web::test]
    async fn test_error_body_shape() {
        let response = QueryError::StoreUnavailable("qdrant down".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["retryable"], true);
        assert!(json["error"].as_str().unwrap().contains("qdrant down"));
    }
}
