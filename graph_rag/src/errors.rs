use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph store unavailable: {0}")]
    Unavailable(String),

    #[error("Neo4j error: {0}")]
    Neo4j(String),

    #[error("Unknown graph tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphError {
    pub(crate) fn invalid(tool: &str, reason: impl Into<String>) -> Self {
        GraphError::InvalidArguments {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }

    /// Failures worth another attempt on a read-only query
    pub fn is_transient(&self) -> bool {
        matches!(self, GraphError::Unavailable(_) | GraphError::Timeout(_))
    }
}

impl From<neo4rs::Error> for GraphError {
    /// Transport failures are `Unavailable` so reads can be retried.
    /// Everything else (Cypher, auth, decoding) is a permanent `Neo4j` error.
    fn from(err: neo4rs::Error) -> Self {
        match err {
            neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError => {
                GraphError::Unavailable(err.to_string())
            }
            other => GraphError::Neo4j(other.to_string()),
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
