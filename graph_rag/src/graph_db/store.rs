use async_trait::async_trait;
use biograph_models::Row;

use crate::catalogue::GraphToolCall;
use crate::errors::GraphResult;
use crate::models::GraphStats;

/// Read side of the graph: catalogue queries and statistics
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run one validated catalogue query. Rows keep the statement's order.
    async fn execute(&self, call: &GraphToolCall) -> GraphResult<Vec<Row>>;

    async fn stats(&self) -> GraphResult<GraphStats>;
}
