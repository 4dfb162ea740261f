use async_trait::async_trait;
use biograph_config::Neo4jSettings;
use biograph_models::Row;
use neo4rs::{query, ConfigBuilder, Graph, Query};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::catalogue::{GraphTool, GraphToolCall, ParamValue};
use crate::errors::{GraphError, GraphResult};
use crate::graph_db::ingestion::GraphIngestor;
use crate::graph_db::store::GraphStore;
use crate::models::*;

const STATS_QUERY: &str = "
CALL { MATCH (p:Paper) RETURN count(p) AS papers }
CALL { MATCH (a:Author) RETURN count(a) AS authors }
CALL { MATCH (m:MeshTerm) RETURN count(m) AS mesh_terms }
CALL { MATCH (g:Gene) RETURN count(g) AS genes }
CALL { MATCH (:Paper)-[c:CITES]->(:Paper) RETURN count(c) AS citations }
RETURN papers, authors, mesh_terms, genes, citations";

/// Catalogue queries and statistics served from Neo4j (local or AuraDB)
pub struct Neo4jGraphStore {
    graph: Arc<Graph>,
    uri: String,
}

impl Neo4jGraphStore {
    /// Connect and verify the connection with a trivial query, giving up
    /// after `connect_timeout`.
    ///
    /// Supports `bolt://localhost:7687` as well as AuraDB URIs
    /// (`neo4j+s://xxxxx.databases.neo4j.io`).
    pub async fn connect(settings: &Neo4jSettings) -> GraphResult<Self> {
        let limit = settings.connect_timeout();
        match tokio::time::timeout(limit, Self::open(settings)).await {
            Ok(result) => result,
            Err(_) => Err(GraphError::Timeout(format!(
                "connecting to Neo4j at {} after {:?}",
                settings.uri, limit
            ))),
        }
    }

    async fn open(settings: &Neo4jSettings) -> GraphResult<Self> {
        tracing::info!("🔷 Connecting to Neo4j at: {}", settings.uri);
        if settings.is_aura() {
            tracing::info!("🔷 AuraDB instance detected, using routed TLS connection");
        }

        let config = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(settings.user.as_str())
            .password(settings.password.expose())
            .db(settings.database.as_str())
            .fetch_size(500)
            .max_connections(settings.max_connections)
            .build()
            .map_err(|e| GraphError::Unavailable(format!("Failed to build Neo4j config: {}", e)))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| GraphError::Unavailable(format!("Failed to connect to Neo4j: {}", e)))?;

        let mut result = graph
            .execute(query("RETURN 1 AS test"))
            .await
            .map_err(|e| GraphError::Unavailable(format!("Connection test failed: {}", e)))?;

        if result.next().await.map_err(GraphError::from)?.is_some() {
            tracing::info!("✅ Neo4j connection established successfully");
        }

        Ok(Self {
            graph: Arc::new(graph),
            uri: settings.uri.clone(),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Writer sharing this store's connection pool
    pub fn ingestor(&self) -> GraphIngestor {
        GraphIngestor::new(self.graph.clone())
    }

    /// Detach-delete every node in the database
    pub async fn delete_graph(&self) -> GraphResult<()> {
        self.graph
            .run(query("MATCH (n) DETACH DELETE n"))
            .await
            .map_err(GraphError::from)?;
        tracing::info!("🗑️ Deleted all nodes and relationships");
        Ok(())
    }

    async fn fetch<T>(&self, q: Query) -> GraphResult<Vec<Row>>
    where
        T: DeserializeOwned + Serialize,
    {
        let mut result = self.graph.execute(q).await.map_err(GraphError::from)?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await.map_err(GraphError::from)? {
            let typed: T = row
                .to()
                .map_err(|e| GraphError::Neo4j(format!("Unexpected row shape: {}", e)))?;
            if let Value::Object(map) = serde_json::to_value(typed)? {
                rows.push(map);
            }
        }
        Ok(rows)
    }
}

fn bind(call: &GraphToolCall) -> Query {
    call.params()
        .into_iter()
        .fold(query(call.cypher()), |q, (key, value)| match value {
            ParamValue::Text(text) => q.param(key, text),
            ParamValue::Integer(n) => q.param(key, n),
            ParamValue::Flag(flag) => q.param(key, flag),
            ParamValue::TextList(items) => q.param(key, items),
        })
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn execute(&self, call: &GraphToolCall) -> GraphResult<Vec<Row>> {
        let q = bind(call);
        let rows = match call.tool() {
            GraphTool::CollaboratorsWithTopics => self.fetch::<CollaboratorRow>(q).await?,
            GraphTool::CollaboratingInstitutions => self.fetch::<InstitutionPairRow>(q).await?,
            GraphTool::RelatedPapersByMesh => self.fetch::<RelatedPaperRow>(q).await?,
            GraphTool::GenesInSamePapers => self.fetch::<CoMentionedGeneRow>(q).await?,
            GraphTool::PapersByAuthor => self.fetch::<AuthorPaperRow>(q).await?,
            GraphTool::PapersByMeshTerm => self.fetch::<MeshPaperRow>(q).await?,
            GraphTool::CitationNetwork => self.fetch::<CitationRow>(q).await?,
            GraphTool::ProlificAuthors => self.fetch::<ProlificAuthorRow>(q).await?,
        };
        tracing::debug!(tool = call.name(), rows = rows.len(), "Graph tool executed");
        Ok(rows)
    }

    async fn stats(&self) -> GraphResult<GraphStats> {
        let mut result = self
            .graph
            .execute(query(STATS_QUERY))
            .await
            .map_err(GraphError::from)?;

        match result.next().await.map_err(GraphError::from)? {
            Some(row) => row
                .to::<GraphStats>()
                .map_err(|e| GraphError::Neo4j(format!("Unexpected stats shape: {}", e))),
            None => Ok(GraphStats::default()),
        }
    }
}
