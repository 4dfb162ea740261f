use anyhow::{Context, Result};
use biograph_config::AppConfig;
use graph_rag::{GraphStore, Neo4jGraphStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use vector_rag::{OpenAiEmbeddingClient, QdrantVectorStore, VectorStore};

use crate::services::{OpenAiChatClient, QueryOrchestrator};

const DEFAULT_FRONTEND_DIR: &str = "frontend";

/// Shared, read-only state handed to every request handler
pub struct AppState {
    pub orchestrator: Arc<QueryOrchestrator>,
    pub vectors: Arc<dyn VectorStore>,
    pub graph: Option<Arc<dyn GraphStore>>,
    /// Directory holding `index.html`, when one was found at startup
    pub frontend_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<QueryOrchestrator>,
        vectors: Arc<dyn VectorStore>,
        graph: Option<Arc<dyn GraphStore>>,
        frontend_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            orchestrator,
            vectors,
            graph,
            frontend_dir,
        }
    }

    /// Build the production adapters. Fails fast when Neo4j is unreachable
    /// or the OpenAI key is missing.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        config
            .require_openai_key()
            .context("The query service needs an OpenAI API key")?;

        let timeout = config.query.timeout();
        let embedder = Arc::new(OpenAiEmbeddingClient::new(
            &config.openai,
            config.qdrant.embedding_dimension,
            timeout,
        ));
        let llm = Arc::new(OpenAiChatClient::new(&config.openai, timeout));

        let vectors: Arc<dyn VectorStore> = Arc::new(
            QdrantVectorStore::new(&config.qdrant).context("Failed to create Qdrant client")?,
        );
        info!(
            "📚 Qdrant collection '{}' at {}",
            config.qdrant.collection_name, config.qdrant.url
        );

        let neo4j = Neo4jGraphStore::connect(&config.neo4j)
            .await
            .context("Failed to connect to Neo4j")?;
        info!("✅ Connected to Neo4j at {}", neo4j.uri());
        let graph: Arc<dyn GraphStore> = Arc::new(neo4j);

        let orchestrator = Arc::new(QueryOrchestrator::new(
            embedder,
            vectors.clone(),
            Some(graph.clone()),
            llm,
            config.query.clone(),
        ));

        let frontend_dir = resolve_frontend_dir(config.server.frontend_path.as_deref());
        match &frontend_dir {
            Some(dir) => info!("🧾 Serving frontend from {}", dir.display()),
            None => warn!("⚠️ No frontend index.html found, GET / will return 404"),
        }

        Ok(Self::new(orchestrator, vectors, Some(graph), frontend_dir))
    }
}

/// The configured directory, else `./frontend`, if it holds an `index.html`
pub fn resolve_frontend_dir(configured: Option<&str>) -> Option<PathBuf> {
    let dir = configured
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(DEFAULT_FRONTEND_DIR).to_path_buf());
    dir.join("index.html").is_file().then_some(dir)
}
