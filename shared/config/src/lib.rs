//! Process-wide configuration for BioGraph services and CLIs.
//!
//! `AppConfig` is built once at startup and handed to every adapter by
//! reference. Nothing in the workspace reads the environment after that.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "Secret(<empty>)")
        } else {
            write!(f, "Secret(***)")
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: Secret,
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct Neo4jSettings {
    pub uri: String,
    pub user: String,
    pub password: Secret,
    pub database: String,
    pub max_connections: usize,
    /// Upper bound for connecting and the startup check query
    pub connect_timeout_secs: u64,
}

impl Neo4jSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// AuraDB URIs use the routing `neo4j+s` / `neo4j+ssc` schemes
    pub fn is_aura(&self) -> bool {
        self.uri.contains("neo4j.io")
            || self.uri.starts_with("neo4j+s://")
            || self.uri.starts_with("neo4j+ssc://")
    }
}

#[derive(Debug, Clone)]
pub struct QdrantSettings {
    pub url: String,
    pub api_key: Option<Secret>,
    pub collection_name: String,
    pub embedding_dimension: usize,
}

/// NCBI E-utilities access used by the dataset collector
#[derive(Debug, Clone)]
pub struct NcbiSettings {
    pub base_url: String,
    /// Contact address NCBI asks every client to send
    pub email: Option<String>,
    pub api_key: Option<Secret>,
    pub tool: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl NcbiSettings {
    /// NCBI allows 10 requests per second with a key and 3 without
    pub fn requests_per_second(&self) -> u32 {
        if self.api_key.is_some() {
            10
        } else {
            3
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub frontend_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub default_top_k: usize,
    pub max_top_k: usize,
    /// Character budget for retrieved abstracts inside a prompt
    pub context_char_budget: usize,
    pub timeout_secs: u64,
    /// Extra attempts for idempotent reads (vector search, graph tools)
    pub read_retries: u32,
    pub retry_backoff_ms: u64,
}

impl QuerySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            max_top_k: 50,
            context_char_budget: 12_000,
            timeout_secs: 60,
            read_retries: 1,
            retry_backoff_ms: 250,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai: OpenAiSettings,
    pub neo4j: Neo4jSettings,
    pub qdrant: QdrantSettings,
    pub server: ServerSettings,
    pub query: QuerySettings,
    pub ncbi: NcbiSettings,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        dotenv::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        tracing::debug!(
            collection = %config.qdrant.collection_name,
            neo4j_uri = %config.neo4j.uri,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Build from an explicit key/value map; missing keys fall back to defaults.
    pub fn from_map(values: &HashMap<String, String>) -> ConfigResult<Self> {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let openai = OpenAiSettings {
            api_key: Secret::new(or("OPENAI_API_KEY", "")),
            base_url: or("OPENAI_BASE_URL", "https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            model: or("OPENAI_MODEL", "gpt-4o-mini"),
            embedding_model: or("OPENAI_EMBEDDING_MODEL", "text-embedding-3-small"),
            temperature: parse_or(&get, "OPENAI_TEMPERATURE", 0.0)?,
            max_tokens: parse_or(&get, "OPENAI_MAX_TOKENS", 1500)?,
        };

        let neo4j = Neo4jSettings {
            uri: or("NEO4J_URI", "bolt://localhost:7687"),
            user: or("NEO4J_USER", "neo4j"),
            password: Secret::new(or("NEO4J_PASSWORD", "password")),
            database: or("NEO4J_DATABASE", "neo4j"),
            max_connections: parse_or(&get, "NEO4J_MAX_CONNECTIONS", 10)?,
            connect_timeout_secs: parse_or(&get, "NEO4J_CONNECT_TIMEOUT_SECS", 15)?,
        };

        let qdrant = QdrantSettings {
            url: or("QDRANT_URL", "http://localhost:6334"),
            api_key: get("QDRANT_API_KEY").map(Secret::new),
            collection_name: or("QDRANT_COLLECTION", "biomedical_papers"),
            embedding_dimension: parse_or(&get, "EMBEDDING_DIMENSION", 1536)?,
        };

        let server = ServerSettings {
            host: or("API_HOST", "0.0.0.0"),
            port: parse_or(&get, "API_PORT", 8000)?,
            frontend_path: get("FRONTEND_PATH"),
        };

        let ncbi = NcbiSettings {
            base_url: or("NCBI_BASE_URL", "https://eutils.ncbi.nlm.nih.gov/entrez/eutils")
                .trim_end_matches('/')
                .to_string(),
            email: get("NCBI_EMAIL"),
            api_key: get("NCBI_API_KEY").map(Secret::new),
            tool: or("NCBI_TOOL", "biograph"),
            timeout_secs: parse_or(&get, "NCBI_TIMEOUT_SECS", 30)?,
            max_retries: parse_or(&get, "NCBI_MAX_RETRIES", 3)?,
        };

        let defaults = QuerySettings::default();
        let query = QuerySettings {
            default_top_k: parse_or(&get, "QUERY_DEFAULT_TOP_K", defaults.default_top_k)?,
            max_top_k: parse_or(&get, "QUERY_MAX_TOP_K", defaults.max_top_k)?,
            context_char_budget: parse_or(&get, "QUERY_CONTEXT_CHAR_BUDGET", defaults.context_char_budget)?,
            timeout_secs: parse_or(&get, "QUERY_TIMEOUT_SECS", defaults.timeout_secs)?,
            read_retries: parse_or(&get, "QUERY_READ_RETRIES", defaults.read_retries)?,
            retry_backoff_ms: parse_or(&get, "QUERY_RETRY_BACKOFF_MS", defaults.retry_backoff_ms)?,
        };

        let config = Self {
            openai,
            neo4j,
            qdrant,
            server,
            query,
            ncbi,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.qdrant.embedding_dimension == 0 {
            return Err(ConfigError::Invalid {
                key: "EMBEDDING_DIMENSION",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.query.max_top_k == 0 {
            return Err(ConfigError::Invalid {
                key: "QUERY_MAX_TOP_K",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.query.default_top_k == 0 || self.query.default_top_k > self.query.max_top_k {
            return Err(ConfigError::Invalid {
                key: "QUERY_DEFAULT_TOP_K",
                reason: format!("must be between 1 and {}", self.query.max_top_k),
            });
        }
        if self.query.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "QUERY_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.neo4j.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "NEO4J_CONNECT_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.ncbi.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "NCBI_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.openai.temperature) {
            return Err(ConfigError::Invalid {
                key: "OPENAI_TEMPERATURE",
                reason: "must be between 0.0 and 2.0".to_string(),
            });
        }
        Ok(())
    }

    /// Callers that talk to the LLM provider need a key; admin commands
    /// against the databases alone do not.
    pub fn require_openai_key(&self) -> ConfigResult<&Secret> {
        if self.openai.api_key.is_empty() {
            Err(ConfigError::Missing("OPENAI_API_KEY"))
        } else {
            Ok(&self.openai.api_key)
        }
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: format!("{} ({})", e, raw),
        }),
        None => Ok(default),
    }
}
