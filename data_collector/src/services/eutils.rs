use biograph_config::NcbiSettings;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::{CollectorError, CollectorResult};

const DEFAULT_BACKOFF: Duration = Duration::from_millis(800);

/// Rate-limited client for the NCBI E-utilities endpoints
pub struct EutilsClient {
    client: Client,
    base_url: String,
    tool: String,
    email: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

/// One source id and the ids it links to, per target database
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkSet {
    #[serde(default, deserialize_with = "id_list")]
    pub ids: Vec<String>,
    #[serde(default)]
    pub linksetdbs: Vec<LinkSetDb>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkSetDb {
    #[serde(default)]
    pub dbto: String,
    #[serde(default)]
    pub linkname: String,
    #[serde(default, deserialize_with = "id_list")]
    pub links: Vec<String>,
}

impl LinkSet {
    pub fn source_id(&self) -> Option<&str> {
        self.ids.first().map(String::as_str)
    }

    pub fn links_named<'a>(&'a self, linkname: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.linksetdbs
            .iter()
            .filter(move |db| db.linkname == linkname)
            .flat_map(|db| db.links.iter().map(String::as_str))
    }

    /// Links into `db` across every link name
    pub fn links_to<'a>(&'a self, db: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.linksetdbs
            .iter()
            .filter(move |set| set.dbto == db)
            .flat_map(|set| set.links.iter().map(String::as_str))
    }
}

/// NCBI sends ids as strings in most places and numbers in a few
fn id_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

#[derive(Deserialize)]
struct SearchResponse {
    esearchresult: SearchResult,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default, deserialize_with = "id_list")]
    idlist: Vec<String>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

#[derive(Deserialize)]
struct LinkResponse {
    #[serde(default)]
    linksets: Vec<LinkSet>,
}

#[derive(Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    result: serde_json::Map<String, Value>,
}

impl EutilsClient {
    pub fn new(settings: &NcbiSettings) -> Self {
        let per_second = NonZeroU32::new(settings.requests_per_second()).unwrap_or(NonZeroU32::MIN);

        Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            tool: settings.tool.clone(),
            email: settings.email.clone(),
            api_key: settings.api_key.as_ref().map(|k| k.expose().to_string()),
            timeout: settings.timeout(),
            max_retries: settings.max_retries,
            backoff: DEFAULT_BACKOFF,
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        }
    }

    /// Base delay before the first retry; doubles on each further attempt
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// PMIDs (or other ids) matching `term`, best match first when `sort` is `relevance`
    pub async fn esearch(
        &self,
        db: &str,
        term: &str,
        retmax: usize,
        sort: &str,
    ) -> CollectorResult<Vec<String>> {
        let params = [
            ("db", db.to_string()),
            ("term", term.to_string()),
            ("retmax", retmax.to_string()),
            ("sort", sort.to_string()),
            ("retmode", "json".to_string()),
        ];
        let response: SearchResponse = self.get_json("esearch.fcgi", &params).await?;

        if let Some(error) = response.esearchresult.error {
            return Err(CollectorError::Malformed(format!("esearch rejected query: {}", error)));
        }
        Ok(response.esearchresult.idlist)
    }

    /// Full records as XML
    pub async fn efetch_xml(&self, db: &str, ids: &[String]) -> CollectorResult<String> {
        let params = [
            ("db", db.to_string()),
            ("id", ids.join(",")),
            ("rettype", "medline".to_string()),
            ("retmode", "xml".to_string()),
        ];
        self.get_text("efetch.fcgi", &params).await
    }

    /// One link set per source id; `linkname` narrows to a single relation
    pub async fn elink(
        &self,
        dbfrom: &str,
        db: &str,
        ids: &[String],
        linkname: Option<&str>,
    ) -> CollectorResult<Vec<LinkSet>> {
        let mut params = vec![
            ("dbfrom", dbfrom.to_string()),
            ("db", db.to_string()),
            ("retmode", "json".to_string()),
        ];
        if let Some(name) = linkname {
            params.push(("linkname", name.to_string()));
        }
        // Repeated `id` keeps one link set per source id
        params.extend(ids.iter().map(|id| ("id", id.clone())));

        let response: LinkResponse = self.get_json("elink.fcgi", &params).await?;
        Ok(response.linksets)
    }

    /// Document summaries in the order NCBI lists their uids
    pub async fn esummary(&self, db: &str, ids: &[String]) -> CollectorResult<Vec<Value>> {
        let params = [
            ("db", db.to_string()),
            ("id", ids.join(",")),
            ("retmode", "json".to_string()),
        ];
        let mut response: SummaryResponse = self.get_json("esummary.fcgi", &params).await?;

        let uids = match response.result.remove("uids") {
            Some(Value::Array(uids)) => uids,
            _ => return Ok(Vec::new()),
        };
        Ok(uids
            .iter()
            .filter_map(|uid| match uid {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter_map(|uid| response.result.remove(&uid))
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> CollectorResult<T> {
        let body = self.get_text(endpoint, params).await?;
        serde_json::from_str(&body)
            .map_err(|e| CollectorError::Malformed(format!("{}: {}", endpoint, e)))
    }

    async fn get_text(&self, endpoint: &str, params: &[(&str, String)]) -> CollectorResult<String> {
        let mut attempt = 0;
        loop {
            self.limiter.until_ready().await;
            match self.send(endpoint, params).await {
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt - 1));
                    warn!(
                        "⚠️ {} failed (attempt {}/{}), retrying in {:?}: {}",
                        endpoint, attempt, self.max_retries, delay, err
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn send(&self, endpoint: &str, params: &[(&str, String)]) -> CollectorResult<String> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("Requesting {}", url);

        let mut common = vec![("tool", self.tool.as_str())];
        if let Some(email) = &self.email {
            common.push(("email", email.as_str()));
        }
        if let Some(key) = &self.api_key {
            common.push(("api_key", key.as_str()));
        }

        let response = self
            .client
            .get(&url)
            .query(&common)
            .query(params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(endpoint, e))?;
        if !status.is_success() {
            return Err(CollectorError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn transport_error(endpoint: &str, err: reqwest::Error) -> CollectorError {
    if err.is_timeout() {
        CollectorError::Timeout(format!("{}: {}", endpoint, err))
    } else {
        CollectorError::Transport(format!("{}: {}", endpoint, err))
    }
}
