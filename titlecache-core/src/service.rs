//! Action dispatch and result envelopes
//!
//! [`TitleCache`] is the single entry point used by the command line, the
//! batch runner and the HTTP server. It turns an [`ActionRequest`] into an
//! [`Envelope`] and never fails outright: every error becomes an envelope
//! with `status: "error"`.

use crate::cache::{open_cache, KvStore, TimedKvStore};
use crate::config::TitleCacheConfig;
use crate::error::{Result, TitleCacheError};
use crate::store::{connect_store, HealthCheckResult, TimedTripleStore, TripleStoreClient};
use crate::title::{PopulateSummary, Populator, ResolvedTitles, Resolver};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// What a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Populate the cache of a graph
    Create,
    /// Look up titles
    Get,
}

impl FromStr for Action {
    type Err = TitleCacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Action::Create),
            "get" => Ok(Action::Get),
            other => Err(TitleCacheError::UnknownAction(other.to_string())),
        }
    }
}

/// One unit of work, as received from the CLI, a batch file or HTTP
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionRequest {
    pub action: Option<String>,
    pub graph: Option<String>,
    pub uris: Vec<String>,
    pub lang: Option<String>,
    /// Partial configuration merged into the defaults for this request
    pub config: Value,
}

impl ActionRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Default::default()
        }
    }

    pub fn with_graph(mut self, graph: impl Into<String>) -> Self {
        self.graph = Some(graph.into());
        self
    }

    pub fn with_uris<I, S>(mut self, uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uris.extend(uris.into_iter().map(Into::into));
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Split a comma- or newline-separated URI list, dropping blanks
    pub fn parse_uris(raw: &str) -> Vec<String> {
        raw.split([',', '\n'])
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Envelope status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{status, data, message}` wrapper around every outward result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: Status,
    pub data: Value,
    pub message: Option<String>,
}

impl Envelope {
    pub fn success(data: Value, message: Option<String>) -> Self {
        Self {
            status: Status::Success,
            data,
            message,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: Value::Null,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

impl From<TitleCacheError> for Envelope {
    fn from(e: TitleCacheError) -> Self {
        Envelope::error(e.to_string())
    }
}

/// Title cache front door
///
/// Backends are opened lazily from the merged configuration of each request
/// and shared by every later request that resolves to the same backend, so
/// an in-process cache survives across requests.
pub struct TitleCache {
    defaults: TitleCacheConfig,
    caches: Mutex<HashMap<String, Arc<dyn KvStore>>>,
    stores: Mutex<HashMap<String, Arc<dyn TripleStoreClient>>>,
}

impl TitleCache {
    pub fn new(defaults: TitleCacheConfig) -> Self {
        Self {
            defaults,
            caches: Mutex::new(HashMap::new()),
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Use `store` whenever a request resolves to the default store config
    pub fn with_store(mut self, store: Arc<dyn TripleStoreClient>) -> Self {
        let timed: Arc<dyn TripleStoreClient> = Arc::new(TimedTripleStore::new(
            store,
            self.defaults.store.query_timeout(),
        ));
        self.stores
            .get_mut()
            .insert(self.defaults.store.fingerprint(), timed);
        self
    }

    /// Use `cache` whenever a request resolves to the default cache config
    pub fn with_cache(mut self, cache: Arc<dyn KvStore>) -> Self {
        let timed: Arc<dyn KvStore> =
            Arc::new(TimedKvStore::new(cache, self.defaults.cache.io_timeout()));
        self.caches
            .get_mut()
            .insert(self.defaults.cache.fingerprint(), timed);
        self
    }

    pub fn defaults(&self) -> &TitleCacheConfig {
        &self.defaults
    }

    /// Execute `request`, rendering any failure as an error envelope
    pub async fn run(&self, request: ActionRequest) -> Envelope {
        match self.execute(request).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("Request failed: {}", e);
                e.into()
            }
        }
    }

    async fn execute(&self, request: ActionRequest) -> Result<Envelope> {
        let action = request
            .action
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or(TitleCacheError::NoActionGiven)?
            .to_string();

        let mut config = self.defaults.merged(&request.config)?;
        if let Some(graph) = request.graph.as_deref().filter(|g| !g.is_empty()) {
            config.graph = graph.to_string();
        }

        // cache backend errors take precedence over action errors
        let cache = self.cache_for(&config).await?;

        match action.parse::<Action>()? {
            Action::Create => {
                let store = self.store_for(&config).await?;
                let summary = Populator::new(store, cache)
                    .populate(&config.graph, &config.predicates, &config.default_lang)
                    .await?;
                Ok(create_envelope(&summary)?)
            }
            Action::Get => {
                let lang = request
                    .lang
                    .as_deref()
                    .filter(|l| !l.is_empty())
                    .unwrap_or(config.default_lang.as_str());
                let titles = Resolver::new(cache)
                    .resolve(&config.graph, &request.uris, lang, &config.default_lang)
                    .await?;
                Ok(Envelope::success(serde_json::to_value(titles)?, None))
            }
        }
    }

    /// Populate `config.graph` with the configured backends
    pub async fn populate(&self, config: &TitleCacheConfig) -> Result<PopulateSummary> {
        let cache = self.cache_for(config).await?;
        let store = self.store_for(config).await?;
        Populator::new(store, cache)
            .populate(&config.graph, &config.predicates, &config.default_lang)
            .await
    }

    /// Resolve `uris` in `config.graph`, defaulting `lang` to the default language
    pub async fn resolve(
        &self,
        config: &TitleCacheConfig,
        uris: &[String],
        lang: Option<&str>,
    ) -> Result<ResolvedTitles> {
        let cache = self.cache_for(config).await?;
        Resolver::new(cache)
            .resolve(
                &config.graph,
                uris,
                lang.unwrap_or(config.default_lang.as_str()),
                &config.default_lang,
            )
            .await
    }

    /// Health of the default triple store
    pub async fn store_health(&self) -> HealthCheckResult {
        let threshold = self.defaults.store.degraded_threshold_ms;
        match self.store_for(&self.defaults).await {
            Ok(store) => store.health_check(threshold).await,
            Err(e) => HealthCheckResult::unhealthy(
                &self.defaults.store.backend,
                std::time::Duration::ZERO,
                &e.to_string(),
            ),
        }
    }

    async fn cache_for(&self, config: &TitleCacheConfig) -> Result<Arc<dyn KvStore>> {
        let key = config.cache.fingerprint();
        let mut caches = self.caches.lock().await;
        if let Some(cache) = caches.get(&key) {
            return Ok(cache.clone());
        }

        let cache = open_cache(&config.cache)?;
        caches.insert(key, cache.clone());
        Ok(cache)
    }

    async fn store_for(&self, config: &TitleCacheConfig) -> Result<Arc<dyn TripleStoreClient>> {
        let key = config.store.fingerprint();
        let mut stores = self.stores.lock().await;
        if let Some(store) = stores.get(&key) {
            return Ok(store.clone());
        }

        let store = connect_store(&config.store)?;
        info!("Registered {} store for {}", store.name(), key);
        stores.insert(key, store.clone());
        Ok(store)
    }
}

fn create_envelope(summary: &PopulateSummary) -> Result<Envelope> {
    Ok(Envelope::success(
        serde_json::to_value(summary)?,
        Some(format!(
            "Successfully {} the cache. You can send requests now by asking like: ?action=get&uris=uri1,uri2,...",
            summary.change
        )),
    ))
}
