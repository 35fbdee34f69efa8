//! YAML action files and result output
//!
//! A batch file lists actions under a top-level `actions` key:
//!
//! ```yaml
//! actions:
//!   - action: create
//!     graph: http://example.org/
//!   - action: get
//!     uris-from: ./uris.txt
//!     lang: de
//!     config:
//!       cache:
//!         backend: file
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use titlecache_core::{ActionRequest, Envelope, TitleCache};
use tracing::{debug, info};

/// Problems with the batch file itself, reported as a single error envelope
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("Unable to open file: {0}")]
    Open(String),

    #[error("Unable to parse the YAML string: {0}")]
    Parse(String),

    #[error("No action paramater (get or create) given in file: {0}")]
    NoActions(String),

    #[error("Urifile not found: {0}")]
    UriFileNotFound(String),
}

impl From<BatchError> for Envelope {
    fn from(e: BatchError) -> Self {
        Envelope::error(e.to_string())
    }
}

/// Top-level batch document
#[derive(Debug, Deserialize)]
pub struct BatchFile {
    pub actions: Option<Vec<BatchAction>>,
}

/// URIs given inline, either comma separated or as a list
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum UriList {
    Joined(String),
    Each(Vec<String>),
}

impl UriList {
    fn into_uris(self) -> Vec<String> {
        match self {
            UriList::Joined(raw) => ActionRequest::parse_uris(&raw),
            UriList::Each(uris) => uris
                .into_iter()
                .map(|uri| uri.trim().to_string())
                .filter(|uri| !uri.is_empty())
                .collect(),
        }
    }
}

/// One entry of `actions`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BatchAction {
    pub action: Option<String>,
    pub graph: Option<String>,
    pub uris: Option<UriList>,
    #[serde(rename = "uris-from")]
    pub uris_from: Option<PathBuf>,
    pub lang: Option<String>,
    pub config: serde_json::Value,
}

impl BatchAction {
    /// Turn the entry into a request, reading `uris-from` when present
    pub fn into_request(self) -> Result<ActionRequest, BatchError> {
        let uris = match (&self.uris_from, self.uris) {
            (Some(path), _) => read_uri_file(path)?,
            (None, Some(list)) => list.into_uris(),
            (None, None) => Vec::new(),
        };

        Ok(ActionRequest {
            action: self.action,
            graph: self.graph,
            uris,
            lang: self.lang,
            config: self.config,
        })
    }
}

/// Read a newline-separated URI file
pub fn read_uri_file(path: &Path) -> Result<Vec<String>, BatchError> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| BatchError::UriFileNotFound(path.display().to_string()))?;
    Ok(ActionRequest::parse_uris(&content))
}

/// Parse a batch file into requests
///
/// The whole file is checked before anything runs, so a missing URI file
/// in a later entry aborts the batch up front.
pub fn load_actions(path: &Path) -> Result<Vec<ActionRequest>, BatchError> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| BatchError::Open(path.display().to_string()))?;

    let file: BatchFile =
        serde_yaml::from_str(&content).map_err(|e| BatchError::Parse(e.to_string()))?;

    let actions = file
        .actions
        .ok_or_else(|| BatchError::NoActions(path.display().to_string()))?;

    debug!("Loaded {} actions from {:?}", actions.len(), path);
    actions.into_iter().map(BatchAction::into_request).collect()
}

/// Run every action of `path` in file order
pub async fn run_batch(service: &TitleCache, path: &Path) -> Vec<Envelope> {
    let requests = match load_actions(path) {
        Ok(requests) => requests,
        Err(e) => return vec![e.into()],
    };

    info!("Running {} actions from {:?}", requests.len(), path);
    let mut envelopes = Vec::with_capacity(requests.len());
    for request in requests {
        envelopes.push(service.run(request).await);
    }
    envelopes
}

/// Write envelope `i` as YAML to `dir/result-{i}.txt`
pub fn write_results(dir: &Path, envelopes: &[Envelope]) -> anyhow::Result<()> {
    use anyhow::Context;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create results directory {:?}", dir))?;

    for (i, envelope) in envelopes.iter().enumerate() {
        let path = dir.join(format!("result-{}.txt", i));
        let yaml = serde_yaml::to_string(envelope)?;
        std::fs::write(&path, yaml).with_context(|| format!("Failed to write {:?}", path))?;
    }

    info!("Wrote {} results to {:?}", envelopes.len(), dir);
    Ok(())
}
