//! Wires configuration, token storage, the HTTP gateway, and the stores
//! into one connected application instance.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::gateway::ApiGateway;
use crate::pipeline::{PipelineState, PipelineStore};
use crate::session::SessionManager;
use crate::token::{FileTokenStore, TokenStore};

/// Shared gateway plus the two stores built on it. Constructing a `Client`
/// performs no network I/O; the first request does.
pub struct Client {
    pub gateway: Arc<ApiGateway>,
    pub session: Arc<SessionManager>,
    pub pipeline: PipelineStore,
}

impl Client {
    /// Connect using the resolved configuration and the on-disk token.
    pub fn new(config: &Config) -> Result<Self> {
        let tokens: Arc<dyn TokenStore> =
            Arc::new(FileTokenStore::new(config.credentials_path()));
        Self::with_token_store(config, tokens)
    }

    /// Connect with a caller-provided token store. Embedders and tests use
    /// this to keep tokens out of the filesystem.
    pub fn with_token_store(config: &Config, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let gateway = Arc::new(
            ApiGateway::from_url(&config.api_url(), config.timeout(), Arc::clone(&tokens))
                .context("Failed to construct API client")?,
        );
        let session = SessionManager::new(Arc::clone(&gateway), tokens);
        let pipeline = PipelineStore::new(Arc::clone(&gateway));
        Ok(Self {
            gateway,
            session,
            pipeline,
        })
    }

    /// Connect and resume the pipeline from a snapshot captured by a
    /// previous process.
    pub fn with_pipeline_state(config: &Config, state: PipelineState) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.pipeline = PipelineStore::with_state(Arc::clone(&client.gateway), state);
        Ok(client)
    }
}

/// Read a pipeline snapshot from disk. A missing file yields the default
/// state; a corrupt one is discarded with a warning rather than wedging
/// the CLI.
pub fn load_pipeline_state(path: &Path) -> PipelineState {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return PipelineState::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read pipeline snapshot");
            return PipelineState::default();
        }
    };
    match serde_json::from_str::<PipelineState>(&content) {
        Ok(state) => state.settle(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "discarding corrupt pipeline snapshot");
            PipelineState::default()
        }
    }
}

/// Persist the pipeline state for the next invocation.
pub fn save_pipeline_state(path: &Path, state: &PipelineState) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let content =
        serde_json::to_string_pretty(state).context("Failed to serialize pipeline state")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write pipeline snapshot: {}", path.display()))?;
    Ok(())
}
