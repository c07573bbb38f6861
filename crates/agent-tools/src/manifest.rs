//! Tool manifest: a JSON file declaring HTTP-backed tools.
//!
//! ```json
//! {
//!   "tools": [
//!     {
//!       "name": "synonyms",
//!       "description": "Find synonyms for a word.",
//!       "parameters": [{"name": "word", "type": "string", "description": "The word"}],
//!       "endpoint": "http://localhost:9000/synonyms",
//!       "timeout_seconds": 10
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use agent_core::{RegistryError, ToolDefinition, ToolParameter, ToolRegistry};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::http_tool::{HttpTool, DEFAULT_TIMEOUT_SECS};

#[derive(Debug, Error)]
pub enum ToolsConfigError {
    #[error("failed to read tool manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tool manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tool '{tool}' has an invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        tool: String,
        endpoint: String,
        reason: String,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolManifest {
    #[serde(default)]
    pub tools: Vec<ToolEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ToolEntry {
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }

    pub fn build_tool(&self) -> Result<HttpTool, ToolsConfigError> {
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|error| self.invalid_endpoint(error.to_string()))?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(self.invalid_endpoint(format!(
                "unsupported scheme '{}'",
                endpoint.scheme()
            )));
        }

        Ok(HttpTool::new(endpoint)
            .with_timeout(Duration::from_secs(self.timeout_seconds))
            .with_headers(self.headers.clone()))
    }

    fn invalid_endpoint(&self, reason: String) -> ToolsConfigError {
        ToolsConfigError::InvalidEndpoint {
            tool: self.name.clone(),
            endpoint: self.endpoint.clone(),
            reason,
        }
    }
}

impl ToolManifest {
    pub fn from_json(raw: &str) -> Result<Self, ToolsConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ToolsConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ToolsConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Registers every entry, stopping at the first invalid one. Returns the
    /// number of tools registered.
    pub fn register_all(&self, registry: &ToolRegistry) -> Result<usize, ToolsConfigError> {
        for entry in &self.tools {
            let tool = entry.build_tool()?;
            registry.register_shared(entry.definition(), Arc::new(tool))?;
            log::info!("Registered tool '{}' -> {}", entry.name, entry.endpoint);
        }
        Ok(self.tools.len())
    }
}

/// Loads the manifest at `path` and registers its tools.
pub fn load_tools_into(
    path: impl AsRef<Path>,
    registry: &ToolRegistry,
) -> Result<usize, ToolsConfigError> {
    let path = path.as_ref();
    let count = ToolManifest::load(path)?.register_all(registry)?;
    log::info!("Loaded {} tool(s) from {}", count, path.display());
    Ok(count)
}
