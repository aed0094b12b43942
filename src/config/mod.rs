use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_PORT: u16 = 4500;
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

// ─── AgentConfig ──────────────────────────────────────────────────────────────

/// Language-model provider configuration (`[agent]` in config.toml).
///
/// Two auth modes: API key (Google AI Studio, default) or bearer token
/// (Vertex AI). `use_vertex` selects the mode; `credential` carries the key
/// or token. Without a credential the chat endpoint still answers — with a
/// configuration hint instead of a model call.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Model id, e.g. "gemini-2.0-flash".
    pub model: Option<String>,
    /// Authenticate against Vertex AI with a bearer token instead of the
    /// AI Studio API-key endpoint.
    pub use_vertex: bool,
    /// API key (AI Studio) or access token (Vertex).
    pub credential: Option<String>,
}

// ─── ServerConfig ─────────────────────────────────────────────────────────────

/// TOML override layer — every field optional so a partial config.toml works.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigToml {
    port: Option<u16>,
    bind_address: Option<String>,
    log: Option<String>,
    agent: Option<AgentConfig>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_address: String,
    /// Directory holding tasks.db (and config.toml unless overridden).
    pub data_dir: PathBuf,
    pub log: String,
    pub agent_model: String,
    pub agent_use_vertex: bool,
    pub agent_credential: Option<String>,
}

impl ServerConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        bind_address: Option<String>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        config_file: Option<PathBuf>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        let toml_path = config_file.unwrap_or_else(|| data_dir.join("config.toml"));
        let toml = load_toml(&toml_path).unwrap_or_default();
        let agent = toml.agent.unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let bind_address = bind_address
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let agent_model = std::env::var("TODOD_AGENT_MODEL")
            .ok()
            .filter(|s| !s.is_empty())
            .or(agent.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let agent_use_vertex = std::env::var("TODOD_USE_VERTEX")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(agent.use_vertex);

        let agent_credential = std::env::var("TODOD_AGENT_CREDENTIAL")
            .ok()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|t| !t.is_empty())
            .or(agent.credential);

        Self {
            port,
            bind_address,
            data_dir,
            log,
            agent_model,
            agent_use_vertex,
            agent_credential,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("tasks.db")
    }
}

fn load_toml(path: &Path) -> Option<ConfigToml> {
    if !path.exists() {
        return None;
    }
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!("ignoring malformed config file {}: {e}", path.display());
            None
        }
    }
}
