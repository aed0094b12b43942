pub mod agent;
pub mod config;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use agent::Agent;
use config::ServerConfig;
use storage::TaskStore;

/// Shared application state passed to every REST handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub store: TaskStore,
    /// Conversational facade over the store. Built once at startup; the
    /// `/agent/chat` endpoint is its only caller.
    pub agent: Arc<Agent>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: Arc<ServerConfig>, store: TaskStore, agent: Arc<Agent>) -> Self {
        Self {
            config,
            store,
            agent,
            started_at: std::time::Instant::now(),
        }
    }
}
