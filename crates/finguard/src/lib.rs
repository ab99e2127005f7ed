//! Finguard - JIT-credentialed financial analysis agents over HTTP.
//!
//! Each query checks out short-lived cloud credentials, builds a fraud,
//! compliance or market-risk agent on them, streams its answer, optionally
//! extracts a structured report and checks the credentials back in.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use finguard::models::FinguardConfig;
//! use finguard::agents::{QueryOrchestrator, QueryError};
//! use finguard::broker::{CredentialBroker, CredentialLease};
//! ```

pub use finguard_agents as agents;
pub use finguard_broker as broker;
pub use finguard_models as models;

pub mod api_error;
pub mod routes;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use finguard_agents::{profile_table, AgentFactory, ClaudeBackend, QueryOrchestrator};
use finguard_broker::CliBrokerSource;
use finguard_models::FinguardConfig;

pub use routes::{router, AppState};

/// Build the query orchestrator from configuration: the profile table,
/// the credential tool and the Claude backend.
pub fn build_orchestrator(config: &FinguardConfig) -> QueryOrchestrator {
    let profiles = Arc::new(profile_table(&config.agents));
    let brokers = Arc::new(CliBrokerSource::new(config.credentials.clone()));
    let backend = Arc::new(ClaudeBackend::from_config(&config.model, &config.agents));
    QueryOrchestrator::new(AgentFactory::new(profiles, brokers, backend))
}

/// Load configuration from a TOML file, or defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<FinguardConfig> {
    let Some(path) = path else {
        return Ok(FinguardConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse config: {}", path.display()))
}
