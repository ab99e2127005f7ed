use serde::{Deserialize, Serialize};

use crate::agent_profile::AgentType;

/// Top-level configuration for Finguard. Every section is optional in TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FinguardConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub credentials: CredentialToolConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static`.
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            static_dir: "static".to_string(),
        }
    }
}

/// How to reach the external credential-issuance tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CredentialToolConfig {
    /// Executable invoked as `<program> checkout <profile> -t <tenant>`.
    pub program: String,
    /// Wall-clock bound on one checkout.
    pub timeout_seconds: u64,
}

impl Default for CredentialToolConfig {
    fn default() -> Self {
        Self {
            program: "pybritive".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Hosted model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Model CLI executable, run with Bedrock credentials in its environment.
    pub cli_program: String,
    pub model_id: String,
    pub region: String,
    /// Timeout for one-shot calls (tool planning, structured extraction,
    /// summarization). Streaming responses are not bounded.
    pub invoke_timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            cli_program: "claude".to_string(),
            model_id: "us.anthropic.claude-3-7-sonnet-20250219-v1:0".to_string(),
            region: "us-west-2".to_string(),
            invoke_timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentsConfig {
    /// Credential profile used by every persona unless overridden.
    pub credential_profile: String,
    pub tenant: String,
    /// Upper bound on tool calls executed per query.
    pub max_tool_calls: usize,
    pub profiles: Vec<ProfileOverride>,
    pub conversation: ConversationConfig,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            credential_profile: "AWS SE Demo/Britive Agentic AI Solution/Admin".to_string(),
            tenant: "demo".to_string(),
            max_tool_calls: 4,
            profiles: Vec::new(),
            conversation: ConversationConfig::default(),
        }
    }
}

/// Conversation summarization policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConversationConfig {
    /// Fraction of the older history folded into a summary.
    pub summary_ratio: f64,
    /// Most recent messages that are never summarized.
    pub preserve_recent_messages: usize,
    /// History length above which summarization kicks in.
    pub max_messages: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            summary_ratio: 0.5,
            preserve_recent_messages: 5,
            max_messages: 20,
        }
    }
}

/// Per-persona overrides. Unset fields keep the built-in values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileOverride {
    pub agent_type: AgentType,
    pub credential_profile: Option<String>,
    pub tenant: Option<String>,
    pub system_prompt: Option<String>,
    pub display_identity: Option<String>,
}

impl AgentsConfig {
    pub fn override_for(&self, agent_type: AgentType) -> Option<&ProfileOverride> {
        self.profiles.iter().find(|p| p.agent_type == agent_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config: FinguardConfig = toml::from_str("").unwrap();
        assert_eq!(config, FinguardConfig::default());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.credentials.program, "pybritive");
        assert_eq!(config.credentials.timeout_seconds, 30);
        assert_eq!(config.model.region, "us-west-2");
        assert_eq!(config.agents.conversation.preserve_recent_messages, 5);
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[server]
port = 8080

[credentials]
program = "/usr/local/bin/pybritive"
timeout_seconds = 10

[model]
region = "us-east-1"

[agents]
tenant = "acme"

[agents.conversation]
max_messages = 12

[[agents.profiles]]
agent_type = "compliance"
system_prompt = "You audit PCI-DSS controls."
"#;

        let config: FinguardConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.credentials.timeout_seconds, 10);
        assert_eq!(config.model.region, "us-east-1");
        assert_eq!(
            config.model.model_id,
            "us.anthropic.claude-3-7-sonnet-20250219-v1:0"
        );
        assert_eq!(config.agents.tenant, "acme");
        assert_eq!(config.agents.conversation.max_messages, 12);
        assert_eq!(config.agents.conversation.summary_ratio, 0.5);

        let compliance = config.agents.override_for(AgentType::Compliance).unwrap();
        assert_eq!(
            compliance.system_prompt.as_deref(),
            Some("You audit PCI-DSS controls.")
        );
        assert!(compliance.tenant.is_none());
        assert!(config.agents.override_for(AgentType::RiskAnalysis).is_none());
    }

    #[test]
    fn roundtrip_config() {
        let config = FinguardConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: FinguardConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }
}
