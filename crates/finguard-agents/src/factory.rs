use std::sync::Arc;
use std::time::Duration;

use finguard_broker::{BrokerSource, CredentialLease};
use finguard_models::{
    AgentProfile, AgentType, AgentsConfig, ConversationConfig, CredentialSet, ModelConfig,
    ProfileTable,
};
use tracing::{debug, info, warn};

use crate::agent::{ClaudeAgent, ClaudeModel, ConversationAgent};
use crate::claude_cli::ClaudeCliConfig;
use crate::conversation::SummarizingConversationManager;
use crate::error::AgentError;
use crate::prompts::{default_display_identity, default_system_prompt};
use crate::session::CloudSession;
use crate::tools::Toolset;

/// Build the profile table from configuration, filling gaps with the
/// built-in personas.
pub fn profile_table(config: &AgentsConfig) -> ProfileTable {
    let profile = |agent_type: AgentType| {
        let overrides = config.override_for(agent_type);
        let pick = |value: Option<&String>, default: &str| {
            value.cloned().unwrap_or_else(|| default.to_string())
        };
        AgentProfile {
            agent_type,
            credential_profile: pick(
                overrides.and_then(|o| o.credential_profile.as_ref()),
                &config.credential_profile,
            ),
            tenant: pick(overrides.and_then(|o| o.tenant.as_ref()), &config.tenant),
            system_prompt: pick(
                overrides.and_then(|o| o.system_prompt.as_ref()),
                default_system_prompt(agent_type),
            ),
            display_identity: pick(
                overrides.and_then(|o| o.display_identity.as_ref()),
                default_display_identity(agent_type),
            ),
        }
    };

    ProfileTable::new(
        profile(AgentType::FraudDetection),
        profile(AgentType::Compliance),
        profile(AgentType::RiskAnalysis),
    )
}

/// Turns a profile and checked-out credentials into a ready agent.
/// Mockable for testing.
pub trait AgentBackend: Send + Sync {
    fn build(
        &self,
        profile: &AgentProfile,
        credentials: &CredentialSet,
    ) -> Result<Box<dyn ConversationAgent>, AgentError>;
}

/// Builds [`ClaudeAgent`]s talking to Bedrock through the Claude CLI.
#[derive(Debug, Clone)]
pub struct ClaudeBackend {
    region: String,
    model_id: String,
    cli: ClaudeCliConfig,
    toolset: Toolset,
    max_tool_calls: usize,
    conversation: ConversationConfig,
}

impl ClaudeBackend {
    pub fn from_config(model: &ModelConfig, agents: &AgentsConfig) -> Self {
        Self {
            region: model.region.clone(),
            model_id: model.model_id.clone(),
            cli: ClaudeCliConfig {
                program: model.cli_program.clone(),
                timeout: Duration::from_secs(model.invoke_timeout_seconds),
            },
            toolset: Toolset::standard(),
            max_tool_calls: agents.max_tool_calls,
            conversation: agents.conversation.clone(),
        }
    }
}

impl AgentBackend for ClaudeBackend {
    fn build(
        &self,
        profile: &AgentProfile,
        credentials: &CredentialSet,
    ) -> Result<Box<dyn ConversationAgent>, AgentError> {
        let session = CloudSession::new(credentials, &self.region, &self.model_id)?;
        debug!(
            agent = %profile.agent_type,
            region = %session.region(),
            model = %session.model_id(),
            "Cloud session ready"
        );

        Ok(Box::new(ClaudeAgent::new(
            profile.clone(),
            ClaudeModel::new(session, self.cli.clone()),
            self.toolset.clone(),
            self.max_tool_calls,
            SummarizingConversationManager::from_config(&self.conversation),
        )))
    }
}

/// Creates one agent per request, bound to freshly checked-out credentials.
#[derive(Clone)]
pub struct AgentFactory {
    profiles: Arc<ProfileTable>,
    brokers: Arc<dyn BrokerSource>,
    backend: Arc<dyn AgentBackend>,
}

impl AgentFactory {
    pub fn new(
        profiles: Arc<ProfileTable>,
        brokers: Arc<dyn BrokerSource>,
        backend: Arc<dyn AgentBackend>,
    ) -> Self {
        Self {
            profiles,
            brokers,
            backend,
        }
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    /// Check out credentials for the profile behind `agent_type_key` and
    /// build an agent on them. The lease checks the credentials back in when
    /// released or dropped, including when building the agent fails.
    pub async fn create(
        &self,
        agent_type_key: &str,
    ) -> Result<(Box<dyn ConversationAgent>, CredentialLease), AgentError> {
        let profile = self.profiles.resolve(agent_type_key);
        if AgentType::parse(agent_type_key).is_none() {
            warn!(
                requested = %agent_type_key,
                fallback = %profile.agent_type,
                "Unknown agent type, using fallback profile"
            );
        }

        let broker = self.brokers.broker_for(profile);
        let lease = CredentialLease::acquire(broker).await?;
        let agent = self.backend.build(profile, lease.credentials())?;

        info!(
            agent = %profile.agent_type,
            identity = %profile.display_identity,
            "Agent created"
        );
        Ok((agent, lease))
    }
}

impl std::fmt::Debug for AgentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentFactory")
            .field("profiles", &self.profiles)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_credentials, CountingBrokerSource, StubBackend};
    use finguard_models::ProfileOverride;

    fn factory(source: &Arc<CountingBrokerSource>, backend: StubBackend) -> AgentFactory {
        AgentFactory::new(
            Arc::new(profile_table(&AgentsConfig::default())),
            source.clone(),
            Arc::new(backend),
        )
    }

    #[test]
    fn default_table_uses_builtin_personas() {
        let table = profile_table(&AgentsConfig::default());
        for agent_type in AgentType::ALL {
            let profile = table.get(agent_type);
            assert_eq!(profile.agent_type, agent_type);
            assert_eq!(profile.system_prompt, default_system_prompt(agent_type));
            assert_eq!(profile.tenant, "demo");
        }
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let config = AgentsConfig {
            profiles: vec![ProfileOverride {
                agent_type: AgentType::Compliance,
                credential_profile: Some("Compliance/ReadOnly".to_string()),
                tenant: None,
                system_prompt: None,
                display_identity: Some("SOX Bot".to_string()),
            }],
            ..AgentsConfig::default()
        };
        let table = profile_table(&config);
        let compliance = table.get(AgentType::Compliance);
        assert_eq!(compliance.credential_profile, "Compliance/ReadOnly");
        assert_eq!(compliance.display_identity, "SOX Bot");
        assert_eq!(compliance.tenant, "demo");
        assert_eq!(
            table.get(AgentType::FraudDetection).credential_profile,
            config.credential_profile
        );
    }

    #[tokio::test]
    async fn each_key_gets_its_profile_prompt() {
        let source = Arc::new(CountingBrokerSource::new());
        let factory = factory(&source, StubBackend::answering(&["ok"]));

        for agent_type in AgentType::ALL {
            let (agent, lease) = factory.create(agent_type.as_str()).await.unwrap();
            assert_eq!(agent.profile().agent_type, agent_type);
            assert_eq!(agent.system_prompt(), default_system_prompt(agent_type));
            lease.release();
        }
        assert_eq!(source.stats().checkouts(), 3);
        assert_eq!(source.stats().checkins(), 3);
    }

    #[tokio::test]
    async fn build_failure_checks_credentials_in() {
        let source = Arc::new(CountingBrokerSource::new());
        let factory = factory(&source, StubBackend::failing_build());

        let result = factory.create("compliance").await;
        assert!(matches!(result, Err(AgentError::Session(_))));
        assert_eq!(source.stats().checkouts(), 1);
        assert_eq!(source.stats().checkins(), 1);
    }

    #[tokio::test]
    async fn checkout_failure_builds_nothing() {
        let source = Arc::new(CountingBrokerSource::failing());
        let backend = StubBackend::answering(&["unused"]);
        let builds = backend.builds();
        let factory = factory(&source, backend);

        let result = factory.create("fraud_detection").await;
        assert!(matches!(result, Err(AgentError::Credential(_))));
        assert_eq!(builds.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(source.stats().checkins(), 0);
    }

    #[test]
    fn claude_backend_rejects_empty_region() {
        let model = ModelConfig {
            region: String::new(),
            ..ModelConfig::default()
        };
        let backend = ClaudeBackend::from_config(&model, &AgentsConfig::default());
        let table = profile_table(&AgentsConfig::default());
        let result = backend.build(table.get(AgentType::RiskAnalysis), &sample_credentials());
        assert!(matches!(result, Err(AgentError::Session(_))));
    }

    #[test]
    fn claude_backend_builds_agent_with_profile() {
        let backend =
            ClaudeBackend::from_config(&ModelConfig::default(), &AgentsConfig::default());
        let table = profile_table(&AgentsConfig::default());
        let agent = backend
            .build(table.get(AgentType::RiskAnalysis), &sample_credentials())
            .unwrap();
        assert_eq!(agent.system_prompt(), default_system_prompt(AgentType::RiskAnalysis));
        assert!(agent.conversation().is_empty());
    }
}
