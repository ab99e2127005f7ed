use std::time::Duration;

use async_trait::async_trait;
use finguard_models::{AgentProfile, CredentialSet, CredentialToolConfig};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::broker::{BrokerSource, CredentialBroker};
use crate::error::CredentialError;

/// Broker that shells out to the credential-issuance CLI.
///
/// Runs `<program> checkout <profile> -t <tenant>` and parses stdout as a
/// JSON credential document.
#[derive(Debug)]
pub struct CliCredentialBroker {
    program: String,
    profile: String,
    tenant: String,
    identity: String,
    timeout: Duration,
    held: Option<CredentialSet>,
}

impl CliCredentialBroker {
    pub fn new(
        program: impl Into<String>,
        profile: impl Into<String>,
        tenant: impl Into<String>,
        identity: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            profile: profile.into(),
            tenant: tenant.into(),
            identity: identity.into(),
            timeout,
            held: None,
        }
    }

    pub fn for_profile(config: &CredentialToolConfig, profile: &AgentProfile) -> Self {
        Self::new(
            config.program.clone(),
            profile.credential_profile.clone(),
            profile.tenant.clone(),
            profile.display_identity.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    fn args(&self) -> [&str; 4] {
        ["checkout", &self.profile, "-t", &self.tenant]
    }

    async fn run_tool(&self) -> Result<CredentialSet, CredentialError> {
        debug!(program = %self.program, profile = %self.profile, tenant = %self.tenant, "Invoking credential tool");

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program)
                .args(self.args())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| CredentialError::Timeout(self.timeout))?
        .map_err(|source| CredentialError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(CredentialError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let credentials: CredentialSet =
            serde_json::from_slice(&output.stdout).map_err(CredentialError::Parse)?;

        let missing = credentials.missing_fields();
        if !missing.is_empty() {
            return Err(CredentialError::Incomplete(missing.join(", ")));
        }

        Ok(credentials)
    }
}

#[async_trait]
impl CredentialBroker for CliCredentialBroker {
    async fn checkout(&mut self) -> Result<CredentialSet, CredentialError> {
        if self.held.is_some() {
            return Err(CredentialError::AlreadyCheckedOut);
        }

        info!(identity = %self.identity, profile = %self.profile, "Requesting JIT credentials");

        match self.run_tool().await {
            Ok(credentials) => {
                info!(
                    identity = %self.identity,
                    session = %credentials.session_preview(),
                    "Credentials provisioned"
                );
                self.held = Some(credentials.clone());
                Ok(credentials)
            }
            Err(e) => {
                error!(identity = %self.identity, error = %e, "Credential provisioning failed");
                Err(e)
            }
        }
    }

    fn checkin(&mut self) {
        if self.held.take().is_some() {
            info!(identity = %self.identity, "Credentials returned, no standing privileges retained");
        }
    }

    fn is_checked_out(&self) -> bool {
        self.held.is_some()
    }
}

/// Produces a `CliCredentialBroker` per request.
#[derive(Debug, Clone, Default)]
pub struct CliBrokerSource {
    config: CredentialToolConfig,
}

impl CliBrokerSource {
    pub fn new(config: CredentialToolConfig) -> Self {
        Self { config }
    }
}

impl BrokerSource for CliBrokerSource {
    fn broker_for(&self, profile: &AgentProfile) -> Box<dyn CredentialBroker> {
        Box::new(CliCredentialBroker::for_profile(&self.config, profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finguard_models::AgentType;

    fn profile() -> AgentProfile {
        AgentProfile {
            agent_type: AgentType::Compliance,
            credential_profile: "AWS SE Demo/Britive Agentic AI Solution/Admin".to_string(),
            tenant: "demo".to_string(),
            system_prompt: "prompt".to_string(),
            display_identity: "Compliance Monitoring AI".to_string(),
        }
    }

    #[test]
    fn args_follow_tool_convention() {
        let broker = CliCredentialBroker::for_profile(&CredentialToolConfig::default(), &profile());
        assert_eq!(
            broker.args(),
            [
                "checkout",
                "AWS SE Demo/Britive Agentic AI Solution/Admin",
                "-t",
                "demo"
            ]
        );
        assert_eq!(broker.timeout, Duration::from_secs(30));
        assert_eq!(broker.program, "pybritive");
    }

    #[test]
    fn checkin_without_checkout_is_noop() {
        let mut broker = CliCredentialBroker::for_profile(&CredentialToolConfig::default(), &profile());
        broker.checkin();
        broker.checkin();
        assert!(!broker.is_checked_out());
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let config = CredentialToolConfig {
            program: "finguard-no-such-credential-tool".to_string(),
            timeout_seconds: 5,
        };
        let mut broker = CliCredentialBroker::for_profile(&config, &profile());
        let result = broker.checkout().await;
        assert!(matches!(result, Err(CredentialError::Spawn { .. })));
        assert!(!broker.is_checked_out());
    }
}
