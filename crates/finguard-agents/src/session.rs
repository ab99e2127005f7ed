use chrono::Utc;
use finguard_models::CredentialSet;
use tokio::process::Command;

use crate::error::AgentError;

/// A cloud session bound to one checked-out credential set.
///
/// The model CLI picks the session up from its environment, so the session
/// never touches the parent process environment.
#[derive(Debug, Clone)]
pub struct CloudSession {
    region: String,
    model_id: String,
    credentials: CredentialSet,
}

impl CloudSession {
    pub fn new(
        credentials: &CredentialSet,
        region: &str,
        model_id: &str,
    ) -> Result<Self, AgentError> {
        if region.trim().is_empty() {
            return Err(AgentError::Session("region is empty".to_string()));
        }
        if model_id.trim().is_empty() {
            return Err(AgentError::Session("model id is empty".to_string()));
        }
        let missing = credentials.missing_fields();
        if !missing.is_empty() {
            return Err(AgentError::Session(format!(
                "credentials missing {}",
                missing.join(", ")
            )));
        }
        if credentials.is_expired_at(Utc::now()) {
            return Err(AgentError::Session("credentials already expired".to_string()));
        }

        Ok(Self {
            region: region.to_string(),
            model_id: model_id.to_string(),
            credentials: credentials.clone(),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Environment the model CLI needs to call Bedrock with these credentials.
    pub fn env_vars(&self) -> [(&'static str, &str); 5] {
        [
            ("CLAUDE_CODE_USE_BEDROCK", "1"),
            ("AWS_REGION", &self.region),
            ("AWS_ACCESS_KEY_ID", &self.credentials.access_key_id),
            ("AWS_SECRET_ACCESS_KEY", &self.credentials.secret_access_key),
            ("AWS_SESSION_TOKEN", &self.credentials.session_token),
        ]
    }

    pub fn apply(&self, cmd: &mut Command) {
        // A named profile would take precedence over the JIT keys.
        cmd.env_remove("AWS_PROFILE");
        cmd.envs(self.env_vars());
    }
}
