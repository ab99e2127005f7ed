use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Claude CLI error: {0}")]
    Cli(String),

    #[error("Agent response parse error: {0}")]
    Parse(String),

    #[error("Agent timed out after {0} seconds")]
    Timeout(u64),

    #[error("Cloud session error: {0}")]
    Session(String),

    #[error("Credential provisioning error: {0}")]
    Credential(#[from] finguard_broker::CredentialError),
}
