use std::time::Duration;

use thiserror::Error;

/// Failure to provision JIT credentials. Never retried.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to spawn credential tool `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential checkout failed ({status}): {stderr}")]
    Exit { status: String, stderr: String },

    #[error("Credential tool timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unparsable credential tool output: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Credential tool output is missing fields: {0}")]
    Incomplete(String),

    #[error("Credentials already checked out for this broker")]
    AlreadyCheckedOut,
}
