use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent_profile::AgentType;
use crate::report::StructuredReport;

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzeRequest {
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
    #[serde(default)]
    pub query: String,
}

fn default_agent_type() -> String {
    AgentType::DEFAULT.as_str().to_string()
}

/// Successful outcome of one query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    pub success: bool,
    pub response: String,
    pub structured_data: Option<StructuredReport>,
    /// The key the client sent, even when it fell back to another profile.
    pub agent_type: String,
    pub timestamp: DateTime<Utc>,
}

impl QueryResult {
    /// Build a result stamped with the current time.
    pub fn completed(
        agent_type: impl Into<String>,
        response: String,
        structured_data: Option<StructuredReport>,
    ) -> Self {
        Self {
            success: true,
            response,
            structured_data,
            agent_type: agent_type.into(),
            timestamp: Utc::now(),
        }
    }
}
