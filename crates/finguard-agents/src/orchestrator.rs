use std::time::Instant;

use finguard_broker::CredentialError;
use finguard_models::{AgentType, QueryResult, StructuredReport};
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::agent::ConversationAgent;
use crate::error::AgentError;
use crate::factory::AgentFactory;
use crate::prompts::extraction_request;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Failed to provision credentials: {0}")]
    CredentialProvisioning(#[source] CredentialError),

    #[error("Unexpected error: {0}")]
    Unexpected(#[source] AgentError),
}

impl From<AgentError> for QueryError {
    fn from(e: AgentError) -> Self {
        match e {
            AgentError::Credential(e) => QueryError::CredentialProvisioning(e),
            other => QueryError::Unexpected(other),
        }
    }
}

/// Outcome of the structured extraction step. A missing report never fails
/// the query.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    WithData(StructuredReport),
    WithoutData,
}

impl Extraction {
    pub fn into_report(self) -> Option<StructuredReport> {
        match self {
            Extraction::WithData(report) => Some(report),
            Extraction::WithoutData => None,
        }
    }
}

/// Runs one query end to end: credentials, agent, streamed answer, optional
/// structured report, checkin.
#[derive(Debug, Clone)]
pub struct QueryOrchestrator {
    factory: AgentFactory,
}

impl QueryOrchestrator {
    pub fn new(factory: AgentFactory) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &AgentFactory {
        &self.factory
    }

    pub async fn run(&self, agent_type_key: &str, query: &str) -> Result<QueryResult, QueryError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("query", %request_id, agent_type = %agent_type_key);
        self.run_inner(agent_type_key, query).instrument(span).await
    }

    async fn run_inner(&self, agent_type_key: &str, query: &str) -> Result<QueryResult, QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::InvalidRequest("Query cannot be empty".to_string()));
        }

        let start = Instant::now();
        info!(query_len = query.len(), "Starting query");

        let (mut agent, lease) = self.factory.create(agent_type_key).await.map_err(|e| {
            error!(error = %e, "Failed to create agent");
            QueryError::from(e)
        })?;

        // From here on the lease checks the credentials in on every path.
        let response = drain(agent.as_mut(), query).await.map_err(|e| {
            error!(error = %e, "Response stream failed");
            QueryError::Unexpected(e)
        })?;

        let extraction = match AgentType::parse(agent_type_key) {
            Some(agent_type) => extract(agent.as_mut(), agent_type, query).await,
            None => Extraction::WithoutData,
        };

        drop(agent);
        lease.release();

        let structured = matches!(extraction, Extraction::WithData(_));
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            response_len = response.len(),
            structured,
            "Query complete"
        );

        Ok(QueryResult::completed(
            agent_type_key,
            response,
            extraction.into_report(),
        ))
    }
}

async fn drain(agent: &mut dyn ConversationAgent, query: &str) -> Result<String, AgentError> {
    let mut stream = agent.stream(query).await?;
    let mut response = String::new();
    let mut chunks = 0usize;
    while let Some(chunk) = stream.next().await {
        response.push_str(&chunk?);
        chunks += 1;
    }
    debug!(chunks, "Response stream drained");
    Ok(response)
}

async fn extract(agent: &mut dyn ConversationAgent, agent_type: AgentType, query: &str) -> Extraction {
    let kind = agent_type.report_kind();
    let prompt = extraction_request(agent_type, query);
    match agent.structured_output(kind, &prompt).await {
        Ok(report) => Extraction::WithData(report),
        Err(AgentError::Parse(reason)) => {
            debug!(%kind, %reason, "No structured data in extraction reply");
            Extraction::WithoutData
        }
        Err(e) => {
            warn!(%kind, error = %e, "Structured extraction failed");
            Extraction::WithoutData
        }
    }
}
