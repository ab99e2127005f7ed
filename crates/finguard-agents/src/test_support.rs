//! Test doubles for the credential and model seams.
//!
//! `CountingBrokerSource` hands out in-memory brokers that count checkouts
//! and checkins, so tests can assert the exactly-once checkin guarantee.
//! `StubBackend` builds `StubAgent`s that replay scripted fragments and an
//! optional report instead of calling the model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use finguard_broker::{BrokerSource, CredentialBroker, CredentialError};
use finguard_models::{
    AgentProfile, AgentType, ComplianceReport, CredentialSet, FraudAnalysisReport,
    MarketRiskAnalysis, ReportKind, StructuredReport, TransactionData,
};
use rust_decimal::Decimal;

use crate::agent::ConversationAgent;
use crate::conversation::Conversation;
use crate::error::AgentError;
use crate::factory::AgentBackend;
use crate::stream::TextStream;

pub fn sample_credentials() -> CredentialSet {
    CredentialSet {
        access_key_id: "ASIAEXAMPLEKEY".to_string(),
        secret_access_key: "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY".to_string(),
        session_token: "IQoJb3JpZ2luX2VjEXAMPLETOKENVALUE".to_string(),
        expiration: None,
    }
}

pub fn sample_fraud_report() -> StructuredReport {
    StructuredReport::FraudAnalysis(FraudAnalysisReport {
        analysis_timestamp: "2024-03-01T12:00:00Z".to_string(),
        total_transactions_analyzed: 3,
        high_risk_transactions: vec![TransactionData {
            transaction_id: "TXN-1042".to_string(),
            amount: Decimal::new(990000, 2),
            merchant: "Offshore Electronics".to_string(),
            category: "electronics".to_string(),
            risk_score: Decimal::new(92, 2),
        }],
        fraud_probability: Decimal::new(78, 2),
        recommended_actions: vec!["Hold card pending verification".to_string()],
        compliance_status: "REVIEW".to_string(),
        risk_level: "HIGH".to_string(),
    })
}

pub fn sample_compliance_report() -> StructuredReport {
    StructuredReport::Compliance(ComplianceReport {
        regulation_framework: "SOX".to_string(),
        compliance_score: 92,
        violations_detected: vec![],
        remediation_steps: vec!["Quarterly access review".to_string()],
        audit_trail_complete: true,
    })
}

pub fn sample_market_risk_report() -> StructuredReport {
    let mut category = serde_json::Map::new();
    category.insert("category".to_string(), "equities".into());
    category.insert("exposure".to_string(), 0.6.into());
    let mut stress = serde_json::Map::new();
    stress.insert("rates_up_200bp".to_string(), "-8.5%".into());

    StructuredReport::MarketRisk(MarketRiskAnalysis {
        portfolio_value: Decimal::new(2_500_000_000, 0),
        value_at_risk: Decimal::new(616_875_000, 0),
        risk_categories: vec![category],
        stress_test_results: stress,
        recommendations: vec!["Reduce equity concentration".to_string()],
    })
}

/// Checkout/checkin counters shared by every broker of one source.
#[derive(Debug, Default)]
pub struct BrokerStats {
    checkouts: AtomicUsize,
    checkins: AtomicUsize,
}

impl BrokerStats {
    pub fn checkouts(&self) -> usize {
        self.checkouts.load(Ordering::SeqCst)
    }

    pub fn checkins(&self) -> usize {
        self.checkins.load(Ordering::SeqCst)
    }

    /// Checkouts not yet matched by a checkin.
    pub fn outstanding(&self) -> usize {
        self.checkouts().saturating_sub(self.checkins())
    }
}

pub struct CountingBroker {
    stats: Arc<BrokerStats>,
    fail: bool,
    held: Option<CredentialSet>,
}

#[async_trait]
impl CredentialBroker for CountingBroker {
    async fn checkout(&mut self) -> Result<CredentialSet, CredentialError> {
        if self.held.is_some() {
            return Err(CredentialError::AlreadyCheckedOut);
        }
        if self.fail {
            return Err(CredentialError::Exit {
                status: "exit status: 1".to_string(),
                stderr: "profile not permitted".to_string(),
            });
        }
        let credentials = sample_credentials();
        self.held = Some(credentials.clone());
        self.stats.checkouts.fetch_add(1, Ordering::SeqCst);
        Ok(credentials)
    }

    fn checkin(&mut self) {
        if self.held.take().is_some() {
            self.stats.checkins.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_checked_out(&self) -> bool {
        self.held.is_some()
    }
}

pub struct CountingBrokerSource {
    stats: Arc<BrokerStats>,
    fail: bool,
    requested: Mutex<Vec<AgentType>>,
}

impl CountingBrokerSource {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(BrokerStats::default()),
            fail: false,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Every checkout fails the way a non-zero tool exit does.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn stats(&self) -> &BrokerStats {
        &self.stats
    }

    /// Agent types whose profiles brokers were built for, in order.
    pub fn requested(&self) -> Vec<AgentType> {
        self.requested
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for CountingBrokerSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerSource for CountingBrokerSource {
    fn broker_for(&self, profile: &AgentProfile) -> Box<dyn CredentialBroker> {
        self.requested
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(profile.agent_type);
        Box::new(CountingBroker {
            stats: Arc::clone(&self.stats),
            fail: self.fail,
            held: None,
        })
    }
}

/// Scripted behaviour shared by a backend and the agents it builds.
#[derive(Debug, Clone, Default)]
struct Script {
    chunks: Vec<String>,
    stream_error: Option<String>,
    report: Option<StructuredReport>,
    extraction_error: Option<String>,
}

pub struct StubBackend {
    script: Script,
    fail_build: bool,
    builds: Arc<AtomicUsize>,
    extraction_prompts: Arc<Mutex<Vec<String>>>,
}

impl StubBackend {
    /// Agents stream `chunks` and have no structured data.
    pub fn answering(chunks: &[&str]) -> Self {
        Self {
            script: Script {
                chunks: chunks.iter().map(|c| c.to_string()).collect(),
                ..Script::default()
            },
            fail_build: false,
            builds: Arc::new(AtomicUsize::new(0)),
            extraction_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Building an agent fails as if the session were invalid.
    pub fn failing_build() -> Self {
        Self {
            fail_build: true,
            ..Self::answering(&[])
        }
    }

    pub fn with_report(mut self, report: StructuredReport) -> Self {
        self.script.report = Some(report);
        self
    }

    /// The stream fails with `message` after the scripted chunks.
    pub fn with_stream_error(mut self, message: &str) -> Self {
        self.script.stream_error = Some(message.to_string());
        self
    }

    /// Extraction fails with a model error instead of a parse error.
    pub fn with_extraction_error(mut self, message: &str) -> Self {
        self.script.extraction_error = Some(message.to_string());
        self
    }

    pub fn builds(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.builds)
    }

    /// Prompts passed to `structured_output`, across all built agents.
    pub fn extraction_prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.extraction_prompts)
    }
}

impl AgentBackend for StubBackend {
    fn build(
        &self,
        profile: &AgentProfile,
        credentials: &CredentialSet,
    ) -> Result<Box<dyn ConversationAgent>, AgentError> {
        if self.fail_build {
            return Err(AgentError::Session("stub session rejected".to_string()));
        }
        if !credentials.missing_fields().is_empty() {
            return Err(AgentError::Session("incomplete credentials".to_string()));
        }
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubAgent {
            profile: profile.clone(),
            script: self.script.clone(),
            conversation: Conversation::new(),
            extraction_prompts: Arc::clone(&self.extraction_prompts),
        }))
    }
}

pub struct StubAgent {
    profile: AgentProfile,
    script: Script,
    conversation: Conversation,
    extraction_prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ConversationAgent for StubAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    async fn stream<'a>(&'a mut self, prompt: &str) -> Result<TextStream<'a>, AgentError> {
        self.conversation.push_user(prompt);
        let mut items: Vec<Result<String, AgentError>> =
            self.script.chunks.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.script.stream_error {
            items.push(Err(AgentError::Cli(message.clone())));
        }
        Ok(TextStream::from_chunks(items, &mut self.conversation))
    }

    async fn structured_output(
        &mut self,
        kind: ReportKind,
        prompt: &str,
    ) -> Result<StructuredReport, AgentError> {
        self.extraction_prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        self.conversation.push_user(prompt);

        if let Some(message) = &self.script.extraction_error {
            return Err(AgentError::Cli(message.clone()));
        }
        match &self.script.report {
            Some(report) if report.kind() == kind => {
                self.conversation.push_assistant("{}");
                Ok(report.clone())
            }
            Some(report) => Err(AgentError::Parse(format!(
                "expected {kind} report, got {}",
                report.kind()
            ))),
            None => Err(AgentError::Parse("No valid JSON object found".to_string())),
        }
    }
}
