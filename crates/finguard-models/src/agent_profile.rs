use std::fmt;

use serde::{Deserialize, Serialize};

use crate::report::ReportKind;

/// The persona that handles a query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    FraudDetection,
    Compliance,
    RiskAnalysis,
}

impl AgentType {
    pub const ALL: [AgentType; 3] = [
        AgentType::FraudDetection,
        AgentType::Compliance,
        AgentType::RiskAnalysis,
    ];

    /// Profile used when a client sends a key we don't recognize.
    pub const DEFAULT: AgentType = AgentType::FraudDetection;

    /// Parse a wire key such as `"fraud_detection"`. Unknown keys yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "fraud_detection" => Some(AgentType::FraudDetection),
            "compliance" => Some(AgentType::Compliance),
            "risk_analysis" => Some(AgentType::RiskAnalysis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::FraudDetection => "fraud_detection",
            AgentType::Compliance => "compliance",
            AgentType::RiskAnalysis => "risk_analysis",
        }
    }

    /// The structured report this persona can be asked to produce.
    pub fn report_kind(&self) -> ReportKind {
        match self {
            AgentType::FraudDetection => ReportKind::FraudAnalysis,
            AgentType::Compliance => ReportKind::Compliance,
            AgentType::RiskAnalysis => ReportKind::MarketRisk,
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static configuration of one persona.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentProfile {
    pub agent_type: AgentType,
    /// Profile identifier handed to the credential tool.
    pub credential_profile: String,
    pub tenant: String,
    pub system_prompt: String,
    /// Human-readable identity used in credential logs.
    pub display_identity: String,
}

/// Read-only table of the supported personas, built once at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTable {
    fraud_detection: AgentProfile,
    compliance: AgentProfile,
    risk_analysis: AgentProfile,
}

impl ProfileTable {
    pub fn new(
        fraud_detection: AgentProfile,
        compliance: AgentProfile,
        risk_analysis: AgentProfile,
    ) -> Self {
        Self {
            fraud_detection,
            compliance,
            risk_analysis,
        }
    }

    pub fn get(&self, agent_type: AgentType) -> &AgentProfile {
        match agent_type {
            AgentType::FraudDetection => &self.fraud_detection,
            AgentType::Compliance => &self.compliance,
            AgentType::RiskAnalysis => &self.risk_analysis,
        }
    }

    /// Look up the profile for a wire key.
    ///
    /// NOTE: an unrecognized key silently resolves to the fraud detection
    /// profile, so a typo in a client request analyzes the wrong domain. This
    /// looks unintended but clients may rely on it; keep it until the product
    /// side confirms a change.
    pub fn resolve(&self, key: &str) -> &AgentProfile {
        self.get(AgentType::parse(key).unwrap_or(AgentType::DEFAULT))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentProfile> {
        AgentType::ALL.into_iter().map(move |t| self.get(t))
    }
}
