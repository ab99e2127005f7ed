use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Decimals are read from either JSON strings or numbers and always written
// as numbers.

/// A transaction flagged inside a fraud analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionData {
    pub transaction_id: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    pub merchant: String,
    pub category: String,
    /// 0.0 to 1.0
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub risk_score: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FraudAnalysisReport {
    pub analysis_timestamp: String,
    pub total_transactions_analyzed: u64,
    pub high_risk_transactions: Vec<TransactionData>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub fraud_probability: Decimal,
    pub recommended_actions: Vec<String>,
    pub compliance_status: String,
    pub risk_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceReport {
    pub regulation_framework: String,
    pub compliance_score: i64,
    pub violations_detected: Vec<String>,
    pub remediation_steps: Vec<String>,
    pub audit_trail_complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketRiskAnalysis {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub portfolio_value: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub value_at_risk: Decimal,
    pub risk_categories: Vec<serde_json::Map<String, serde_json::Value>>,
    pub stress_test_results: serde_json::Map<String, serde_json::Value>,
    pub recommendations: Vec<String>,
}

/// Which schema a structured extraction should produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    FraudAnalysis,
    Compliance,
    MarketRisk,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::FraudAnalysis => "fraud_analysis",
            ReportKind::Compliance => "compliance",
            ReportKind::MarketRisk => "market_risk",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the three report shapes. Serialized as the bare record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StructuredReport {
    FraudAnalysis(FraudAnalysisReport),
    Compliance(ComplianceReport),
    MarketRisk(MarketRiskAnalysis),
}

impl StructuredReport {
    pub fn kind(&self) -> ReportKind {
        match self {
            StructuredReport::FraudAnalysis(_) => ReportKind::FraudAnalysis,
            StructuredReport::Compliance(_) => ReportKind::Compliance,
            StructuredReport::MarketRisk(_) => ReportKind::MarketRisk,
        }
    }

    /// Deserialize `value` strictly as the shape of `kind`.
    pub fn from_value(kind: ReportKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ReportKind::FraudAnalysis => StructuredReport::FraudAnalysis(serde_json::from_value(value)?),
            ReportKind::Compliance => StructuredReport::Compliance(serde_json::from_value(value)?),
            ReportKind::MarketRisk => StructuredReport::MarketRisk(serde_json::from_value(value)?),
        })
    }
}
