use finguard_models::{AgentType, ReportKind};

use crate::tools::Toolset;

pub const FRAUD_DETECTION_PROMPT: &str = "You are an enterprise-grade fraud detection AI agent.\n\
Analyze transactions for fraud, calculate risk scores, and provide actionable recommendations.";

pub const COMPLIANCE_MONITORING_PROMPT: &str = "You are an enterprise compliance monitoring AI agent.\n\
Perform SOX, PCI-DSS, GLBA, and AML compliance analysis.";

pub const MARKET_RISK_PROMPT: &str = "You are an enterprise market risk analysis AI agent.\n\
Calculate VaR, perform stress tests, and provide portfolio risk assessments.";

pub const SUMMARIZER_PROMPT: &str = "You condense conversations between a user and a financial \
analysis agent. Keep every figure, transaction id, regulation and conclusion. Reply with the \
summary only, as short bullet points.";

pub const TOOL_PLANNER_PROMPT: &str = "You decide which deterministic tools to run before a \
financial analysis agent answers. Reply with a single JSON object and nothing else.";

pub fn default_system_prompt(agent_type: AgentType) -> &'static str {
    match agent_type {
        AgentType::FraudDetection => FRAUD_DETECTION_PROMPT,
        AgentType::Compliance => COMPLIANCE_MONITORING_PROMPT,
        AgentType::RiskAnalysis => MARKET_RISK_PROMPT,
    }
}

pub fn default_display_identity(agent_type: AgentType) -> &'static str {
    match agent_type {
        AgentType::FraudDetection => "Fraud Detection AI",
        AgentType::Compliance => "Compliance Monitoring AI",
        AgentType::RiskAnalysis => "Risk Analysis AI",
    }
}

/// Prompt for the structured extraction that follows the streamed answer.
pub fn extraction_request(agent_type: AgentType, query: &str) -> String {
    match agent_type {
        AgentType::FraudDetection => format!("Generate fraud analysis for: {query}"),
        AgentType::Compliance => format!("Generate compliance report for: {query}"),
        AgentType::RiskAnalysis => format!("Generate risk analysis for: {query}"),
    }
}

/// Example record of each report kind.
pub fn report_schema(kind: ReportKind) -> serde_json::Value {
    match kind {
        ReportKind::FraudAnalysis => serde_json::json!({
            "analysis_timestamp": "<RFC 3339 timestamp>",
            "total_transactions_analyzed": 0,
            "high_risk_transactions": [{
                "transaction_id": "<string>",
                "amount": 0.0,
                "merchant": "<string>",
                "category": "<string>",
                "risk_score": 0.0
            }],
            "fraud_probability": 0.0,
            "recommended_actions": ["<string>"],
            "compliance_status": "<string>",
            "risk_level": "LOW | MEDIUM | HIGH | CRITICAL"
        }),
        ReportKind::Compliance => serde_json::json!({
            "regulation_framework": "<string>",
            "compliance_score": 0,
            "violations_detected": ["<string>"],
            "remediation_steps": ["<string>"],
            "audit_trail_complete": true
        }),
        ReportKind::MarketRisk => serde_json::json!({
            "portfolio_value": 0.0,
            "value_at_risk": 0.0,
            "risk_categories": [{"category": "<string>", "exposure": 0.0}],
            "stress_test_results": {"<scenario>": "<outcome>"},
            "recommendations": ["<string>"]
        }),
    }
}

pub fn structured_output_request(kind: ReportKind, prompt: &str) -> String {
    let schema = serde_json::to_string_pretty(&report_schema(kind)).unwrap_or_default();
    format!(
        "{prompt}\n\n\
         Respond with a single JSON object describing a {kind} report, shaped exactly like:\n\
         {schema}\n\n\
         Use plain numbers for amounts and scores. Do not wrap the object in prose."
    )
}

pub fn tool_planning_request(toolset: &Toolset, transcript: &str, max_calls: usize) -> String {
    format!(
        "Available tools:\n{tools}\n\n\
         Conversation so far:\n{transcript}\n\n\
         Decide which tools (at most {max_calls}) would help answer the latest user message. \
         Only call a tool when the message provides the inputs it needs.\n\
         Reply with: {{\"tool_calls\": [{{\"name\": \"<tool>\", \"input\": {{...}}}}]}}\n\
         Reply with {{\"tool_calls\": []}} when no tool applies.",
        tools = toolset.describe(),
    )
}
