use serde::Deserialize;

use super::{group_thousands, parse_input, Tool, ToolError};

const NAME: &str = "check_compliance_status";

/// Share of reviewed transactions without violations, as a percentage.
pub struct ComplianceStatus;

#[derive(Debug, Deserialize)]
struct Input {
    transaction_count: u64,
    #[serde(default)]
    violations: u64,
}

pub fn compliance_score(transaction_count: u64, violations: u64) -> f64 {
    let reviewed = transaction_count.max(1) as f64;
    (100.0 - violations as f64 / reviewed * 100.0).max(0.0)
}

impl Tool for ComplianceStatus {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Compliance score: 100 - violations / transaction_count * 100, floored at 0."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "transaction_count": {"type": "integer", "minimum": 0},
                "violations": {"type": "integer", "minimum": 0, "default": 0}
            },
            "required": ["transaction_count"]
        })
    }

    fn call(&self, input: &serde_json::Value) -> Result<String, ToolError> {
        let input: Input = parse_input(NAME, input)?;
        let score = compliance_score(input.transaction_count, input.violations);
        Ok(format!(
            "COMPLIANCE REPORT\nTransactions Reviewed: {}\nViolations: {}\nCompliance Score: {score:.1}%\n",
            group_thousands(&input.transaction_count.to_string()),
            input.violations
        ))
    }
}
