use rust_decimal::Decimal;
use serde::Deserialize;

use super::{format_money, parse_input, Tool, ToolError};

const NAME: &str = "analyze_transaction_pattern";
const MAX_LISTED: usize = 5;

/// Flags transactions whose risk score exceeds a threshold.
pub struct TransactionPatternAnalysis;

#[derive(Debug, Deserialize)]
struct Input {
    transactions: Vec<Transaction>,
    #[serde(default = "default_threshold")]
    threshold: Decimal,
}

#[derive(Debug, Deserialize)]
struct Transaction {
    #[serde(default = "unknown_id")]
    transaction_id: String,
    #[serde(default)]
    amount: Decimal,
    #[serde(default)]
    risk_score: Decimal,
}

fn default_threshold() -> Decimal {
    Decimal::new(7, 1)
}

fn unknown_id() -> String {
    "N/A".to_string()
}

impl Tool for TransactionPatternAnalysis {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Count transactions and list those whose risk_score exceeds the threshold (default 0.7)."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "transactions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "transaction_id": {"type": "string"},
                            "amount": {"type": "number"},
                            "risk_score": {"type": "number"}
                        }
                    }
                },
                "threshold": {"type": "number", "default": 0.7}
            },
            "required": ["transactions"]
        })
    }

    fn call(&self, input: &serde_json::Value) -> Result<String, ToolError> {
        let input: Input = parse_input(NAME, input)?;

        let high_risk: Vec<&Transaction> = input
            .transactions
            .iter()
            .filter(|t| t.risk_score > input.threshold)
            .collect();

        let mut out = String::from("FRAUD DETECTION ANALYSIS\n");
        out.push_str(&format!("Total Transactions: {}\n", input.transactions.len()));
        out.push_str(&format!("High-Risk Transactions: {}\n", high_risk.len()));
        for t in high_risk.iter().take(MAX_LISTED) {
            out.push_str(&format!(
                "- {} - {}\n",
                t.transaction_id,
                format_money(t.amount)
            ));
        }
        Ok(out)
    }
}
