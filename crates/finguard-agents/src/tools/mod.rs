//! Deterministic tools the agents may call while answering a query.

mod calculator;
mod compliance;
mod transactions;
mod value_at_risk;

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub use calculator::{evaluate, Calculator};
pub use compliance::ComplianceStatus;
pub use transactions::TransactionPatternAnalysis;
pub use value_at_risk::ValueAtRisk;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid input for {tool}: {message}")]
    InvalidInput { tool: String, message: String },

    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}

impl ToolError {
    pub(crate) fn invalid(tool: &str, message: impl Into<String>) -> Self {
        ToolError::InvalidInput {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub input: serde_json::Value,
}

/// The model's answer to a tool-planning turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ToolPlan {
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema of the `input` object.
    fn parameters(&self) -> serde_json::Value;
    fn call(&self, input: &serde_json::Value) -> Result<String, ToolError>;
}

/// Deserialize a tool's input, mapping failures to `InvalidInput`.
pub(crate) fn parse_input<T: serde::de::DeserializeOwned>(
    tool: &str,
    input: &serde_json::Value,
) -> Result<T, ToolError> {
    serde_json::from_value(input.clone()).map_err(|e| ToolError::invalid(tool, e.to_string()))
}

/// The fixed set of tools bound to every agent.
#[derive(Clone, Default)]
pub struct Toolset {
    tools: Vec<Arc<dyn Tool>>,
}

impl Toolset {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// Pattern analysis, value-at-risk, compliance scoring and a calculator.
    pub fn standard() -> Self {
        Self::new(vec![
            Arc::new(TransactionPatternAnalysis),
            Arc::new(ValueAtRisk),
            Arc::new(ComplianceStatus),
            Arc::new(Calculator),
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
        tool.call(&call.input)
    }

    /// Run up to `limit` calls and render their results for the transcript.
    /// Failures are reported inline so the model can see them.
    pub fn execute_all(&self, calls: &[ToolCall], limit: usize) -> String {
        if calls.len() > limit {
            warn!(requested = calls.len(), limit, "Tool plan truncated");
        }

        calls
            .iter()
            .take(limit)
            .map(|call| match self.execute(call) {
                Ok(output) => {
                    info!(tool = %call.name, "Tool executed");
                    format!("[{}]\n{}", call.name, output.trim())
                }
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Tool failed");
                    format!("[{}]\nerror: {e}", call.name)
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Catalogue of the tools for the planning prompt.
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|t| {
                format!(
                    "- {}: {}\n  input schema: {}",
                    t.name(),
                    t.description(),
                    t.parameters()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Debug for Toolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// `1234567.891` -> `$1,234,567.89`
pub(crate) fn format_money(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((&text, "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${}.{frac_part}", group_thousands(int_part))
}

/// `1234567` -> `1,234,567`
pub(crate) fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn standard_toolset_names() {
        let toolset = Toolset::standard();
        assert_eq!(
            toolset.names(),
            vec![
                "analyze_transaction_pattern",
                "calculate_value_at_risk",
                "check_compliance_status",
                "calculator"
            ]
        );
    }

    #[test]
    fn unknown_tool() {
        let call = ToolCall {
            name: "transfer_funds".to_string(),
            input: serde_json::json!({}),
        };
        let result = Toolset::standard().execute(&call);
        assert_eq!(result, Err(ToolError::UnknownTool("transfer_funds".to_string())));
    }

    #[test]
    fn execute_all_reports_errors_inline_and_respects_limit() {
        let calls = vec![
            ToolCall {
                name: "calculator".to_string(),
                input: serde_json::json!({"expression": "2 + 2"}),
            },
            ToolCall {
                name: "calculator".to_string(),
                input: serde_json::json!({"expression": "1 / 0"}),
            },
            ToolCall {
                name: "calculator".to_string(),
                input: serde_json::json!({"expression": "3 * 3"}),
            },
        ];
        let rendered = Toolset::standard().execute_all(&calls, 2);
        assert!(rendered.contains("[calculator]\n4"));
        assert!(rendered.contains("error: Evaluation failed: division by zero"));
        assert!(!rendered.contains("9"));
    }

    #[test]
    fn describe_lists_schemas() {
        let description = Toolset::standard().describe();
        assert!(description.contains("calculate_value_at_risk"));
        assert!(description.contains("portfolio_value"));
        assert!(description.contains("expression"));
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_money(dec!(9900)), "$9,900.00");
        assert_eq!(format_money(dec!(0.5)), "$0.50");
        assert_eq!(format_money(dec!(-1500)), "-$1,500.00");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("100000"), "100,000");
        assert_eq!(group_thousands("2500000000"), "2,500,000,000");
    }
}
