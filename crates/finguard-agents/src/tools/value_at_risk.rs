use rust_decimal::Decimal;
use serde::Deserialize;

use super::{format_money, parse_input, Tool, ToolError};

const NAME: &str = "calculate_value_at_risk";

/// z-score of the one-sided 95% confidence level.
const Z_95: Decimal = Decimal::from_parts(1645, 0, 0, false, 3);

/// Parametric one-day value at risk at 95% confidence.
pub struct ValueAtRisk;

#[derive(Debug, Deserialize)]
struct Input {
    portfolio_value: Decimal,
    #[serde(default = "default_volatility")]
    volatility: Decimal,
}

fn default_volatility() -> Decimal {
    Decimal::new(15, 2)
}

pub fn value_at_risk(portfolio_value: Decimal, volatility: Decimal) -> Decimal {
    (portfolio_value * volatility * Z_95).round_dp(2)
}

impl Tool for ValueAtRisk {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Daily value at risk (95%) of a portfolio: value x volatility x 1.645. Volatility defaults to 0.15."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "portfolio_value": {"type": "number"},
                "volatility": {"type": "number", "default": 0.15}
            },
            "required": ["portfolio_value"]
        })
    }

    fn call(&self, input: &serde_json::Value) -> Result<String, ToolError> {
        let input: Input = parse_input(NAME, input)?;
        if input.portfolio_value.is_sign_negative() {
            return Err(ToolError::invalid(NAME, "portfolio_value must not be negative"));
        }
        if input.volatility.is_sign_negative() {
            return Err(ToolError::invalid(NAME, "volatility must not be negative"));
        }

        let var = value_at_risk(input.portfolio_value, input.volatility);
        Ok(format!(
            "VALUE AT RISK ANALYSIS\nPortfolio Value: {}\nDaily VaR (95%): {}\n",
            format_money(input.portfolio_value),
            format_money(var)
        ))
    }
}
