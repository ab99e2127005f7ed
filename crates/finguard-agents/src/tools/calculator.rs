use serde::Deserialize;

use super::{parse_input, Tool, ToolError};

const NAME: &str = "calculator";

/// Deepest allowed nesting of parentheses, signs and exponents.
const MAX_DEPTH: usize = 64;

/// Arithmetic over `+ - * / % ^`, parentheses and unary minus.
pub struct Calculator;

#[derive(Debug, Deserialize)]
struct Input {
    expression: String,
}

impl Tool for Calculator {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Supports + - * / % ^ and parentheses."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {"type": "string"}
            },
            "required": ["expression"]
        })
    }

    fn call(&self, input: &serde_json::Value) -> Result<String, ToolError> {
        let input: Input = parse_input(NAME, input)?;
        evaluate(&input.expression).map(format_number)
    }
}

/// Evaluate an expression. `^` binds tighter than unary minus and is
/// right-associative, so `-2^2` is `-4` and `2^3^2` is `512`.
pub fn evaluate(expression: &str) -> Result<f64, ToolError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ToolError::Evaluation("empty expression".to_string()));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(ToolError::Evaluation(format!("unexpected token {token:?}")));
    }
    if !value.is_finite() {
        return Err(ToolError::Evaluation("result is not finite".to_string()));
    }
    Ok(value)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        let text = format!("{value:.10}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Op(char),
    Open,
    Close,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, ToolError> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() || c == ',' || c == '_' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else if c == ',' || c == '_' {
                        // Digit grouping inside a literal.
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal: String = expression[start..end]
                    .chars()
                    .filter(|c| *c != ',' && *c != '_')
                    .collect();
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| ToolError::Evaluation(format!("invalid number '{literal}'")))?;
                tokens.push(Token::Number(number));
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(ch));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            other => {
                return Err(ToolError::Evaluation(format!(
                    "unexpected character '{other}'"
                )))
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<f64, ToolError> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ToolError> {
        let mut value = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                '*' => value * rhs,
                _ if rhs == 0.0 => {
                    return Err(ToolError::Evaluation("division by zero".to_string()))
                }
                '/' => value / rhs,
                _ => value.rem_euclid(rhs),
            };
        }
        Ok(value)
    }

    // Every recursive path passes through here.
    fn unary(&mut self) -> Result<f64, ToolError> {
        if self.depth >= MAX_DEPTH {
            return Err(ToolError::Evaluation(
                "expression nested too deeply".to_string(),
            ));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, ToolError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, ToolError> {
        let base = self.primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, ToolError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Open) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(value),
                    _ => Err(ToolError::Evaluation("missing ')'".to_string())),
                }
            }
            Some(token) => Err(ToolError::Evaluation(format!("unexpected token {token:?}"))),
            None => Err(ToolError::Evaluation("unexpected end of expression".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(evaluate("-2 ^ 2").unwrap(), -4.0);
        assert_eq!(evaluate("17 % 5").unwrap(), 2.0);
    }

    #[test]
    fn unary_minus_and_decimals() {
        assert_eq!(evaluate("-(1.5 + 2.5)").unwrap(), -4.0);
        assert_eq!(evaluate("3 * -2").unwrap(), -6.0);
        let var = evaluate("1000000 * 0.15 * 1.645").unwrap();
        assert!((var - 246750.0).abs() < 1e-6);
    }

    #[test]
    fn grouped_literals() {
        assert_eq!(evaluate("2,500,000 / 2").unwrap(), 1_250_000.0);
    }

    #[test]
    fn errors() {
        assert!(evaluate("").is_err());
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("5 % 0").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 + ").is_err());
        assert!(evaluate("2 2").is_err());
        assert!(evaluate("import os").is_err());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let signs = format!("{}1", "-".repeat(200_000));
        let err = evaluate(&signs).unwrap_err();
        assert!(err.to_string().contains("nested too deeply"));

        let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(evaluate(&parens).is_err());

        let towers = format!("2{}", "^1".repeat(10_000));
        assert!(evaluate(&towers).is_err());

        assert_eq!(evaluate("--1").unwrap(), 1.0);
        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(evaluate(&shallow).unwrap(), 1.0);
    }

    #[test]
    fn tool_formats_result() {
        let out = Calculator
            .call(&serde_json::json!({"expression": "1 / 4"}))
            .unwrap();
        assert_eq!(out, "0.25");
        let out = Calculator
            .call(&serde_json::json!({"expression": "6 * 7"}))
            .unwrap();
        assert_eq!(out, "42");
    }
}
