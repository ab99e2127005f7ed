use finguard_models::{ReportKind, StructuredReport};

use crate::error::AgentError;
use crate::tools::ToolPlan;

/// Extract the first JSON object from model output that may contain
/// surrounding prose.
///
/// Accepts, in order of preference:
/// - the whole text as an object: `{"key": "value"}`
/// - a fenced block: ```json\n{"key": "value"}\n```
/// - each balanced `{ ... }` in the text, left to right, until one parses
pub fn extract_json(text: &str) -> Result<serde_json::Value, AgentError> {
    let trimmed = text.trim();

    let candidates = std::iter::once(trimmed)
        .chain(fenced_block(trimmed))
        .chain(balanced_objects(trimmed));

    for candidate in candidates {
        if !candidate.starts_with('{') {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(candidate) {
            return Ok(value);
        }
    }

    Err(AgentError::Parse(format!(
        "No valid JSON object found in response (length={})",
        text.len()
    )))
}

/// Body of the first ``` fenced block, with or without a `json` tag.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// Every `{ ... }` whose braces balance, by opening position.
fn balanced_objects(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices('{')
        .filter_map(move |(start, _)| balanced_from(text, start))
}

/// The object opening at `start`, ignoring braces inside strings.
fn balanced_from(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse model output into the report shape for `kind`.
pub fn parse_report(kind: ReportKind, raw: &str) -> Result<StructuredReport, AgentError> {
    let value = extract_json(raw)?;
    StructuredReport::from_value(kind, value)
        .map_err(|e| AgentError::Parse(format!("{kind} report does not match schema: {e}")))
}

/// Parse a tool-planning reply.
pub fn parse_tool_plan(raw: &str) -> Result<ToolPlan, AgentError> {
    let value = extract_json(raw)?;
    serde_json::from_value(value)
        .map_err(|e| AgentError::Parse(format!("Invalid tool plan: {e}")))
}
