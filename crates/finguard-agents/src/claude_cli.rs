use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::session::CloudSession;

/// Fragments buffered between the CLI reader task and the consumer.
const STREAM_BUFFER: usize = 64;

/// Configuration for a Claude CLI invocation.
#[derive(Debug, Clone)]
pub struct ClaudeCliConfig {
    pub program: String,
    /// Bound on one-shot calls. Streaming calls are not bounded.
    pub timeout: Duration,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

fn command(session: &CloudSession, config: &ClaudeCliConfig) -> Command {
    let mut cmd = Command::new(&config.program);
    session.apply(&mut cmd);
    cmd.kill_on_drop(true);
    cmd
}

/// Invoke the CLI with a system prompt and user prompt.
/// Returns the raw stdout text.
pub async fn invoke_claude(
    session: &CloudSession,
    system_prompt: &str,
    user_prompt: &str,
    config: &ClaudeCliConfig,
) -> Result<String, AgentError> {
    debug!(model = %session.model_id(), "Invoking claude CLI");

    let mut cmd = command(session, config);
    cmd.args([
        "-p",
        user_prompt,
        "--system-prompt",
        system_prompt,
        "--model",
        session.model_id(),
        "--output-format",
        "text",
    ]);

    let result = tokio::time::timeout(config.timeout, cmd.output())
        .await
        .map_err(|_| AgentError::Timeout(config.timeout.as_secs()))?
        .map_err(|e| AgentError::Cli(format!("Failed to spawn {}: {e}", config.program)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        warn!(status = %result.status, stderr = %stderr, "Claude CLI failed");
        return Err(AgentError::Cli(format!(
            "claude exited {}: {}",
            result.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&result.stdout).to_string();
    if stdout.trim().is_empty() {
        return Err(AgentError::Cli("Claude returned empty response".to_string()));
    }

    Ok(stdout)
}

/// Start a streaming invocation and return the receiving end of its text
/// fragments. The stream ends when the CLI exits; a failed exit arrives as a
/// final `Err` item.
pub async fn stream_claude(
    session: &CloudSession,
    system_prompt: &str,
    user_prompt: &str,
    config: &ClaudeCliConfig,
) -> Result<mpsc::Receiver<Result<String, AgentError>>, AgentError> {
    debug!(model = %session.model_id(), "Streaming from claude CLI");

    let mut cmd = command(session, config);
    cmd.args([
        "-p",
        user_prompt,
        "--system-prompt",
        system_prompt,
        "--model",
        session.model_id(),
        "--output-format",
        "stream-json",
        "--verbose",
        "--include-partial-messages",
    ])
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| AgentError::Cli(format!("Failed to spawn {}: {e}", config.program)))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AgentError::Cli("claude stdout not captured".to_string()))?;

    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    tokio::spawn(forward_stream(child, stdout, tx));
    Ok(rx)
}

/// One decoded line of `--output-format stream-json`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamLine {
    TextDelta(String),
    Result { text: String, is_error: bool },
    Other,
}

pub fn parse_stream_line(line: &str) -> StreamLine {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
        return StreamLine::Other;
    };

    match value.get("type").and_then(|t| t.as_str()) {
        Some("stream_event") => {
            let event = &value["event"];
            if event["type"] == "content_block_delta" && event["delta"]["type"] == "text_delta" {
                if let Some(text) = event["delta"]["text"].as_str() {
                    return StreamLine::TextDelta(text.to_string());
                }
            }
            StreamLine::Other
        }
        Some("result") => StreamLine::Result {
            text: value["result"].as_str().unwrap_or_default().to_string(),
            is_error: value["is_error"].as_bool().unwrap_or(false),
        },
        _ => StreamLine::Other,
    }
}

async fn forward_stream(
    mut child: Child,
    stdout: ChildStdout,
    tx: mpsc::Sender<Result<String, AgentError>>,
) {
    let stderr_task = child.stderr.take().map(|mut stderr| {
        tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        })
    });

    let mut lines = BufReader::new(stdout).lines();
    let mut saw_delta = false;
    let mut final_text = None;

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_stream_line(&line) {
                StreamLine::TextDelta(text) => {
                    saw_delta = true;
                    // Receiver gone: dropping the child kills the CLI.
                    if tx.send(Ok(text)).await.is_err() {
                        return;
                    }
                }
                StreamLine::Result { text, is_error: true } => {
                    let _ = tx
                        .send(Err(AgentError::Cli(format!("claude reported an error: {text}"))))
                        .await;
                    return;
                }
                StreamLine::Result { text, .. } => final_text = Some(text),
                StreamLine::Other => {}
            },
            Ok(None) => break,
            Err(e) => {
                let _ = tx
                    .send(Err(AgentError::Cli(format!("Failed reading claude output: {e}"))))
                    .await;
                return;
            }
        }
    }

    if !saw_delta {
        if let Some(text) = final_text.filter(|t| !t.is_empty()) {
            if tx.send(Ok(text)).await.is_err() {
                return;
            }
        }
    }

    let status = match child.wait().await {
        Ok(status) => status,
        Err(e) => {
            let _ = tx
                .send(Err(AgentError::Cli(format!("Failed waiting for claude: {e}"))))
                .await;
            return;
        }
    };

    if !status.success() {
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        warn!(status = %status, stderr = %stderr, "Claude CLI stream failed");
        let _ = tx
            .send(Err(AgentError::Cli(format!(
                "claude exited {status}: {}",
                stderr.trim()
            ))))
            .await;
    }
}

/// Check if the CLI is available on the system.
pub async fn check_cli_available(program: &str) -> bool {
    match Command::new(program).arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClaudeCliConfig::default();
        assert_eq!(config.program, "claude");
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn parse_text_delta() {
        let line = r#"{"type":"stream_event","event":{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Analysis "}}}"#;
        assert_eq!(
            parse_stream_line(line),
            StreamLine::TextDelta("Analysis ".to_string())
        );
    }

    #[test]
    fn parse_result_line() {
        let line = r#"{"type":"result","subtype":"success","is_error":false,"result":"Analysis complete"}"#;
        assert_eq!(
            parse_stream_line(line),
            StreamLine::Result {
                text: "Analysis complete".to_string(),
                is_error: false
            }
        );
    }

    #[test]
    fn other_lines_are_ignored() {
        assert_eq!(
            parse_stream_line(r#"{"type":"system","subtype":"init"}"#),
            StreamLine::Other
        );
        assert_eq!(
            parse_stream_line(r#"{"type":"stream_event","event":{"type":"message_start"}}"#),
            StreamLine::Other
        );
        assert_eq!(parse_stream_line("not json"), StreamLine::Other);
    }
}
