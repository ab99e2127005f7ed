//! Per-agent message history and the summarizing history policy.

use async_trait::async_trait;
use finguard_models::ConversationConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AgentError;

const MIN_SUMMARY_RATIO: f64 = 0.1;
const MAX_SUMMARY_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::Tool => "Tool results",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::new(Role::User, content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::new(Role::Assistant, content));
    }

    pub fn push_tool(&mut self, content: impl Into<String>) {
        self.push(Message::new(Role::Tool, content));
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Replace the oldest `count` messages with one summary message.
    fn replace_prefix(&mut self, count: usize, summary: Message) {
        self.messages.splice(..count, std::iter::once(summary));
    }

    /// Plain-text transcript used as the prompt of the next model turn.
    pub fn render_transcript(&self) -> String {
        render(&self.messages)
    }
}

fn render(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}:\n{}", m.role.label(), m.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Condenses a slice of history into a short text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str) -> Result<String, AgentError>;
}

/// Keeps the history bounded by folding the oldest messages into a summary
/// once it grows past `max_messages`. The most recent
/// `preserve_recent_messages` are never folded.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizingConversationManager {
    summary_ratio: f64,
    preserve_recent_messages: usize,
    max_messages: usize,
}

impl Default for SummarizingConversationManager {
    fn default() -> Self {
        Self::from_config(&ConversationConfig::default())
    }
}

impl SummarizingConversationManager {
    pub fn new(summary_ratio: f64, preserve_recent_messages: usize, max_messages: usize) -> Self {
        Self {
            summary_ratio: summary_ratio.clamp(MIN_SUMMARY_RATIO, MAX_SUMMARY_RATIO),
            preserve_recent_messages,
            max_messages,
        }
    }

    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(
            config.summary_ratio,
            config.preserve_recent_messages,
            config.max_messages,
        )
    }

    pub fn summary_ratio(&self) -> f64 {
        self.summary_ratio
    }

    pub fn preserve_recent_messages(&self) -> usize {
        self.preserve_recent_messages
    }

    /// How many of the oldest messages a history of `len` would fold.
    pub fn summarize_count(&self, len: usize) -> usize {
        let wanted = ((len as f64 * self.summary_ratio).floor() as usize).max(1);
        wanted.min(len.saturating_sub(self.preserve_recent_messages))
    }

    /// Fold old messages if the history is over its limit. Returns whether
    /// anything changed.
    pub async fn apply(
        &self,
        conversation: &mut Conversation,
        summarizer: &dyn Summarizer,
    ) -> Result<bool, AgentError> {
        let len = conversation.len();
        if len <= self.max_messages {
            return Ok(false);
        }

        let count = self.summarize_count(len);
        if count == 0 {
            debug!(len, "History over limit but nothing can be summarized");
            return Ok(false);
        }

        let transcript = render(&conversation.messages()[..count]);
        let summary = summarizer.summarize(&transcript).await?;
        conversation.replace_prefix(
            count,
            Message::new(
                Role::User,
                format!("Summary of the earlier conversation:\n{}", summary.trim()),
            ),
        );

        info!(
            folded = count,
            remaining = conversation.len(),
            "Conversation summarized"
        );
        Ok(true)
    }
}
