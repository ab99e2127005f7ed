use async_trait::async_trait;
use finguard_models::{AgentProfile, ReportKind, StructuredReport};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::claude_cli::{invoke_claude, stream_claude, ClaudeCliConfig};
use crate::conversation::{Conversation, SummarizingConversationManager, Summarizer};
use crate::error::AgentError;
use crate::parser::{parse_report, parse_tool_plan};
use crate::prompts::{
    structured_output_request, tool_planning_request, SUMMARIZER_PROMPT, TOOL_PLANNER_PROMPT,
};
use crate::session::CloudSession;
use crate::stream::TextStream;
use crate::tools::Toolset;

/// A per-request agent bound to one profile and one credential set.
/// Mockable for testing.
#[async_trait]
pub trait ConversationAgent: Send + Sync {
    fn profile(&self) -> &AgentProfile;

    fn system_prompt(&self) -> &str {
        &self.profile().system_prompt
    }

    fn conversation(&self) -> &Conversation;

    /// Start answering `prompt`. The returned stream records the reply in
    /// the conversation once drained.
    async fn stream<'a>(&'a mut self, prompt: &str) -> Result<TextStream<'a>, AgentError>;

    /// Ask for the conversation so far as a report of `kind`.
    async fn structured_output(
        &mut self,
        kind: ReportKind,
        prompt: &str,
    ) -> Result<StructuredReport, AgentError>;
}

/// The hosted model, reached through the Claude CLI with one session's
/// credentials.
#[derive(Debug, Clone)]
pub struct ClaudeModel {
    session: CloudSession,
    cli: ClaudeCliConfig,
}

impl ClaudeModel {
    pub fn new(session: CloudSession, cli: ClaudeCliConfig) -> Self {
        Self { session, cli }
    }

    pub fn session(&self) -> &CloudSession {
        &self.session
    }

    pub async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, AgentError> {
        invoke_claude(&self.session, system_prompt, prompt, &self.cli).await
    }

    pub async fn stream(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<mpsc::Receiver<Result<String, AgentError>>, AgentError> {
        stream_claude(&self.session, system_prompt, prompt, &self.cli).await
    }
}

#[async_trait]
impl Summarizer for ClaudeModel {
    async fn summarize(&self, transcript: &str) -> Result<String, AgentError> {
        self.complete(SUMMARIZER_PROMPT, transcript).await
    }
}

pub struct ClaudeAgent {
    profile: AgentProfile,
    model: ClaudeModel,
    toolset: Toolset,
    max_tool_calls: usize,
    manager: SummarizingConversationManager,
    conversation: Conversation,
}

impl ClaudeAgent {
    pub fn new(
        profile: AgentProfile,
        model: ClaudeModel,
        toolset: Toolset,
        max_tool_calls: usize,
        manager: SummarizingConversationManager,
    ) -> Self {
        Self {
            profile,
            model,
            toolset,
            max_tool_calls,
            manager,
            conversation: Conversation::new(),
        }
    }

    pub fn toolset(&self) -> &Toolset {
        &self.toolset
    }

    async fn compact(&mut self) -> Result<(), AgentError> {
        self.manager
            .apply(&mut self.conversation, &self.model)
            .await
            .map(|_| ())
    }

    /// Let the model pick tools for the latest message and record their
    /// output. Planning failures mean no tools run.
    async fn run_tools(&mut self) {
        if self.toolset.is_empty() || self.max_tool_calls == 0 {
            return;
        }

        let request = tool_planning_request(
            &self.toolset,
            &self.conversation.render_transcript(),
            self.max_tool_calls,
        );
        let raw = match self.model.complete(TOOL_PLANNER_PROMPT, &request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(agent = %self.profile.agent_type, error = %e, "Tool planning failed");
                return;
            }
        };
        let plan = match parse_tool_plan(&raw) {
            Ok(plan) => plan,
            Err(e) => {
                debug!(error = %e, "Unusable tool plan, continuing without tools");
                return;
            }
        };
        if plan.tool_calls.is_empty() {
            return;
        }

        info!(
            agent = %self.profile.agent_type,
            calls = plan.tool_calls.len(),
            "Running planned tools"
        );
        let results = self.toolset.execute_all(&plan.tool_calls, self.max_tool_calls);
        self.conversation.push_tool(results);
    }
}

#[async_trait]
impl ConversationAgent for ClaudeAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    async fn stream<'a>(&'a mut self, prompt: &str) -> Result<TextStream<'a>, AgentError> {
        self.conversation.push_user(prompt);
        self.compact().await?;
        self.run_tools().await;

        let transcript = self.conversation.render_transcript();
        let rx = self
            .model
            .stream(&self.profile.system_prompt, &transcript)
            .await?;
        Ok(TextStream::new(rx, &mut self.conversation))
    }

    async fn structured_output(
        &mut self,
        kind: ReportKind,
        prompt: &str,
    ) -> Result<StructuredReport, AgentError> {
        self.conversation
            .push_user(structured_output_request(kind, prompt));
        self.compact().await?;

        let transcript = self.conversation.render_transcript();
        let raw = self
            .model
            .complete(&self.profile.system_prompt, &transcript)
            .await?;
        self.conversation.push_assistant(raw.trim());

        parse_report(kind, &raw)
    }
}

impl std::fmt::Debug for ClaudeAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeAgent")
            .field("agent_type", &self.profile.agent_type)
            .field("model", &self.model.session().model_id())
            .field("tools", &self.toolset)
            .field("messages", &self.conversation.len())
            .finish()
    }
}
