pub mod agent;
pub mod claude_cli;
pub mod conversation;
pub mod error;
pub mod factory;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod session;
pub mod stream;
pub mod tools;

pub mod test_support;

pub use agent::{ClaudeAgent, ClaudeModel, ConversationAgent};
pub use claude_cli::{check_cli_available, ClaudeCliConfig};
pub use conversation::{Conversation, Message, Role, SummarizingConversationManager, Summarizer};
pub use error::AgentError;
pub use factory::{profile_table, AgentBackend, AgentFactory, ClaudeBackend};
pub use orchestrator::{Extraction, QueryError, QueryOrchestrator};
pub use session::CloudSession;
pub use stream::TextStream;
pub use tools::{Tool, ToolCall, ToolError, ToolPlan, Toolset};
