pub mod agent_profile;
pub mod config;
pub mod credentials;
pub mod query;
pub mod report;

pub use agent_profile::{AgentProfile, AgentType, ProfileTable};
pub use config::{
    AgentsConfig, ConversationConfig, CredentialToolConfig, FinguardConfig, ModelConfig,
    ProfileOverride, ServerConfig,
};
pub use credentials::CredentialSet;
pub use query::{AnalyzeRequest, QueryResult};
pub use report::{
    ComplianceReport, FraudAnalysisReport, MarketRiskAnalysis, ReportKind, StructuredReport,
    TransactionData,
};
