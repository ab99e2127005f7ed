pub mod broker;
pub mod cli;
pub mod error;

pub use broker::{BrokerSource, CredentialBroker, CredentialLease};
pub use cli::{CliBrokerSource, CliCredentialBroker};
pub use error::CredentialError;
