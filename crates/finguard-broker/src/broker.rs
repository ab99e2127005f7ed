use async_trait::async_trait;
use finguard_models::{AgentProfile, CredentialSet};

use crate::error::CredentialError;

/// Checkout/checkin of one short-lived credential set. Mockable for testing.
///
/// A broker holds at most one set at a time. `checkin` is idempotent and
/// infallible so it can run on every exit path, including `Drop`.
#[async_trait]
pub trait CredentialBroker: Send {
    async fn checkout(&mut self) -> Result<CredentialSet, CredentialError>;

    fn checkin(&mut self);

    fn is_checked_out(&self) -> bool;
}

/// Builds a fresh broker for each request.
pub trait BrokerSource: Send + Sync {
    fn broker_for(&self, profile: &AgentProfile) -> Box<dyn CredentialBroker>;
}

/// A checked-out credential set tied to its broker.
///
/// The broker is checked in exactly once: by `release`, or when the lease is
/// dropped on an error path or during unwinding.
pub struct CredentialLease {
    broker: Option<Box<dyn CredentialBroker>>,
    credentials: CredentialSet,
}

impl CredentialLease {
    /// Check out credentials from `broker`. Nothing is held on failure.
    pub async fn acquire(mut broker: Box<dyn CredentialBroker>) -> Result<Self, CredentialError> {
        let credentials = broker.checkout().await?;
        Ok(Self {
            broker: Some(broker),
            credentials,
        })
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    pub fn release(mut self) {
        self.checkin_once();
    }

    fn checkin_once(&mut self) {
        if let Some(mut broker) = self.broker.take() {
            broker.checkin();
        }
    }
}

impl Drop for CredentialLease {
    fn drop(&mut self) {
        self.checkin_once();
    }
}

impl std::fmt::Debug for CredentialLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialLease")
            .field("credentials", &self.credentials)
            .field("released", &self.broker.is_none())
            .finish()
    }
}
