use async_trait::async_trait;
use thiserror::Error;

/// Opaque handle for a resolved send target (a chat group or a direct
/// contact), as understood by the concrete channel implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target(pub String);

#[derive(Debug, Error)]
#[error("delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Outbound messaging capability, injected into the workers. The core only
/// resolves names and fires messages; it never implements the transport and
/// does not act on acknowledgments.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn resolve_group(&self, name: &str) -> Option<Target>;
    async fn resolve_contact(&self, name: &str) -> Option<Target>;
    async fn send(&self, text: &str, target: &Target) -> Result<(), DeliveryError>;
}
