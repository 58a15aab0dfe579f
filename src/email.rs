use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Notification templates the core can ask the collaborator to send
#[derive(Debug, Clone, Copy)]
pub enum MailKind {
    Verification,
}

/// Outbound email collaborator. Delivery is somebody else's problem; the
/// core only hands over an address, a token and a template kind.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, address: &str, token: &str, kind: MailKind) -> anyhow::Result<()>;
}

/// Default implementation: logs instead of delivering
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, address: &str, token: &str, kind: MailKind) -> anyhow::Result<()> {
        info!(%address, %token, ?kind, "mail queued");
        Ok(())
    }
}

/// Fire-and-forget send: failures are logged, never surfaced to the caller
pub fn send_detached(mailer: Arc<dyn Mailer>, address: String, token: String, kind: MailKind) {
    tokio::spawn(async move {
        if let Err(error) = mailer.send(&address, &token, kind).await {
            warn!(%address, ?kind, "mail delivery failed: {error:?}");
        }
    });
}
