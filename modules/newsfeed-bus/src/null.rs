use async_trait::async_trait;
use tracing::debug;

use crate::{EventBus, Handler};

/// Binding that accepts subscriptions and delivers nothing. The default when
/// no transport is configured, so the read API can run standalone.
#[derive(Debug, Clone, Default)]
pub struct NullBus;

#[async_trait]
impl EventBus for NullBus {
    async fn listen_one(
        &self,
        topic: &str,
        subscription: &str,
        _handler: Handler,
    ) -> anyhow::Result<()> {
        debug!(topic, subscription, "Null bus: subscription registered, no delivery");
        Ok(())
    }
}
