//! Abstract "subscribe and acknowledge" capability over whatever message
//! transport the process is configured with. Handlers are written against
//! the [`EventBus`] trait and never see the binding.
//!
//! Delivery is at-least-once: a handler that fails transiently has its
//! message returned to the queue for redelivery. A handler that reports the
//! body as malformed sends it to the dead-letter path instead — redelivering
//! an undecodable body can never succeed.

pub mod memory;
pub mod null;

pub use memory::{DeadLetter, InMemoryBus};
pub use null::NullBus;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

/// Why a handler rejected a message.
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    /// The body could not be decoded. Permanent: dead-letter, never retry.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// Infrastructure failure (store unavailable, timeout). The message is
    /// abandoned and redelivered.
    #[error(transparent)]
    Transient(#[from] anyhow::Error),
}

/// A message handler: owns the body, resolves to ack (Ok) or nack (Err).
pub type Handler =
    Arc<dyn Fn(Vec<u8>) -> BoxFuture<'static, Result<(), HandleError>> + Send + Sync>;

#[async_trait]
pub trait EventBus: Send + Sync {
    /// Bind `handler` to `topic` under `subscription` and start a long-lived
    /// receive loop in the background. Returns once the subscription exists;
    /// messages are then processed one at a time per loop.
    async fn listen_one(
        &self,
        topic: &str,
        subscription: &str,
        handler: Handler,
    ) -> anyhow::Result<()>;
}
