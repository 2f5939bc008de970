//! In-process transport binding with real at-least-once semantics: abandoned
//! messages are requeued after a short delay, malformed ones are captured on
//! a dead-letter list. Used for local runs and integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{EventBus, HandleError, Handler};

#[derive(Debug, Clone)]
struct Delivery {
    id: Uuid,
    body: Vec<u8>,
    delivery_count: u32,
}

/// A message that was judged permanently unprocessable.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub topic: String,
    pub body: Vec<u8>,
    pub reason: String,
}

struct Inner {
    // (topic -> subscription -> queue). One queue per pair; every publish
    // fans a copy out to each subscription on the topic.
    queues: Mutex<HashMap<String, HashMap<String, mpsc::UnboundedSender<Delivery>>>>,
    dead_letters: Mutex<Vec<DeadLetter>>,
    redelivery_delay: Duration,
}

#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<Inner>,
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}

impl InMemoryBus {
    pub fn new(redelivery_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                queues: Mutex::new(HashMap::new()),
                dead_letters: Mutex::new(Vec::new()),
                redelivery_delay,
            }),
        }
    }

    /// Deliver `body` to every subscription on `topic`. Topics with no
    /// subscribers swallow the message, as a broker would.
    pub fn publish(&self, topic: &str, body: Vec<u8>) {
        let queues = self.inner.queues.lock().unwrap();
        let Some(subs) = queues.get(topic) else {
            debug!(topic, "Publish to topic with no subscriptions");
            return;
        };

        for tx in subs.values() {
            let _ = tx.send(Delivery {
                id: Uuid::new_v4(),
                body: body.clone(),
                delivery_count: 1,
            });
        }
    }

    /// Snapshot of the dead-letter list.
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.inner.dead_letters.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventBus for InMemoryBus {
    async fn listen_one(
        &self,
        topic: &str,
        subscription: &str,
        handler: Handler,
    ) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Delivery>();

        {
            let mut queues = self.inner.queues.lock().unwrap();
            queues
                .entry(topic.to_string())
                .or_default()
                .insert(subscription.to_string(), tx.clone());
        }

        let inner = self.inner.clone();
        let topic = topic.to_string();

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                debug!(%msg.id, topic, attempt = msg.delivery_count, "Message processing started");

                match handler(msg.body.clone()).await {
                    Ok(()) => {
                        info!(%msg.id, topic, "Message completed");
                    }
                    Err(HandleError::Malformed(reason)) => {
                        warn!(%msg.id, topic, %reason, "Message dead-lettered");
                        inner.dead_letters.lock().unwrap().push(DeadLetter {
                            topic: topic.clone(),
                            body: msg.body,
                            reason,
                        });
                    }
                    Err(HandleError::Transient(e)) => {
                        warn!(%msg.id, topic, error = %e, "Message abandoned");
                        let requeue = tx.clone();
                        let delay = inner.redelivery_delay;
                        let mut msg = msg;
                        msg.delivery_count += 1;
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            let _ = requeue.send(msg);
                        });
                    }
                }
            }
        });

        Ok(())
    }
}
