//! Behavior tests for the in-memory transport binding: delivery, redelivery
//! of abandoned messages, and dead-lettering of malformed ones.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use newsfeed_bus::{EventBus, HandleError, Handler, InMemoryBus, NullBus};

fn counting_handler(attempts: Arc<AtomicUsize>, fail_first: usize) -> Handler {
    Arc::new(move |_body| {
        let attempts = attempts.clone();
        async move {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= fail_first {
                Err(HandleError::Transient(anyhow::anyhow!("attempt {n} failed")))
            } else {
                Ok(())
            }
        }
        .boxed()
    })
}

fn malformed_handler(attempts: Arc<AtomicUsize>) -> Handler {
    Arc::new(move |_body| {
        let attempts = attempts.clone();
        async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(HandleError::Malformed("not json".to_string()))
        }
        .boxed()
    })
}

async fn wait_until(deadline: Duration, check: impl Fn() -> bool) -> bool {
    let started = tokio::time::Instant::now();
    while started.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

#[tokio::test]
async fn published_message_reaches_the_handler() {
    let bus = InMemoryBus::new(Duration::from_millis(10));
    let attempts = Arc::new(AtomicUsize::new(0));

    bus.listen_one("t.created", "sub", counting_handler(attempts.clone(), 0))
        .await
        .unwrap();
    bus.publish("t.created", b"{}".to_vec());

    assert!(
        wait_until(Duration::from_secs(2), || attempts.load(Ordering::SeqCst) == 1).await,
        "handler never ran"
    );
    assert!(bus.dead_letters().is_empty());
}

#[tokio::test]
async fn transient_failure_is_redelivered_until_success() {
    let bus = InMemoryBus::new(Duration::from_millis(10));
    let attempts = Arc::new(AtomicUsize::new(0));

    bus.listen_one("t.retry", "sub", counting_handler(attempts.clone(), 2))
        .await
        .unwrap();
    bus.publish("t.retry", b"{}".to_vec());

    assert!(
        wait_until(Duration::from_secs(2), || attempts.load(Ordering::SeqCst) >= 3).await,
        "message was not redelivered to success"
    );
    assert!(bus.dead_letters().is_empty());
}

#[tokio::test]
async fn malformed_message_is_dead_lettered_exactly_once() {
    let bus = InMemoryBus::new(Duration::from_millis(10));
    let attempts = Arc::new(AtomicUsize::new(0));

    bus.listen_one("t.bad", "sub", malformed_handler(attempts.clone()))
        .await
        .unwrap();
    bus.publish("t.bad", b"not json".to_vec());

    assert!(
        wait_until(Duration::from_secs(2), || bus.dead_letters().len() == 1).await,
        "message never reached the dead-letter list"
    );

    // Several redelivery windows pass without a second attempt.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    let dead = bus.dead_letters();
    assert_eq!(dead[0].topic, "t.bad");
    assert_eq!(dead[0].body, b"not json".to_vec());
}

#[tokio::test]
async fn each_subscription_receives_its_own_copy() {
    let bus = InMemoryBus::new(Duration::from_millis(10));
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    bus.listen_one("t.fan", "sub-a", counting_handler(first.clone(), 0))
        .await
        .unwrap();
    bus.listen_one("t.fan", "sub-b", counting_handler(second.clone(), 0))
        .await
        .unwrap();
    bus.publish("t.fan", b"{}".to_vec());

    assert!(
        wait_until(Duration::from_secs(2), || {
            first.load(Ordering::SeqCst) == 1 && second.load(Ordering::SeqCst) == 1
        })
        .await,
        "both subscriptions should see the message"
    );
}

#[tokio::test]
async fn publish_without_subscribers_is_silently_dropped() {
    let bus = InMemoryBus::new(Duration::from_millis(10));
    bus.publish("t.nobody", b"{}".to_vec());
    assert!(bus.dead_letters().is_empty());
}

#[tokio::test]
async fn null_bus_accepts_subscriptions() {
    let attempts = Arc::new(AtomicUsize::new(0));
    NullBus
        .listen_one("t.anything", "sub", counting_handler(attempts.clone(), 0))
        .await
        .unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}
