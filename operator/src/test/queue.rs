use ferrite_types::{ReconcileAction, ReconcileMessage};

use crate::queue::{InMemoryQueue, WorkQueue};

fn msg(name: &str) -> ReconcileMessage {
    ReconcileMessage {
        action: ReconcileAction::Create,
        kind: "Widget".to_string(),
        group: "ferrite.io".to_string(),
        plural: "widgets".to_string(),
        namespace: None,
        name: name.to_string(),
        spec: serde_json::json!({}),
        status: None,
    }
}

#[tokio::test]
async fn send_then_recv_delivers_the_message() {
    let (queue, mut receiver) = InMemoryQueue::new();
    queue.send(msg("a")).await;
    let delivery = receiver.recv().await.unwrap();
    assert_eq!(delivery.message.name, "a");
    delivery.ack();
}

#[tokio::test]
async fn retry_requeues_to_the_tail_not_the_head() {
    let (queue, mut receiver) = InMemoryQueue::new();
    queue.send(msg("a")).await;
    queue.send(msg("b")).await;

    let first = receiver.recv().await.unwrap();
    assert_eq!(first.message.name, "a");
    first.retry();

    // "b" was already behind "a" in the channel, and the retried "a"
    // goes to the tail, so "b" is delivered before it comes back around.
    let second = receiver.recv().await.unwrap();
    assert_eq!(second.message.name, "b");
    second.ack();

    let retried = receiver.recv().await.unwrap();
    assert_eq!(retried.message.name, "a");
    retried.ack();
}

#[tokio::test]
async fn cloned_senders_keep_delivering_after_the_original_is_dropped() {
    let (queue, mut receiver) = InMemoryQueue::new();
    let clone = queue.clone();
    drop(queue);
    clone.send(msg("a")).await;
    assert_eq!(receiver.recv().await.unwrap().message.name, "a");
}
