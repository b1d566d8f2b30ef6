// ============================
// chatroom-backend-lib/src/store.rs
// ============================
//! Message store abstraction with an in-memory implementation.
use async_trait::async_trait;
use chatroom_common::Message;
use metrics::counter;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::AppError;

/// Trait for message store backends.
///
/// The log is append-only: messages are immutable once written and reads
/// never reorder them. A durable implementation may surface transient
/// failures as `Unavailable`; the in-memory one never does.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append one message to the log
    async fn append(&self, message: Message) -> Result<(), AppError>;

    /// Append a batch of messages as one atomic write
    async fn append_batch(&self, messages: Vec<Message>) -> Result<(), AppError>;

    /// Read every message visible to `reader`, in append order.
    ///
    /// `limit` keeps only the last `limit` visible messages; it must be a
    /// positive integer when present.
    async fn read_visible(
        &self,
        reader: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, AppError>;
}

fn validate(message: &Message) -> Result<(), AppError> {
    if message.from.is_empty() {
        return Err(AppError::Validation("message 'from' must be non-empty".to_string()));
    }
    if message.to.is_empty() {
        return Err(AppError::Validation("message 'to' must be non-empty".to_string()));
    }
    if message.text.is_empty() {
        return Err(AppError::Validation("message text must be non-empty".to_string()));
    }
    Ok(())
}

/// In-memory implementation of the `MessageStore` trait
#[derive(Clone, Default)]
pub struct InMemoryStore {
    log: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    /// Append one message. Writes take the write lock, so concurrent
    /// appends serialize and the log order is a valid serialization of
    /// the calls.
    async fn append(&self, message: Message) -> Result<(), AppError> {
        validate(&message)?;
        self.log.write().push(message);
        counter!("message.appended").increment(1);
        Ok(())
    }

    /// Append a batch under a single lock acquisition, so no reader sees
    /// a partially-written batch.
    async fn append_batch(&self, messages: Vec<Message>) -> Result<(), AppError> {
        if messages.is_empty() {
            return Ok(());
        }
        for message in &messages {
            validate(message)?;
        }
        let count = messages.len() as u64;
        self.log.write().extend(messages);
        counter!("message.appended").increment(count);
        Ok(())
    }

    async fn read_visible(
        &self,
        reader: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, AppError> {
        if let Some(limit) = limit {
            if limit <= 0 {
                return Err(AppError::Validation(format!(
                    "limit must be a positive integer, got {limit}"
                )));
            }
        }

        let log = self.log.read();
        let mut visible: Vec<Message> = log
            .iter()
            .filter(|message| message.visible_to(reader))
            .cloned()
            .collect();
        drop(log);

        if let Some(limit) = limit {
            let keep = limit as usize;
            if visible.len() > keep {
                visible.drain(..visible.len() - keep);
            }
        }
        Ok(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatroom_common::{MessageKind, BROADCAST_TARGET};

    fn broadcast(from: &str, text: &str) -> Message {
        Message::new(from, BROADCAST_TARGET, text, MessageKind::Broadcast)
    }

    fn private(from: &str, to: &str, text: &str) -> Message {
        Message::new(from, to, text, MessageKind::Private)
    }

    #[tokio::test]
    async fn append_rejects_empty_fields() {
        let store = InMemoryStore::new();

        let no_text = broadcast("Alice", "");
        assert!(matches!(
            store.append(no_text).await,
            Err(AppError::Validation(_))
        ));

        let no_to = Message::new("Alice", "", "hi", MessageKind::Private);
        assert!(matches!(
            store.append(no_to).await,
            Err(AppError::Validation(_))
        ));

        assert!(store.read_visible("Alice", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reads_preserve_append_order() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store.append(broadcast("Alice", &format!("msg {i}"))).await.unwrap();
        }

        let texts: Vec<_> = store
            .read_visible("Bob", None)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, ["msg 0", "msg 1", "msg 2", "msg 3", "msg 4"]);
    }

    #[tokio::test]
    async fn private_messages_are_filtered_per_reader() {
        let store = InMemoryStore::new();
        store.append(broadcast("Alice", "hi all")).await.unwrap();
        store.append(private("Alice", "Bob", "secret")).await.unwrap();

        let carol_view = store.read_visible("Carol", None).await.unwrap();
        assert_eq!(carol_view.len(), 1);
        assert_eq!(carol_view[0].text, "hi all");

        let bob_view = store.read_visible("Bob", None).await.unwrap();
        assert_eq!(bob_view.len(), 2);
        let alice_view = store.read_visible("Alice", None).await.unwrap();
        assert_eq!(alice_view.len(), 2);
    }

    #[tokio::test]
    async fn limit_keeps_the_most_recent_suffix() {
        let store = InMemoryStore::new();
        for i in 0..10 {
            store.append(broadcast("Alice", &format!("msg {i}"))).await.unwrap();
        }

        let unlimited = store.read_visible("Bob", None).await.unwrap();
        for k in 1..=12i64 {
            let limited = store.read_visible("Bob", Some(k)).await.unwrap();
            let expected_len = (k as usize).min(unlimited.len());
            assert_eq!(limited.len(), expected_len);
            let suffix = &unlimited[unlimited.len() - expected_len..];
            let suffix_texts: Vec<_> = suffix.iter().map(|m| m.text.clone()).collect();
            let limited_texts: Vec<_> = limited.iter().map(|m| m.text.clone()).collect();
            assert_eq!(limited_texts, suffix_texts);
        }
    }

    #[tokio::test]
    async fn limit_counts_visible_messages_not_raw_log_entries() {
        let store = InMemoryStore::new();
        store.append(private("Alice", "Bob", "one")).await.unwrap();
        store.append(broadcast("Alice", "two")).await.unwrap();
        store.append(private("Alice", "Bob", "three")).await.unwrap();
        store.append(broadcast("Alice", "four")).await.unwrap();

        // Carol sees only the two broadcasts; limit applies after filtering
        let carol_view = store.read_visible("Carol", Some(2)).await.unwrap();
        let texts: Vec<_> = carol_view.into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["two", "four"]);
    }

    #[tokio::test]
    async fn non_positive_limit_is_a_validation_error() {
        let store = InMemoryStore::new();
        store.append(broadcast("Alice", "hi")).await.unwrap();

        assert!(matches!(
            store.read_visible("Bob", Some(0)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            store.read_visible("Bob", Some(-1)).await,
            Err(AppError::Validation(_))
        ));
        // absent limit never fails on that basis
        assert!(store.read_visible("Bob", None).await.is_ok());
    }

    #[tokio::test]
    async fn empty_batch_appends_nothing() {
        let store = InMemoryStore::new();
        store.append_batch(Vec::new()).await.unwrap();
        assert!(store.read_visible("Bob", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_appends_are_never_lost() {
        let store = InMemoryStore::new();
        let mut tasks = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for j in 0..25 {
                    store
                        .append(broadcast("Alice", &format!("w{i} m{j}")))
                        .await
                        .unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let all = store.read_visible("Bob", None).await.unwrap();
        assert_eq!(all.len(), 200);
    }
}
