// 进程内广播器实现
use std::pin::Pin;

use async_trait::async_trait;
use domain::UserId;
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use crate::broadcaster::{BroadcastError, MessageBroadcaster, MessageCreated};

pub type MessageStream = Pin<Box<dyn Stream<Item = MessageCreated> + Send>>;

#[derive(Clone)]
pub struct LocalMessageBroadcaster {
    sender: broadcast::Sender<MessageCreated>,
}

impl LocalMessageBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 订阅与 `user_id` 相关的新消息（作为发送者或接收者）
    pub fn subscribe(&self, user_id: UserId) -> MessageStream {
        let stream = BroadcastStream::new(self.sender.subscribe()).filter_map(move |item| {
            let visible = match item {
                Ok(event) if event.is_visible_to(user_id) => Some(event),
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = %user_id, skipped, "订阅者处理过慢，丢弃了部分消息事件");
                    None
                }
            };
            async move { visible }
        });
        Box::pin(stream)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LocalMessageBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl MessageBroadcaster for LocalMessageBroadcaster {
    async fn broadcast(&self, event: MessageCreated) -> Result<(), BroadcastError> {
        if self.sender.receiver_count() == 0 {
            return Ok(());
        }
        self.sender
            .send(event)
            .map_err(|err| BroadcastError::failed(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use domain::{ChatroomId, Message, MessageContent, MessageId};

    use super::*;

    fn event(sender: UserId, receiver: UserId, text: &str) -> MessageCreated {
        MessageCreated::new(Message {
            id: MessageId::generate(),
            chatroom_id: ChatroomId::generate(),
            sender_id: sender,
            receiver_id: receiver,
            content: MessageContent::new(text).unwrap(),
            created_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn subscribers_only_see_their_own_conversations() {
        let broadcaster = LocalMessageBroadcaster::new(16);
        let alice = UserId::generate();
        let bob = UserId::generate();
        let carol = UserId::generate();

        let mut alice_stream = broadcaster.subscribe(alice);
        let mut bob_stream = broadcaster.subscribe(bob);
        let mut carol_stream = broadcaster.subscribe(carol);

        broadcaster.broadcast(event(alice, bob, "hi bob")).await.unwrap();

        let seen_by_alice = alice_stream.next().await.unwrap();
        let seen_by_bob = bob_stream.next().await.unwrap();
        assert_eq!(seen_by_alice.message.content.as_str(), "hi bob");
        assert_eq!(seen_by_bob, seen_by_alice);

        let carol_next = tokio::time::timeout(Duration::from_millis(50), carol_stream.next()).await;
        assert!(carol_next.is_err(), "carol must not receive alice/bob traffic");
    }

    #[tokio::test]
    async fn broadcasting_without_subscribers_is_ok() {
        let broadcaster = LocalMessageBroadcaster::new(4);
        let result = broadcaster
            .broadcast(event(UserId::generate(), UserId::generate(), "nobody listening"))
            .await;
        assert!(result.is_ok());
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
