use std::sync::Arc;

use domain::{
    DomainError, Message, MessageContent, MessageRepository, NewMessage, UserId, UserRepository,
};

use crate::{
    broadcaster::{MessageBroadcast, MessageBroadcaster},
    clock::Clock,
    error::ApplicationError,
};

#[derive(Debug, Clone)]
pub struct SendPrivateMessageRequest {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
}

pub struct ChatServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub broadcaster: Arc<dyn MessageBroadcaster>,
    pub clock: Arc<dyn Clock>,
}

/// 私信发送与历史查询
pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    /// 先持久化再广播。持久化失败直接返回错误；广播失败只记录日志
    pub async fn send_private_message(
        &self,
        request: SendPrivateMessageRequest,
    ) -> Result<Message, ApplicationError> {
        let content = MessageContent::new(request.content)?;
        if request.sender_id == request.receiver_id {
            return Err(DomainError::validation_error(
                "receiver_id",
                "cannot message yourself",
            )
            .into());
        }

        self.deps
            .user_repository
            .find_by_id(request.receiver_id)
            .await?
            .ok_or(DomainError::not_found("receiver"))?;

        let stored = self
            .deps
            .message_repository
            .append(NewMessage {
                sender_id: request.sender_id,
                receiver_id: request.receiver_id,
                content,
                created_at: self.deps.clock.now(),
            })
            .await?;

        let room = stored.room();
        match self
            .deps
            .broadcaster
            .broadcast(MessageBroadcast::private_message(stored.clone()))
            .await
        {
            Ok(delivered) => {
                tracing::debug!(room = %room, message_id = %stored.id, delivered, "私信已广播");
            }
            Err(broadcast_error) => {
                tracing::warn!(
                    room = %room,
                    message_id = %stored.id,
                    error = %broadcast_error,
                    "消息已保存，但广播失败"
                );
            }
        }

        Ok(stored)
    }

    /// 两人之间的完整对话，按创建时间升序
    pub async fn history(
        &self,
        user_id: UserId,
        other_id: UserId,
    ) -> Result<Vec<Message>, ApplicationError> {
        Ok(self
            .deps
            .message_repository
            .history(user_id, other_id)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::{
        clock::ManualClock,
        memory::InMemoryStore,
        services::test_support::{seed_user, RecordingBroadcaster},
    };

    struct Harness {
        service: ChatService,
        store: InMemoryStore,
        broadcaster: Arc<RecordingBroadcaster>,
        clock: Arc<ManualClock>,
    }

    fn harness(broadcaster: RecordingBroadcaster) -> Harness {
        let store = InMemoryStore::new();
        let broadcaster = Arc::new(broadcaster);
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        ));
        let service = ChatService::new(ChatServiceDependencies {
            user_repository: Arc::new(store.clone()),
            message_repository: Arc::new(store.clone()),
            broadcaster: broadcaster.clone(),
            clock: clock.clone(),
        });
        Harness {
            service,
            store,
            broadcaster,
            clock,
        }
    }

    fn request(from: UserId, to: UserId, text: &str) -> SendPrivateMessageRequest {
        SendPrivateMessageRequest {
            sender_id: from,
            receiver_id: to,
            content: text.into(),
        }
    }

    #[tokio::test]
    async fn history_merges_both_directions_in_order() {
        let h = harness(RecordingBroadcaster::default());
        let one = seed_user(&h.store, "one").await;
        let two = seed_user(&h.store, "two").await;

        h.service
            .send_private_message(request(one.id, two.id, "hi"))
            .await
            .unwrap();
        h.clock.advance(Duration::seconds(1));
        h.service
            .send_private_message(request(two.id, one.id, "hello"))
            .await
            .unwrap();

        for (a, b) in [(one.id, two.id), (two.id, one.id)] {
            let history = h.service.history(a, b).await.unwrap();
            let summary: Vec<(UserId, &str)> = history
                .iter()
                .map(|m| (m.sender_id, m.content.as_str()))
                .collect();
            assert_eq!(summary, vec![(one.id, "hi"), (two.id, "hello")]);
        }
    }

    #[tokio::test]
    async fn equal_timestamps_keep_insertion_order() {
        let h = harness(RecordingBroadcaster::default());
        let one = seed_user(&h.store, "one").await;
        let two = seed_user(&h.store, "two").await;

        for i in 0..5 {
            let (from, to) = if i % 2 == 0 { (one.id, two.id) } else { (two.id, one.id) };
            h.service
                .send_private_message(request(from, to, &format!("m{i}")))
                .await
                .unwrap();
        }

        let history = h.service.history(one.id, two.id).await.unwrap();
        let texts: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["m0", "m1", "m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn sent_message_is_broadcast_to_symmetric_room() {
        let h = harness(RecordingBroadcaster::default());
        let one = seed_user(&h.store, "one").await;
        let two = seed_user(&h.store, "two").await;

        let stored = h
            .service
            .send_private_message(request(two.id, one.id, "ping"))
            .await
            .unwrap();

        let sent = h.broadcaster.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].room.to_string(), format!("chat_{}_{}", one.id, two.id));
        assert_eq!(sent[0].message, stored);
        assert_eq!(stored.created_at, h.clock.now());
    }

    #[tokio::test]
    async fn broadcast_failure_does_not_abort_persistence() {
        let h = harness(RecordingBroadcaster::failing());
        let one = seed_user(&h.store, "one").await;
        let two = seed_user(&h.store, "two").await;

        let result = h
            .service
            .send_private_message(request(one.id, two.id, "still saved"))
            .await;

        assert!(result.is_ok());
        assert_eq!(h.service.history(one.id, two.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_unknown_receiver_and_empty_content() {
        let h = harness(RecordingBroadcaster::default());
        let one = seed_user(&h.store, "one").await;
        let two = seed_user(&h.store, "two").await;

        let err = h
            .service
            .send_private_message(request(one.id, UserId::new(404), "hi"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::NotFound { .. })
        ));

        let err = h
            .service
            .send_private_message(request(one.id, two.id, "   "))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::ValidationError { .. })
        ));
        assert!(h.broadcaster.sent().is_empty());
    }
}
