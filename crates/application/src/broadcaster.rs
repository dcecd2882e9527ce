use async_trait::async_trait;
use domain::{Message, RoomName};
use thiserror::Error;

/// 发往某个房间的一条实时消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBroadcast {
    pub room: RoomName,
    pub message: Message,
}

impl MessageBroadcast {
    pub fn private_message(message: Message) -> Self {
        Self {
            room: message.room(),
            message,
        }
    }
}

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[async_trait]
pub trait MessageBroadcaster: Send + Sync {
    /// 发给当前已加入房间的连接，返回成功入队的连接数
    async fn broadcast(&self, payload: MessageBroadcast) -> Result<usize, BroadcastError>;
}
