//! 私信实体定义
//!
//! 私信只追加，不修改也不删除。

use serde::{Deserialize, Serialize};

use crate::room::RoomName;
use crate::value_objects::{MessageContent, MessageId, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: MessageContent,
    /// 目前没有任何读取方使用
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// 待持久化的私信，`created_at` 由发送方服务在写入时分配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: MessageContent,
    pub created_at: Timestamp,
}

impl NewMessage {
    pub fn into_message(self, id: MessageId) -> Message {
        Message {
            id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            content: self.content,
            is_read: false,
            created_at: self.created_at,
        }
    }
}

impl Message {
    pub fn room(&self) -> RoomName {
        RoomName::between(self.sender_id, self.receiver_id)
    }

    /// 是否属于这两位用户之间的对话（任一方向）
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}
