//! 通知实体定义

use serde::{Deserialize, Serialize};

use crate::value_objects::{NotificationId, Timestamp, UserId};

/// 通知实体，创建后只允许修改已读标记
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub message: String,
    pub is_read: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: UserId,
    pub message: String,
    pub created_at: Timestamp,
}

impl NewNotification {
    pub fn new(user_id: UserId, message: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            user_id,
            message: message.into(),
            created_at,
        }
    }

    pub fn into_notification(self, id: NotificationId) -> Notification {
        Notification {
            id,
            user_id: self.user_id,
            message: self.message,
            is_read: false,
            created_at: self.created_at,
        }
    }
}

impl Notification {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    pub fn mark_as_read(&mut self) {
        self.is_read = true;
    }
}
