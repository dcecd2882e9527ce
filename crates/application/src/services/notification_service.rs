use std::sync::Arc;

use domain::{
    DomainError, NewNotification, Notification, NotificationId, NotificationRepository, UserId,
};

use crate::{clock::Clock, error::ApplicationError};

pub struct NotificationServiceDependencies {
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct NotificationService {
    deps: NotificationServiceDependencies,
}

impl NotificationService {
    pub fn new(deps: NotificationServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create(
        &self,
        user_id: UserId,
        message: impl Into<String>,
    ) -> Result<Notification, ApplicationError> {
        let notification = NewNotification::new(user_id, message, self.deps.clock.now());
        Ok(self
            .deps
            .notification_repository
            .create(notification)
            .await?)
    }

    /// 按创建时间倒序
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Notification>, ApplicationError> {
        Ok(self
            .deps
            .notification_repository
            .list_for_user(user_id)
            .await?)
    }

    /// 通知不存在或不属于请求者时一律返回 NotFound
    pub async fn mark_read(
        &self,
        user_id: UserId,
        notification_id: NotificationId,
    ) -> Result<Notification, ApplicationError> {
        let repository = &self.deps.notification_repository;
        match repository.find_by_id(notification_id).await? {
            Some(notification) if notification.is_owned_by(user_id) => {
                Ok(repository.mark_read(notification_id).await?)
            }
            _ => Err(DomainError::not_found("notification").into()),
        }
    }
}
