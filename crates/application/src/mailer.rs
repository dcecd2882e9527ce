use async_trait::async_trait;
use domain::UserEmail;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

impl MailerError {
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery(message.into())
    }
}

/// 发送邮箱确认链接的外部协作方
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfirmationMailer: Send + Sync {
    async fn send_confirmation(&self, email: &UserEmail, token: &str) -> Result<(), MailerError>;
}
