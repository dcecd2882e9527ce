//! 确认邮件发送
//!
//! `HttpRelayMailer` 把邮件以 JSON 形式提交给 HTTP 邮件中继；
//! 未配置中继时使用 `LogMailer`，只把确认链接写入日志（开发环境）。

use std::sync::Arc;
use std::time::Duration;

use application::{ConfirmationMailer, MailerError};
use async_trait::async_trait;
use config::MailConfig;
use domain::UserEmail;
use serde::Serialize;

const CONFIRMATION_SUBJECT: &str = "Please confirm your email";

fn confirmation_link(base: &str, token: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), token)
}

fn confirmation_body(link: &str) -> String {
    format!("Please click the link to confirm your email: {link}")
}

#[derive(Debug, Serialize)]
struct RelayMail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: String,
}

pub struct HttpRelayMailer {
    client: reqwest::Client,
    relay_url: String,
    sender: String,
    confirm_url_base: String,
}

impl HttpRelayMailer {
    pub fn new(
        relay_url: impl Into<String>,
        sender: impl Into<String>,
        confirm_url_base: impl Into<String>,
    ) -> Result<Self, MailerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| MailerError::delivery(err.to_string()))?;
        Ok(Self {
            client,
            relay_url: relay_url.into(),
            sender: sender.into(),
            confirm_url_base: confirm_url_base.into(),
        })
    }
}

#[async_trait]
impl ConfirmationMailer for HttpRelayMailer {
    async fn send_confirmation(&self, email: &UserEmail, token: &str) -> Result<(), MailerError> {
        let link = confirmation_link(&self.confirm_url_base, token);
        let mail = RelayMail {
            from: &self.sender,
            to: email.as_str(),
            subject: CONFIRMATION_SUBJECT,
            body: confirmation_body(&link),
        };

        self.client
            .post(&self.relay_url)
            .json(&mail)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| MailerError::delivery(err.to_string()))?;

        tracing::info!(email = %email, "确认邮件已提交给中继");
        Ok(())
    }
}

pub struct LogMailer {
    confirm_url_base: String,
}

impl LogMailer {
    pub fn new(confirm_url_base: impl Into<String>) -> Self {
        Self {
            confirm_url_base: confirm_url_base.into(),
        }
    }
}

#[async_trait]
impl ConfirmationMailer for LogMailer {
    async fn send_confirmation(&self, email: &UserEmail, token: &str) -> Result<(), MailerError> {
        let link = confirmation_link(&self.confirm_url_base, token);
        tracing::info!(email = %email, link = %link, "未配置邮件中继，确认链接仅记录在日志中");
        Ok(())
    }
}

/// 按配置选择邮件实现
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn ConfirmationMailer>, MailerError> {
    Ok(match &config.relay_url {
        Some(url) => Arc::new(HttpRelayMailer::new(
            url.clone(),
            config.sender.clone(),
            config.confirm_url_base.clone(),
        )?),
        None => Arc::new(LogMailer::new(config.confirm_url_base.clone())),
    })
}
