#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use application::{ConfirmationMailer, MailerError, SystemClock};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use config::{AppConfig, MEMORY_DATABASE_URL};
use domain::UserEmail;
use infrastructure::Infrastructure;
use serde_json::{json, Value};
use tower::ServiceExt;
use web_api::{router, AppState};

/// 记录确认令牌，代替真实邮件
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn token_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ConfirmationMailer for RecordingMailer {
    async fn send_confirmation(&self, email: &UserEmail, token: &str) -> Result<(), MailerError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.as_str().to_owned(), token.to_owned()));
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = MEMORY_DATABASE_URL.to_owned();
    config.auth.bcrypt_cost = Some(4);
    config
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

pub fn spawn_app() -> TestApp {
    let config = test_config();
    let mut infra = Infrastructure::in_memory(&config).expect("in-memory infrastructure");
    let mailer = Arc::new(RecordingMailer::default());
    infra.mailer = mailer.clone();

    let state = AppState::new(infra, &config, Arc::new(SystemClock));
    TestApp {
        router: router(state.clone(), &config.server.cors_origins),
        state,
        mailer,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn register(&self, name: &str) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/register",
                Some(json!({
                    "username": name,
                    "email": format!("{name}@example.com"),
                    "password": "secret-password",
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {name}: {body}");
        body["user_id"].as_i64().expect("user_id")
    }

    pub async fn login(&self, name: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/login",
                Some(json!({
                    "email": format!("{name}@example.com"),
                    "password": "secret-password",
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {name}: {body}");
        body["access_token"].as_str().expect("token").to_owned()
    }

    /// 注册并登录，返回 (user_id, access_token)
    pub async fn sign_up(&self, name: &str) -> (i64, String) {
        let id = self.register(name).await;
        (id, self.login(name).await)
    }
}
