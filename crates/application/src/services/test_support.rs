//! 服务测试共用的替身实现

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use domain::{NewUser, PasswordHash, User, UserEmail, UserRepository, UserRole, Username};

use crate::{
    broadcaster::{BroadcastError, MessageBroadcast, MessageBroadcaster},
    memory::InMemoryStore,
    password::{PasswordHasher, PasswordHasherError},
};

/// 可逆的假哈希，只用于测试
pub struct PlainPasswordHasher;

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("plain:{plaintext}"))
            .map_err(|err| PasswordHasherError::hash_error(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hashed.as_str() == format!("plain:{plaintext}"))
    }
}

/// 记录所有广播，可配置为总是失败
#[derive(Default)]
pub struct RecordingBroadcaster {
    pub sent: Mutex<Vec<MessageBroadcast>>,
    pub fail: bool,
}

impl RecordingBroadcaster {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<MessageBroadcast> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageBroadcaster for RecordingBroadcaster {
    async fn broadcast(&self, payload: MessageBroadcast) -> Result<usize, BroadcastError> {
        if self.fail {
            return Err(BroadcastError::failed("hub unavailable"));
        }
        self.sent.lock().unwrap().push(payload);
        Ok(1)
    }
}

pub async fn seed_user(store: &InMemoryStore, name: &str) -> User {
    UserRepository::create(
        store,
        NewUser::register(
            Username::parse(name).unwrap(),
            UserEmail::parse(format!("{name}@example.com")).unwrap(),
            PasswordHash::new("plain:secret").unwrap(),
            UserRole::default(),
            Utc::now(),
        ),
    )
    .await
    .unwrap()
}
