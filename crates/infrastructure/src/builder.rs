use std::sync::Arc;

use application::{ConfirmationMailer, InMemoryStore, MailerError, PasswordHasher};
use config::AppConfig;
use domain::{
    JobRepository, MessageRepository, NotificationRepository, ProfileRepository, UserRepository,
};
use sqlx::PgPool;
use thiserror::Error;

use crate::{
    broadcast::InMemoryRoomHub,
    mailer::mailer_from_config,
    migrations::MIGRATOR,
    password::BcryptPasswordHasher,
    repository::{create_pg_pool, PgStorage},
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("mailer error: {0}")]
    Mailer(#[from] MailerError),
}

/// 组装好的外部适配器，由 `main` 注入到各个服务
#[derive(Clone)]
pub struct Infrastructure {
    pub user_repository: Arc<dyn UserRepository>,
    pub profile_repository: Arc<dyn ProfileRepository>,
    pub job_repository: Arc<dyn JobRepository>,
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub mailer: Arc<dyn ConfirmationMailer>,
    pub hub: Arc<InMemoryRoomHub>,
    /// 内存后端时为空
    pub pool: Option<PgPool>,
}

impl Infrastructure {
    /// 按 `database.url` 选择 PostgreSQL 或内存存储
    pub async fn connect(config: &AppConfig) -> Result<Self, InfrastructureError> {
        if config.uses_memory_storage() {
            tracing::warn!("使用内存存储，进程退出后数据丢失");
            return Self::in_memory(config);
        }

        let pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;
        MIGRATOR.run(&pool).await?;
        tracing::info!(database = %config.sanitized_database_url(), "数据库迁移完成");

        let storage = PgStorage::new(pool.clone());
        Ok(Self {
            user_repository: storage.user_repository,
            profile_repository: storage.profile_repository,
            job_repository: storage.job_repository,
            notification_repository: storage.notification_repository,
            message_repository: storage.message_repository,
            password_hasher: Arc::new(BcryptPasswordHasher::new(config.auth.bcrypt_cost)),
            mailer: mailer_from_config(&config.mail)?,
            hub: Arc::new(InMemoryRoomHub::new(config.broadcast.capacity)),
            pool: Some(pool),
        })
    }

    pub fn in_memory(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let store = InMemoryStore::new();
        Ok(Self {
            user_repository: Arc::new(store.clone()),
            profile_repository: Arc::new(store.clone()),
            job_repository: Arc::new(store.clone()),
            notification_repository: Arc::new(store.clone()),
            message_repository: Arc::new(store),
            password_hasher: Arc::new(BcryptPasswordHasher::new(config.auth.bcrypt_cost)),
            mailer: mailer_from_config(&config.mail)?,
            hub: Arc::new(InMemoryRoomHub::new(config.broadcast.capacity)),
            pool: None,
        })
    }
}
