//! 基础设施层实现。
//!
//! 提供数据库仓储、密码哈希、房间广播、确认邮件等适配器，实现应用/领域层定义的接口。

pub mod broadcast;
pub mod builder;
pub mod mailer;
pub mod migrations;
pub mod password;
pub mod repository;

pub use broadcast::{ConnectionId, HubError, InMemoryRoomHub};
pub use builder::{Infrastructure, InfrastructureError};
pub use mailer::{mailer_from_config, HttpRelayMailer, LogMailer};
pub use migrations::MIGRATOR;
pub use password::BcryptPasswordHasher;
pub use repository::{
    create_pg_pool, PgJobRepository, PgMessageRepository, PgNotificationRepository,
    PgProfileRepository, PgStorage, PgUserRepository,
};
