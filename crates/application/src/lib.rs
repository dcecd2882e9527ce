//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、事务边界、
//! 以及对外部适配器（例如密码哈希、确认邮件、消息广播）的抽象。

pub mod broadcaster;
pub mod clock;
pub mod dto;
pub mod error;
pub mod mailer;
pub mod memory;
pub mod password;
pub mod services;
pub mod token;

pub use broadcaster::{BroadcastError, MessageBroadcast, MessageBroadcaster};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dto::{
    ApplicantDto, ChatMessageDto, ConfirmOutcome, JobDetail, LoginResult, NotificationDto,
    ProfileView, RegisterResult,
};
pub use error::ApplicationError;
pub use mailer::{ConfirmationMailer, MailerError};
pub use memory::InMemoryStore;
pub use password::{PasswordHasher, PasswordHasherError};
pub use services::{
    AuthService, AuthServiceDependencies, ChatService, ChatServiceDependencies, JobService,
    JobServiceDependencies, NotificationService, NotificationServiceDependencies, ProfileService,
    ProfileServiceDependencies,
};
pub use token::{TokenError, TokenKind, TokenService, TokenSettings};
