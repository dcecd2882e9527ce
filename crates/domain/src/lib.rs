//! 求职招聘平台核心领域模型
//!
//! 包含用户、职位、申请、通知、私信等实体，以及相关的值对象和业务规则。

pub mod entities;
pub mod errors;
pub mod repository;
pub mod room;
pub mod value_objects;

pub use entities::*;
pub use errors::{constraints, DomainError, DomainResult, RepositoryError, RepositoryResult};
pub use repository::{
    JobRepository, MessageRepository, NotificationRepository, ProfileRepository, ProfileSave,
    UserRepository,
};
pub use room::RoomName;
pub use value_objects::*;
