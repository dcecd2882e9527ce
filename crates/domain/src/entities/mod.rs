//! 领域实体定义
//!
//! 用户、职位、申请、通知、私信等核心实体。

pub mod job;
pub mod message;
pub mod notification;
pub mod profile;
pub mod user;

pub use job::{Job, JobApplication, NewJob, NewJobApplication};
pub use message::{Message, NewMessage};
pub use notification::{NewNotification, Notification};
pub use profile::{
    Education, EducationWrite, Experience, ExperienceWrite, NewEducation, NewExperience,
    RecordWrite,
};
pub use user::{NewUser, ProfileChanges, User, UserProfile};
