mod auth_service;
mod chat_service;
mod job_service;
mod notification_service;
mod profile_service;

#[cfg(test)]
mod test_support;

pub use auth_service::{AuthService, AuthServiceDependencies, LoginRequest, RegisterRequest};
pub use chat_service::{ChatService, ChatServiceDependencies, SendPrivateMessageRequest};
pub use job_service::{ApplyRequest, CreateJobRequest, JobService, JobServiceDependencies};
pub use notification_service::{NotificationService, NotificationServiceDependencies};
pub use profile_service::{
    EducationInput, ExperienceInput, ProfileService, ProfileServiceDependencies, RecordKind,
    UpdateProfileRequest,
};
