//! 存储层接口
//!
//! 内层定义接口，PostgreSQL 与内存实现位于外层。

use async_trait::async_trait;

use crate::entities::{
    Education, EducationWrite, Experience, ExperienceWrite, Job, JobApplication, Message, NewJob,
    NewJobApplication, NewMessage, NewNotification, NewUser, Notification, User,
};
use crate::errors::RepositoryResult;
use crate::value_objects::{
    EducationId, ExperienceId, JobId, NotificationId, UserEmail, UserId, Username,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 邮箱或用户名冲突时返回带约束名的 `Conflict`
    async fn create(&self, user: NewUser) -> RepositoryResult<User>;
    async fn update(&self, user: User) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: &UserEmail) -> RepositoryResult<Option<User>>;
    async fn find_by_username(&self, username: &Username) -> RepositoryResult<Option<User>>;
    async fn find_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<User>>;
}

/// 一次资料保存涉及的全部写入
#[derive(Debug, Clone)]
pub struct ProfileSave {
    pub user: User,
    pub education: Vec<EducationWrite>,
    pub experience: Vec<ExperienceWrite>,
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn list_education(&self, user_id: UserId) -> RepositoryResult<Vec<Education>>;
    async fn list_experience(&self, user_id: UserId) -> RepositoryResult<Vec<Experience>>;
    async fn find_education(&self, id: EducationId) -> RepositoryResult<Option<Education>>;
    async fn find_experience(&self, id: ExperienceId) -> RepositoryResult<Option<Experience>>;

    /// 在同一事务中更新用户字段并写入子记录
    async fn save_profile(&self, save: ProfileSave) -> RepositoryResult<User>;

    async fn delete_education(&self, id: EducationId) -> RepositoryResult<()>;
    async fn delete_experience(&self, id: ExperienceId) -> RepositoryResult<()>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: NewJob) -> RepositoryResult<Job>;
    async fn find_by_id(&self, id: JobId) -> RepositoryResult<Option<Job>>;
    async fn list_all(&self) -> RepositoryResult<Vec<Job>>;
    async fn list_by_author(&self, author_id: UserId) -> RepositoryResult<Vec<Job>>;
    /// 标题或关键词的大小写不敏感子串匹配
    async fn search(&self, query: &str) -> RepositoryResult<Vec<Job>>;
    async fn find_application(
        &self,
        job_id: JobId,
        user_id: UserId,
    ) -> RepositoryResult<Option<JobApplication>>;
    async fn list_applications(&self, job_id: JobId) -> RepositoryResult<Vec<JobApplication>>;

    /// 申请与给作者的通知要么同时写入，要么都不写入
    async fn create_application_with_notification(
        &self,
        application: NewJobApplication,
        notification: NewNotification,
    ) -> RepositoryResult<(JobApplication, Notification)>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: NewNotification) -> RepositoryResult<Notification>;
    /// 按创建时间倒序
    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Notification>>;
    async fn find_by_id(&self, id: NotificationId) -> RepositoryResult<Option<Notification>>;
    async fn mark_read(&self, id: NotificationId) -> RepositoryResult<Notification>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn append(&self, message: NewMessage) -> RepositoryResult<Message>;
    /// 双向合并，按 `(created_at, id)` 升序
    async fn history(&self, a: UserId, b: UserId) -> RepositoryResult<Vec<Message>>;
}
