//! 内存存储后端
//!
//! 所有表共享一把读写锁，多表写入（申请加通知、资料保存）在同一次加锁内完成，
//! 与数据库事务的效果一致。用于开发环境（`memory://`）和测试。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    constraints, Education, EducationId, Experience, ExperienceId, Job, JobApplication,
    JobApplicationId, JobId, JobRepository, Message, MessageId, MessageRepository, NewJob,
    NewJobApplication, NewMessage, NewNotification, NewUser, Notification, NotificationId,
    NotificationRepository, ProfileRepository, ProfileSave, RecordWrite, RepositoryError,
    RepositoryResult, User, UserEmail, UserId, UserRepository, Username,
};
use tokio::sync::RwLock;

#[derive(Default)]
struct Sequences {
    user: i64,
    education: i64,
    experience: i64,
    job: i64,
    application: i64,
    notification: i64,
    message: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct MemoryState {
    seq: Sequences,
    users: BTreeMap<UserId, User>,
    education: BTreeMap<EducationId, Education>,
    experience: BTreeMap<ExperienceId, Experience>,
    jobs: BTreeMap<JobId, Job>,
    applications: BTreeMap<JobApplicationId, JobApplication>,
    notifications: BTreeMap<NotificationId, Notification>,
    messages: Vec<Message>,
}

impl MemoryState {
    fn check_user_unique(
        &self,
        user_id: Option<UserId>,
        email: &UserEmail,
        name: &Username,
    ) -> RepositoryResult<()> {
        for existing in self.users.values() {
            if Some(existing.id) == user_id {
                continue;
            }
            if existing.email == *email {
                return Err(RepositoryError::conflict(constraints::USERS_EMAIL));
            }
            if existing.username == *name {
                return Err(RepositoryError::conflict(constraints::USERS_NAME));
            }
        }
        Ok(())
    }

    fn require_user(&self, user_id: UserId) -> RepositoryResult<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(RepositoryError::storage(format!(
                "foreign key violation: user {user_id} does not exist"
            )))
        }
    }

    fn store_user(&mut self, user: User) -> RepositoryResult<User> {
        if !self.users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        self.check_user_unique(Some(user.id), &user.email, &user.username)?;
        self.users.insert(user.id, user.clone());
        Ok(user)
    }
}

/// 内存实现，克隆后共享同一份数据
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: NewUser) -> RepositoryResult<User> {
        let mut state = self.state.write().await;
        state.check_user_unique(None, &user.email, &user.username)?;
        let id = UserId::new(next(&mut state.seq.user));
        let stored = user.into_user(id);
        state.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, user: User) -> RepositoryResult<User> {
        self.state.write().await.store_user(user)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &UserEmail) -> RepositoryResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == *email).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> RepositoryResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == *username).cloned())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn list_education(&self, user_id: UserId) -> RepositoryResult<Vec<Education>> {
        let state = self.state.read().await;
        Ok(state
            .education
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_experience(&self, user_id: UserId) -> RepositoryResult<Vec<Experience>> {
        let state = self.state.read().await;
        Ok(state
            .experience
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_education(&self, id: EducationId) -> RepositoryResult<Option<Education>> {
        Ok(self.state.read().await.education.get(&id).cloned())
    }

    async fn find_experience(&self, id: ExperienceId) -> RepositoryResult<Option<Experience>> {
        Ok(self.state.read().await.experience.get(&id).cloned())
    }

    async fn save_profile(&self, save: ProfileSave) -> RepositoryResult<User> {
        let mut guard = self.state.write().await;
        // 先在副本上完成全部写入，任一步失败则整体丢弃
        let mut draft = MemoryState {
            seq: Sequences {
                education: guard.seq.education,
                experience: guard.seq.experience,
                ..Sequences::default()
            },
            users: guard.users.clone(),
            education: guard.education.clone(),
            experience: guard.experience.clone(),
            ..MemoryState::default()
        };

        let user = draft.store_user(save.user)?;
        for write in save.education {
            match write {
                RecordWrite::Create(record) => {
                    let id = EducationId::new(next(&mut draft.seq.education));
                    draft.education.insert(id, record.into_education(id));
                }
                RecordWrite::Update(record) => {
                    if !draft.education.contains_key(&record.id) {
                        return Err(RepositoryError::NotFound);
                    }
                    draft.education.insert(record.id, record);
                }
            }
        }
        for write in save.experience {
            match write {
                RecordWrite::Create(record) => {
                    let id = ExperienceId::new(next(&mut draft.seq.experience));
                    draft.experience.insert(id, record.into_experience(id));
                }
                RecordWrite::Update(record) => {
                    if !draft.experience.contains_key(&record.id) {
                        return Err(RepositoryError::NotFound);
                    }
                    draft.experience.insert(record.id, record);
                }
            }
        }

        guard.users = draft.users;
        guard.education = draft.education;
        guard.experience = draft.experience;
        guard.seq.education = draft.seq.education;
        guard.seq.experience = draft.seq.experience;
        Ok(user)
    }

    async fn delete_education(&self, id: EducationId) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        state
            .education
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete_experience(&self, id: ExperienceId) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        state
            .experience
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl JobRepository for InMemoryStore {
    async fn create(&self, job: NewJob) -> RepositoryResult<Job> {
        let mut state = self.state.write().await;
        state.require_user(job.author_id)?;
        let id = JobId::new(next(&mut state.seq.job));
        let stored = job.into_job(id);
        state.jobs.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: JobId) -> RepositoryResult<Option<Job>> {
        Ok(self.state.read().await.jobs.get(&id).cloned())
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Job>> {
        Ok(self.state.read().await.jobs.values().cloned().collect())
    }

    async fn list_by_author(&self, author_id: UserId) -> RepositoryResult<Vec<Job>> {
        let state = self.state.read().await;
        Ok(state
            .jobs
            .values()
            .filter(|job| job.is_authored_by(author_id))
            .cloned()
            .collect())
    }

    async fn search(&self, query: &str) -> RepositoryResult<Vec<Job>> {
        let state = self.state.read().await;
        Ok(state
            .jobs
            .values()
            .filter(|job| job.matches(query))
            .cloned()
            .collect())
    }

    async fn find_application(
        &self,
        job_id: JobId,
        user_id: UserId,
    ) -> RepositoryResult<Option<JobApplication>> {
        let state = self.state.read().await;
        Ok(state
            .applications
            .values()
            .find(|a| a.job_id == job_id && a.user_id == user_id)
            .cloned())
    }

    async fn list_applications(&self, job_id: JobId) -> RepositoryResult<Vec<JobApplication>> {
        let state = self.state.read().await;
        Ok(state
            .applications
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn create_application_with_notification(
        &self,
        application: NewJobApplication,
        notification: NewNotification,
    ) -> RepositoryResult<(JobApplication, Notification)> {
        let mut state = self.state.write().await;
        if !state.jobs.contains_key(&application.job_id) {
            return Err(RepositoryError::storage(format!(
                "foreign key violation: job {} does not exist",
                application.job_id
            )));
        }
        state.require_user(application.user_id)?;
        state.require_user(notification.user_id)?;
        let duplicate = state
            .applications
            .values()
            .any(|a| a.job_id == application.job_id && a.user_id == application.user_id);
        if duplicate {
            return Err(RepositoryError::conflict(constraints::JOB_APPLICATION_UNIQUE));
        }

        let application_id = JobApplicationId::new(next(&mut state.seq.application));
        let application = application.into_application(application_id);
        let notification_id = NotificationId::new(next(&mut state.seq.notification));
        let notification = notification.into_notification(notification_id);

        state.applications.insert(application_id, application.clone());
        state.notifications.insert(notification_id, notification.clone());
        Ok((application, notification))
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn create(&self, notification: NewNotification) -> RepositoryResult<Notification> {
        let mut state = self.state.write().await;
        state.require_user(notification.user_id)?;
        let id = NotificationId::new(next(&mut state.seq.notification));
        let stored = notification.into_notification(id);
        state.notifications.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Notification>> {
        let state = self.state.read().await;
        let mut items: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| n.is_owned_by(user_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn find_by_id(&self, id: NotificationId) -> RepositoryResult<Option<Notification>> {
        Ok(self.state.read().await.notifications.get(&id).cloned())
    }

    async fn mark_read(&self, id: NotificationId) -> RepositoryResult<Notification> {
        let mut state = self.state.write().await;
        let notification = state
            .notifications
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        notification.mark_as_read();
        Ok(notification.clone())
    }
}

#[async_trait]
impl MessageRepository for InMemoryStore {
    async fn append(&self, message: NewMessage) -> RepositoryResult<Message> {
        let mut state = self.state.write().await;
        state.require_user(message.sender_id)?;
        state.require_user(message.receiver_id)?;
        let id = MessageId::new(next(&mut state.seq.message));
        let stored = message.into_message(id);
        state.messages.push(stored.clone());
        Ok(stored)
    }

    async fn history(&self, a: UserId, b: UserId) -> RepositoryResult<Vec<Message>> {
        let state = self.state.read().await;
        let mut items: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.is_between(a, b))
            .cloned()
            .collect();
        items.sort_by(|x, y| x.created_at.cmp(&y.created_at).then(x.id.cmp(&y.id)));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{MessageContent, PasswordHash, UserRole};

    async fn user(store: &InMemoryStore, name: &str) -> User {
        UserRepository::create(
            store,
            NewUser::register(
                Username::parse(name).unwrap(),
                UserEmail::parse(format!("{name}@example.com")).unwrap(),
                PasswordHash::new("hash").unwrap(),
                UserRole::default(),
                Utc::now(),
            ),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_reports_constraint() {
        let store = InMemoryStore::new();
        user(&store, "alice").await;

        let err = UserRepository::create(
            &store,
            NewUser::register(
                Username::parse("other").unwrap(),
                UserEmail::parse("alice@example.com").unwrap(),
                PasswordHash::new("hash").unwrap(),
                UserRole::default(),
                Utc::now(),
            ),
        )
        .await
        .unwrap_err();

        assert_eq!(err, RepositoryError::conflict(constraints::USERS_EMAIL));
    }

    #[tokio::test]
    async fn message_for_unknown_user_is_rejected() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;

        let result = store
            .append(NewMessage {
                sender_id: alice.id,
                receiver_id: UserId::new(999),
                content: MessageContent::new("hi").unwrap(),
                created_at: Utc::now(),
            })
            .await;

        assert!(matches!(result, Err(RepositoryError::Storage { .. })));
    }

    #[tokio::test]
    async fn failed_profile_save_leaves_state_untouched() {
        let store = InMemoryStore::new();
        let mut alice = user(&store, "alice").await;
        alice.profile.job = Some("Engineer".into());

        let missing = Education {
            id: EducationId::new(77),
            user_id: alice.id,
            degree: "BSc".into(),
            field: "CS".into(),
            start_date: chrono::NaiveDate::from_ymd_opt(2010, 9, 1).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2014, 6, 1).unwrap(),
            school_name: "Uni".into(),
        };
        let result = store
            .save_profile(ProfileSave {
                user: alice.clone(),
                education: vec![RecordWrite::Update(missing)],
                experience: vec![],
            })
            .await;

        assert_eq!(result, Err(RepositoryError::NotFound));
        let stored = UserRepository::find_by_id(&store, alice.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.profile.job, None);
    }
}
