use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{
    Education, EducationId, Experience, ExperienceId, Job, JobApplication, JobApplicationId,
    JobId, JobRepository, Message, MessageContent, MessageId, MessageRepository, NewJob,
    NewJobApplication, NewMessage, NewNotification, NewUser, Notification, NotificationId,
    NotificationRepository, PasswordHash, ProfileRepository, ProfileSave, RecordWrite,
    RepositoryError, RepositoryResult, Timestamp, User, UserEmail, UserId, UserProfile,
    UserRepository, UserRole, Username,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, Transaction};

/// 唯一约束冲突携带约束名，其余错误统一视为存储错误
fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::conflict(db_err.constraint().unwrap_or_default())
        }
        _ => RepositoryError::storage(err.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

/// ILIKE 子串匹配模式，转义通配符
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, is_confirmed, job, phone, \
     address, resume_file, cover_letter, company_name, re_coins, total_money, created_at";

#[derive(Debug, FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    is_confirmed: bool,
    job: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    resume_file: Option<String>,
    cover_letter: Option<String>,
    company_name: Option<String>,
    re_coins: Option<i32>,
    total_money: Option<i32>,
    created_at: Timestamp,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let username = Username::parse(value.name).map_err(|err| invalid_data(err.to_string()))?;
        let email = UserEmail::parse(value.email).map_err(|err| invalid_data(err.to_string()))?;
        let password =
            PasswordHash::new(value.password_hash).map_err(|err| invalid_data(err.to_string()))?;
        let role = UserRole::parse(Some(value.role)).map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::new(value.id),
            username,
            email,
            password,
            role,
            is_confirmed: value.is_confirmed,
            profile: UserProfile {
                job: value.job,
                phone: value.phone,
                address: value.address,
                resume_file: value.resume_file,
                cover_letter: value.cover_letter,
                company_name: value.company_name,
                re_coins: value.re_coins,
                total_money: value.total_money,
            },
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct EducationRecord {
    id: i64,
    user_id: i64,
    degree: String,
    field: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    school_name: String,
}

impl From<EducationRecord> for Education {
    fn from(value: EducationRecord) -> Self {
        Education {
            id: EducationId::new(value.id),
            user_id: UserId::new(value.user_id),
            degree: value.degree,
            field: value.field,
            start_date: value.start_date,
            end_date: value.end_date,
            school_name: value.school_name,
        }
    }
}

#[derive(Debug, FromRow)]
struct ExperienceRecord {
    id: i64,
    user_id: i64,
    position: String,
    company_name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl From<ExperienceRecord> for Experience {
    fn from(value: ExperienceRecord) -> Self {
        Experience {
            id: ExperienceId::new(value.id),
            user_id: UserId::new(value.user_id),
            position: value.position,
            company_name: value.company_name,
            start_date: value.start_date,
            end_date: value.end_date,
        }
    }
}

#[derive(Debug, FromRow)]
struct JobRecord {
    id: i64,
    author_id: i64,
    title: String,
    description: String,
    keywords: String,
    min_budget: i32,
    max_budget: i32,
}

impl From<JobRecord> for Job {
    fn from(value: JobRecord) -> Self {
        Job {
            id: JobId::new(value.id),
            author_id: UserId::new(value.author_id),
            title: value.title,
            description: value.description,
            keywords: value.keywords,
            min_budget: value.min_budget,
            max_budget: value.max_budget,
        }
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRecord {
    id: i64,
    job_id: i64,
    user_id: i64,
    cover_letter: Option<String>,
    resume_file: Option<String>,
}

impl From<ApplicationRecord> for JobApplication {
    fn from(value: ApplicationRecord) -> Self {
        JobApplication {
            id: JobApplicationId::new(value.id),
            job_id: JobId::new(value.job_id),
            user_id: UserId::new(value.user_id),
            cover_letter: value.cover_letter,
            resume_file: value.resume_file,
        }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRecord {
    id: i64,
    user_id: i64,
    message: String,
    is_read: bool,
    created_at: Timestamp,
}

impl From<NotificationRecord> for Notification {
    fn from(value: NotificationRecord) -> Self {
        Notification {
            id: NotificationId::new(value.id),
            user_id: UserId::new(value.user_id),
            message: value.message,
            is_read: value.is_read,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: i64,
    sender_id: i64,
    receiver_id: i64,
    message: String,
    is_read: bool,
    created_at: Timestamp,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let content =
            MessageContent::new(value.message).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Message {
            id: MessageId::new(value.id),
            sender_id: UserId::new(value.sender_id),
            receiver_id: UserId::new(value.receiver_id),
            content,
            is_read: value.is_read,
            created_at: value.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> RepositoryResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (name, email, password_hash, role, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_str())
        .bind(user.role.as_str())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn update(&self, user: User) -> RepositoryResult<User> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_err)?;
        update_user(&mut conn, &user).await
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &UserEmail) -> RepositoryResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_username(&self, username: &Username) -> RepositoryResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE name = $1"
        ))
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<User>> {
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }
}

async fn update_user(conn: &mut sqlx::PgConnection, user: &User) -> RepositoryResult<User> {
    let profile = &user.profile;
    let record = sqlx::query_as::<_, UserRecord>(&format!(
        "UPDATE users SET name = $2, email = $3, password_hash = $4, role = $5, \
         is_confirmed = $6, job = $7, phone = $8, address = $9, resume_file = $10, \
         cover_letter = $11, company_name = $12, re_coins = $13, total_money = $14 \
         WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(user.id.value())
    .bind(user.username.as_str())
    .bind(user.email.as_str())
    .bind(user.password.as_str())
    .bind(user.role.as_str())
    .bind(user.is_confirmed)
    .bind(&profile.job)
    .bind(&profile.phone)
    .bind(&profile.address)
    .bind(&profile.resume_file)
    .bind(&profile.cover_letter)
    .bind(&profile.company_name)
    .bind(profile.re_coins)
    .bind(profile.total_money)
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx_err)?
    .ok_or(RepositoryError::NotFound)?;

    User::try_from(record)
}

#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const EDUCATION_COLUMNS: &str = "id, user_id, degree, field, start_date, end_date, school_name";
const EXPERIENCE_COLUMNS: &str = "id, user_id, position, company_name, start_date, end_date";

fn ensure_affected(result: sqlx::postgres::PgQueryResult) -> RepositoryResult<()> {
    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn list_education(&self, user_id: UserId) -> RepositoryResult<Vec<Education>> {
        let records = sqlx::query_as::<_, EducationRecord>(&format!(
            "SELECT {EDUCATION_COLUMNS} FROM education WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Education::from).collect())
    }

    async fn list_experience(&self, user_id: UserId) -> RepositoryResult<Vec<Experience>> {
        let records = sqlx::query_as::<_, ExperienceRecord>(&format!(
            "SELECT {EXPERIENCE_COLUMNS} FROM experience WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Experience::from).collect())
    }

    async fn find_education(&self, id: EducationId) -> RepositoryResult<Option<Education>> {
        let record = sqlx::query_as::<_, EducationRecord>(&format!(
            "SELECT {EDUCATION_COLUMNS} FROM education WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Education::from))
    }

    async fn find_experience(&self, id: ExperienceId) -> RepositoryResult<Option<Experience>> {
        let record = sqlx::query_as::<_, ExperienceRecord>(&format!(
            "SELECT {EXPERIENCE_COLUMNS} FROM experience WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Experience::from))
    }

    async fn save_profile(&self, save: ProfileSave) -> RepositoryResult<User> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let user = update_user(&mut tx, &save.user).await?;

        for write in save.education {
            write_education(&mut tx, user.id, write).await?;
        }
        for write in save.experience {
            write_experience(&mut tx, user.id, write).await?;
        }

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(user)
    }

    async fn delete_education(&self, id: EducationId) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM education WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        ensure_affected(result)
    }

    async fn delete_experience(&self, id: ExperienceId) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM experience WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        ensure_affected(result)
    }
}

async fn write_education(
    tx: &mut Transaction<'_, Postgres>,
    owner: UserId,
    write: domain::EducationWrite,
) -> RepositoryResult<()> {
    let result = match write {
        RecordWrite::Create(record) => sqlx::query(
            "INSERT INTO education (user_id, degree, field, start_date, end_date, school_name) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(owner.value())
        .bind(record.degree)
        .bind(record.field)
        .bind(record.start_date)
        .bind(record.end_date)
        .bind(record.school_name)
        .execute(&mut **tx)
        .await,
        // 只更新属于该用户的记录
        RecordWrite::Update(record) => sqlx::query(
            "UPDATE education SET degree = $3, field = $4, start_date = $5, end_date = $6, \
             school_name = $7 WHERE id = $1 AND user_id = $2",
        )
        .bind(record.id.value())
        .bind(owner.value())
        .bind(record.degree)
        .bind(record.field)
        .bind(record.start_date)
        .bind(record.end_date)
        .bind(record.school_name)
        .execute(&mut **tx)
        .await,
    };
    ensure_affected(result.map_err(map_sqlx_err)?)
}

async fn write_experience(
    tx: &mut Transaction<'_, Postgres>,
    owner: UserId,
    write: domain::ExperienceWrite,
) -> RepositoryResult<()> {
    let result = match write {
        RecordWrite::Create(record) => sqlx::query(
            "INSERT INTO experience (user_id, position, company_name, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(owner.value())
        .bind(record.position)
        .bind(record.company_name)
        .bind(record.start_date)
        .bind(record.end_date)
        .execute(&mut **tx)
        .await,
        RecordWrite::Update(record) => sqlx::query(
            "UPDATE experience SET position = $3, company_name = $4, start_date = $5, \
             end_date = $6 WHERE id = $1 AND user_id = $2",
        )
        .bind(record.id.value())
        .bind(owner.value())
        .bind(record.position)
        .bind(record.company_name)
        .bind(record.start_date)
        .bind(record.end_date)
        .execute(&mut **tx)
        .await,
    };
    ensure_affected(result.map_err(map_sqlx_err)?)
}

#[derive(Clone)]
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const JOB_COLUMNS: &str = "id, author_id, title, description, keywords, min_budget, max_budget";
const APPLICATION_COLUMNS: &str = "id, job_id, user_id, cover_letter, resume_file";
const NOTIFICATION_COLUMNS: &str = "id, user_id, message, is_read, created_at";

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn create(&self, job: NewJob) -> RepositoryResult<Job> {
        let record = sqlx::query_as::<_, JobRecord>(&format!(
            "INSERT INTO jobs (author_id, title, description, keywords, min_budget, max_budget) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {JOB_COLUMNS}"
        ))
        .bind(job.author_id.value())
        .bind(job.title)
        .bind(job.description)
        .bind(job.keywords)
        .bind(job.min_budget)
        .bind(job.max_budget)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.into())
    }

    async fn find_by_id(&self, id: JobId) -> RepositoryResult<Option<Job>> {
        let record = sqlx::query_as::<_, JobRecord>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Job::from))
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Job>> {
        let records =
            sqlx::query_as::<_, JobRecord>(&format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY id"))
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Job::from).collect())
    }

    async fn list_by_author(&self, author_id: UserId) -> RepositoryResult<Vec<Job>> {
        let records = sqlx::query_as::<_, JobRecord>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE author_id = $1 ORDER BY id"
        ))
        .bind(author_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Job::from).collect())
    }

    async fn search(&self, query: &str) -> RepositoryResult<Vec<Job>> {
        let records = sqlx::query_as::<_, JobRecord>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE title ILIKE $1 OR keywords ILIKE $1 ORDER BY id"
        ))
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Job::from).collect())
    }

    async fn find_application(
        &self,
        job_id: JobId,
        user_id: UserId,
    ) -> RepositoryResult<Option<JobApplication>> {
        let record = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE job_id = $1 AND user_id = $2"
        ))
        .bind(job_id.value())
        .bind(user_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(JobApplication::from))
    }

    async fn list_applications(&self, job_id: JobId) -> RepositoryResult<Vec<JobApplication>> {
        let records = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE job_id = $1 ORDER BY id"
        ))
        .bind(job_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(JobApplication::from).collect())
    }

    async fn create_application_with_notification(
        &self,
        application: NewJobApplication,
        notification: NewNotification,
    ) -> RepositoryResult<(JobApplication, Notification)> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let stored_application = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "INSERT INTO job_applications (job_id, user_id, cover_letter, resume_file) \
             VALUES ($1, $2, $3, $4) RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(application.job_id.value())
        .bind(application.user_id.value())
        .bind(application.cover_letter)
        .bind(application.resume_file)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        let stored_notification = sqlx::query_as::<_, NotificationRecord>(&format!(
            "INSERT INTO notifications (user_id, message, created_at) \
             VALUES ($1, $2, $3) RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(notification.user_id.value())
        .bind(notification.message)
        .bind(notification.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        // 任一插入失败时 tx 被丢弃并回滚
        tx.commit().await.map_err(map_sqlx_err)?;
        Ok((stored_application.into(), stored_notification.into()))
    }
}

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: NewNotification) -> RepositoryResult<Notification> {
        let record = sqlx::query_as::<_, NotificationRecord>(&format!(
            "INSERT INTO notifications (user_id, message, created_at) \
             VALUES ($1, $2, $3) RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(notification.user_id.value())
        .bind(notification.message)
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.into())
    }

    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Notification>> {
        let records = sqlx::query_as::<_, NotificationRecord>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Notification::from).collect())
    }

    async fn find_by_id(&self, id: NotificationId) -> RepositoryResult<Option<Notification>> {
        let record = sqlx::query_as::<_, NotificationRecord>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Notification::from))
    }

    async fn mark_read(&self, id: NotificationId) -> RepositoryResult<Notification> {
        let record = sqlx::query_as::<_, NotificationRecord>(&format!(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id.value())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.into())
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, message, is_read, created_at";

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn append(&self, message: NewMessage) -> RepositoryResult<Message> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "INSERT INTO messages (sender_id, receiver_id, message, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message.sender_id.value())
        .bind(message.receiver_id.value())
        .bind(message.content.as_str())
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Message::try_from(record)
    }

    async fn history(&self, a: UserId, b: UserId) -> RepositoryResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE LEAST(sender_id, receiver_id) = LEAST($1::BIGINT, $2::BIGINT) \
               AND GREATEST(sender_id, receiver_id) = GREATEST($1::BIGINT, $2::BIGINT) \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(a.value())
        .bind(b.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }
}

/// 所有 PostgreSQL 仓储共享同一个连接池
#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: Arc<PgUserRepository>,
    pub profile_repository: Arc<PgProfileRepository>,
    pub job_repository: Arc<PgJobRepository>,
    pub notification_repository: Arc<PgNotificationRepository>,
    pub message_repository: Arc<PgMessageRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: Arc::new(PgUserRepository::new(pool.clone())),
            profile_repository: Arc::new(PgProfileRepository::new(pool.clone())),
            job_repository: Arc::new(PgJobRepository::new(pool.clone())),
            notification_repository: Arc::new(PgNotificationRepository::new(pool.clone())),
            message_repository: Arc::new(PgMessageRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%_"), "%100\\%\\_%");
    }
}
