//! 用例返回给传输层的数据结构

use domain::{
    Education, Experience, Job, JobApplication, Message, MessageId, Notification,
    NotificationId, Timestamp, User, UserId,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterResult {
    pub user_id: UserId,
    /// 确认邮件是否发送成功；失败不回滚注册
    pub confirmation_sent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub access_token: String,
    pub user_id: UserId,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    AlreadyConfirmed,
}

/// 聊天记录与实时推送共用的消息形态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessageDto {
    pub id: MessageId,
    pub sender_id: UserId,
    pub message: String,
    pub created_at: Timestamp,
}

impl From<&Message> for ChatMessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            message: message.content.as_str().to_owned(),
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationDto {
    pub id: NotificationId,
    pub message: String,
    pub is_read: bool,
    pub created_at: Timestamp,
}

impl From<Notification> for NotificationDto {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            message: notification.message,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}

/// 职位申请人信息，字段取自申请人本人
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantDto {
    pub applicant_id: UserId,
    pub username: String,
    #[serde(rename = "user_job")]
    pub job: Option<String>,
    #[serde(rename = "user_total_earnings")]
    pub total_money: Option<i32>,
    pub cover_letter: Option<String>,
    pub resume_file: Option<String>,
}

impl ApplicantDto {
    pub fn new(applicant: &User, application: &JobApplication) -> Self {
        Self {
            applicant_id: applicant.id,
            username: applicant.username.as_str().to_owned(),
            job: applicant.profile.job.clone(),
            total_money: applicant.profile.total_money,
            cover_letter: application.cover_letter.clone(),
            resume_file: application.resume_file.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub applicants: Vec<ApplicantDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub job: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub resume_file: Option<String>,
    pub cover_letter: Option<String>,
    pub company_name: Option<String>,
    pub re_coins: Option<i32>,
    pub total_money: Option<i32>,
    pub is_confirmed: bool,
    pub jobs: Vec<Job>,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
}

impl ProfileView {
    pub fn new(
        user: User,
        jobs: Vec<Job>,
        education: Vec<Education>,
        experience: Vec<Experience>,
    ) -> Self {
        let profile = user.profile;
        Self {
            user_id: user.id,
            username: user.username.as_str().to_owned(),
            email: user.email.as_str().to_owned(),
            role: user.role.as_str().to_owned(),
            job: profile.job,
            phone: profile.phone,
            address: profile.address,
            resume_file: profile.resume_file,
            cover_letter: profile.cover_letter,
            company_name: profile.company_name,
            re_coins: profile.re_coins,
            total_money: profile.total_money,
            is_confirmed: user.is_confirmed,
            jobs,
            education,
            experience,
        }
    }
}
