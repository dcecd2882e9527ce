//! 领域模型错误定义
//!
//! 定义了业务规则违反与存储层失败两类错误。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 资源不存在（职位、通知、教育/工作经历记录等）
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("You have already applied to this job")]
    DuplicateApplication,

    /// 密码不匹配
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// 归属检查失败
    #[error("Unauthorized: {action}")]
    Unauthorized { action: String },

    #[error("Account already confirmed.")]
    AlreadyConfirmed,

    /// 请求字段缺失或格式错误
    #[error("{field}: {message}")]
    ValidationError { field: String, message: String },
}

impl DomainError {
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn unauthorized(action: impl Into<String>) -> Self {
        Self::Unauthorized {
            action: action.into(),
        }
    }

    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 存储层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    /// 唯一约束冲突，携带约束名以便上层映射为具体业务错误
    #[error("unique constraint violated: {constraint}")]
    Conflict { constraint: String },

    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn conflict(constraint: impl Into<String>) -> Self {
        Self::Conflict {
            constraint: constraint.into(),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// 唯一约束名称，PostgreSQL 迁移与内存实现共用
pub mod constraints {
    pub const USERS_EMAIL: &str = "users_email_key";
    pub const USERS_NAME: &str = "users_name_key";
    pub const JOB_APPLICATION_UNIQUE: &str = "job_applications_job_id_user_id_key";
}
