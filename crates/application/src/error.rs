use domain::{constraints, DomainError, RepositoryError};
use thiserror::Error;

use crate::{
    mailer::MailerError, password::PasswordHasherError, token::TokenError,
};

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(RepositoryError),
    #[error("password error: {0}")]
    Password(#[from] PasswordHasherError),
    #[error("token error: {0}")]
    Token(#[from] TokenError),
    #[error("mailer error: {0}")]
    Mailer(#[from] MailerError),
}

impl From<RepositoryError> for ApplicationError {
    /// 唯一约束冲突按约束名还原为业务错误
    fn from(value: RepositoryError) -> Self {
        match &value {
            RepositoryError::Conflict { constraint } => match constraint.as_str() {
                constraints::USERS_EMAIL => DomainError::DuplicateEmail.into(),
                constraints::USERS_NAME => DomainError::DuplicateUsername.into(),
                constraints::JOB_APPLICATION_UNIQUE => DomainError::DuplicateApplication.into(),
                _ => ApplicationError::Repository(value),
            },
            _ => ApplicationError::Repository(value),
        }
    }
}
