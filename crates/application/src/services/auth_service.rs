use std::sync::Arc;

use domain::{DomainError, NewUser, UserEmail, UserId, UserRepository, UserRole, Username};

use crate::{
    clock::Clock,
    dto::{ConfirmOutcome, LoginResult, RegisterResult},
    error::ApplicationError,
    mailer::ConfirmationMailer,
    password::PasswordHasher,
    token::TokenService,
};

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct AuthServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub token_service: Arc<TokenService>,
    pub mailer: Arc<dyn ConfirmationMailer>,
    pub clock: Arc<dyn Clock>,
}

/// 注册、登录、邮箱确认
pub struct AuthService {
    deps: AuthServiceDependencies,
}

impl AuthService {
    pub fn new(deps: AuthServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<RegisterResult, ApplicationError> {
        let username = Username::parse(request.username)?;
        let email = UserEmail::parse(request.email)?;
        let role = UserRole::parse(request.role)?;
        if request.password.is_empty() {
            return Err(DomainError::validation_error("password", "cannot be empty").into());
        }

        let users = &self.deps.user_repository;
        if users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::DuplicateEmail.into());
        }
        if users.find_by_username(&username).await?.is_some() {
            return Err(DomainError::DuplicateUsername.into());
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;
        let now = self.deps.clock.now();
        // 并发注册由存储层唯一约束兜底，冲突映射回 DuplicateEmail/DuplicateUsername
        let user = users
            .create(NewUser::register(username, email, password_hash, role, now))
            .await?;

        tracing::info!(user_id = %user.id, "用户注册成功");

        let confirmation_sent = match self.send_confirmation(&user.email).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(user_id = %user.id, error = %err, "确认邮件发送失败");
                false
            }
        };

        Ok(RegisterResult {
            user_id: user.id,
            confirmation_sent,
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResult, ApplicationError> {
        let email = lookup_email(request.email)?;
        let user = self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password)
            .await?;
        if !password_ok {
            return Err(DomainError::InvalidCredentials.into());
        }

        let access_token = self.deps.token_service.issue_session_token(user.id)?;
        tracing::info!(user_id = %user.id, "用户登录");

        Ok(LoginResult {
            access_token,
            user_id: user.id,
            username: user.username.as_str().to_owned(),
            role: user.role.as_str().to_owned(),
        })
    }

    /// 校验确认令牌并标记邮箱已确认；重复确认视为成功
    pub async fn confirm_email(&self, token: &str) -> Result<ConfirmOutcome, ApplicationError> {
        let email = self.deps.token_service.verify_confirmation(token)?;
        let mut user = self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        if !user.confirm() {
            return Ok(ConfirmOutcome::AlreadyConfirmed);
        }

        let user = self.deps.user_repository.update(user).await?;
        tracing::info!(user_id = %user.id, "邮箱已确认");
        Ok(ConfirmOutcome::Confirmed)
    }

    pub async fn resend_confirmation(&self, email: String) -> Result<(), ApplicationError> {
        let email = lookup_email(email)?;
        let user = self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        if user.is_confirmed {
            return Err(DomainError::AlreadyConfirmed.into());
        }

        self.send_confirmation(&user.email).await
    }

    /// 校验会话令牌，返回其中的用户 ID
    pub fn authenticate(&self, token: &str) -> Result<UserId, ApplicationError> {
        Ok(self.deps.token_service.verify_session(token)?)
    }

    async fn send_confirmation(&self, email: &UserEmail) -> Result<(), ApplicationError> {
        let token = self.deps.token_service.issue_confirmation_token(email)?;
        self.deps.mailer.send_confirmation(email, &token).await?;
        Ok(())
    }
}

/// 查找用的邮箱：格式不合法等同于不存在的账号
fn lookup_email(raw: String) -> Result<UserEmail, DomainError> {
    UserEmail::parse(raw).map_err(|_| DomainError::UserNotFound)
}
