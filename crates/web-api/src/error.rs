use application::{ApplicationError, TokenError};
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, RepositoryError};
use serde::Serialize;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.body.code
    }

    pub fn message(&self) -> &str {
        &self.body.message
    }

    /// 确认链接中的令牌无效或过期属于请求错误，而不是认证失败
    pub fn from_confirmation(error: ApplicationError) -> Self {
        let api_error = Self::from(error);
        match api_error.code() {
            "INVALID_TOKEN" | "TOKEN_EXPIRED" => Self {
                status: StatusCode::BAD_REQUEST,
                ..api_error
            },
            _ => api_error,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        let message = error.to_string();
        match error {
            DomainError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
            DomainError::UserNotFound => {
                Self::new(StatusCode::NOT_FOUND, "USER_NOT_FOUND", message)
            }
            DomainError::DuplicateEmail => {
                Self::new(StatusCode::BAD_REQUEST, "DUPLICATE_EMAIL", message)
            }
            DomainError::DuplicateUsername => {
                Self::new(StatusCode::BAD_REQUEST, "DUPLICATE_USERNAME", message)
            }
            DomainError::DuplicateApplication => {
                Self::new(StatusCode::BAD_REQUEST, "DUPLICATE_APPLICATION", message)
            }
            DomainError::AlreadyConfirmed => {
                Self::new(StatusCode::BAD_REQUEST, "ALREADY_CONFIRMED", message)
            }
            DomainError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", message)
            }
            DomainError::Unauthorized { .. } => {
                Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
            }
            DomainError::ValidationError { .. } => Self::validation(message),
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Domain(err) => err.into(),
            ApplicationError::Repository(repo_err) => match repo_err {
                RepositoryError::NotFound => Self::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "requested resource not found",
                ),
                RepositoryError::Conflict { constraint } => Self::new(
                    StatusCode::BAD_REQUEST,
                    "CONFLICT",
                    format!("resource already exists ({constraint})"),
                ),
                RepositoryError::Storage { message } => {
                    tracing::error!(error = %message, "存储层错误");
                    Self::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DATABASE_ERROR",
                        format!("database error: {message}"),
                    )
                }
            },
            ApplicationError::Token(TokenError::Invalid) => {
                Self::new(StatusCode::UNAUTHORIZED, "INVALID_TOKEN", "invalid token")
            }
            ApplicationError::Token(TokenError::Expired) => {
                Self::new(StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED", "token expired")
            }
            ApplicationError::Token(err @ TokenError::Encoding(_)) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "TOKEN_ERROR",
                err.to_string(),
            ),
            ApplicationError::Password(err) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "PASSWORD_ERROR",
                format!("password error: {err}"),
            ),
            ApplicationError::Mailer(err) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "MAIL_ERROR",
                format!("Failed to send email: {err}"),
            ),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_validation_errors("", &errors, &mut fields);
        fields.sort();
        Self::validation(fields.join("; "))
    }
}

/// 展开嵌套结构和列表的校验错误，字段路径形如 `experience[0].position`
fn collect_validation_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let reason = errs
                    .first()
                    .and_then(|err| err.message.as_ref())
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| "is invalid".to_owned());
                out.push(format!("{path}: {reason}"));
            }
            ValidationErrorsKind::Struct(inner) => collect_validation_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_validation_errors(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
