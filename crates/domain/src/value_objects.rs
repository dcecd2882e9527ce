use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// 统一的时间戳类型。
pub type Timestamp = DateTime<Utc>;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

numeric_id!(
    /// 用户唯一标识。
    UserId
);
numeric_id!(
    /// 职位唯一标识。
    JobId
);
numeric_id!(JobApplicationId);
numeric_id!(NotificationId);
numeric_id!(
    /// 私信唯一标识。
    MessageId
);
numeric_id!(EducationId);
numeric_id!(ExperienceId);

/// 经过验证的用户名（唯一的显示名）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(DomainError::validation_error("username", "cannot be empty"));
        }
        if value.chars().count() > 80 {
            return Err(DomainError::validation_error("username", "too long"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 经过验证的邮箱。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserEmail(String);

impl UserEmail {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(DomainError::validation_error("email", "cannot be empty"));
        }
        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::validation_error("email", "must contain '@'"));
        };
        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::validation_error("email", "malformed address"));
        }
        if value.len() > 120 {
            return Err(DomainError::validation_error("email", "too long"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 经过外部服务生成的密码哈希，永远不保存明文。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let hash = value.into();
        if hash.trim().is_empty() {
            return Err(DomainError::validation_error(
                "password_hash",
                "cannot be empty",
            ));
        }
        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 用户角色，注册时未指定则为 `user`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRole(String);

impl UserRole {
    pub const DEFAULT: &'static str = "user";

    pub fn parse(value: Option<String>) -> Result<Self, DomainError> {
        match value.map(|role| role.trim().to_owned()) {
            None => Ok(Self::default()),
            Some(role) if role.is_empty() => Ok(Self::default()),
            Some(role) if role.len() > 255 => {
                Err(DomainError::validation_error("role", "too long"))
            }
            Some(role) => Ok(Self(role)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

/// 私信正文内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageContent(String);

impl MessageContent {
    pub const MAX_LEN: usize = 250;

    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::validation_error("message", "cannot be empty"));
        }
        if value.chars().count() > Self::MAX_LEN {
            return Err(DomainError::validation_error("message", "too long"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_trimmed_and_required() {
        assert_eq!(Username::parse("  alice ").unwrap().as_str(), "alice");
        assert!(Username::parse("   ").is_err());
        assert!(Username::parse("a".repeat(81)).is_err());
    }

    #[test]
    fn email_requires_local_and_domain_parts() {
        assert!(UserEmail::parse("alice@example.com").is_ok());
        assert!(UserEmail::parse("alice").is_err());
        assert!(UserEmail::parse("@example.com").is_err());
        assert!(UserEmail::parse("alice@").is_err());
    }

    #[test]
    fn role_defaults_to_user() {
        assert_eq!(UserRole::parse(None).unwrap().as_str(), "user");
        assert_eq!(UserRole::parse(Some(" ".into())).unwrap().as_str(), "user");
        assert_eq!(
            UserRole::parse(Some("employer".into())).unwrap().as_str(),
            "employer"
        );
    }

    #[test]
    fn message_content_limits() {
        assert!(MessageContent::new("hi").is_ok());
        assert!(MessageContent::new("  ").is_err());
        assert!(MessageContent::new("x".repeat(251)).is_err());
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&UserId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
