//! 用户实体定义
//!
//! 邮箱确认状态只能从未确认变为已确认。

use serde::{Deserialize, Serialize};

use crate::value_objects::{PasswordHash, Timestamp, UserEmail, UserId, UserRole, Username};

/// 个人资料中的可选字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub job: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub resume_file: Option<String>,
    pub cover_letter: Option<String>,
    pub company_name: Option<String>,
    pub re_coins: Option<i32>,
    pub total_money: Option<i32>,
}

/// 资料更新，`None` 表示保持原值
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<Username>,
    pub job: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub resume_file: Option<String>,
    pub cover_letter: Option<String>,
    pub company_name: Option<String>,
}

/// 用户实体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: UserEmail,
    pub password: PasswordHash,
    pub role: UserRole,
    pub is_confirmed: bool,
    pub profile: UserProfile,
    pub created_at: Timestamp,
}

/// 尚未持久化的新用户，ID 由存储分配
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub email: UserEmail,
    pub password: PasswordHash,
    pub role: UserRole,
    pub created_at: Timestamp,
}

impl NewUser {
    pub fn register(
        username: Username,
        email: UserEmail,
        password: PasswordHash,
        role: UserRole,
        now: Timestamp,
    ) -> Self {
        Self {
            username,
            email,
            password,
            role,
            created_at: now,
        }
    }

    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password: self.password,
            role: self.role,
            is_confirmed: false,
            profile: UserProfile::default(),
            created_at: self.created_at,
        }
    }
}

impl User {
    /// 标记邮箱已确认，返回状态是否发生变化
    pub fn confirm(&mut self) -> bool {
        if self.is_confirmed {
            return false;
        }
        self.is_confirmed = true;
        true
    }

    pub fn apply_profile_changes(&mut self, changes: ProfileChanges) {
        if let Some(name) = changes.name {
            self.username = name;
        }
        let profile = &mut self.profile;
        merge(&mut profile.job, changes.job);
        merge(&mut profile.phone, changes.phone);
        merge(&mut profile.address, changes.address);
        merge(&mut profile.resume_file, changes.resume_file);
        merge(&mut profile.cover_letter, changes.cover_letter);
        merge(&mut profile.company_name, changes.company_name);
    }
}

fn merge(field: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *field = Some(value);
    }
}
