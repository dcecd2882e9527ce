//! 私聊房间命名
//!
//! 房间名由两位参与者的 ID 推导：`chat_<较小ID>_<较大ID>`，与发起方无关。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::UserId;

const PREFIX: &str = "chat_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomName {
    low: UserId,
    high: UserId,
}

impl RoomName {
    /// 对称推导：`between(a, b) == between(b, a)`
    pub fn between(a: UserId, b: UserId) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self { low, high }
    }

    pub fn participants(&self) -> (UserId, UserId) {
        (self.low, self.high)
    }

    pub fn includes(&self, user_id: UserId) -> bool {
        self.low == user_id || self.high == user_id
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}_{}", self.low, self.high)
    }
}

impl FromStr for RoomName {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::validation_error("room", "expected chat_<id>_<id>");

        let rest = value.strip_prefix(PREFIX).ok_or_else(invalid)?;
        let (low, high) = rest.split_once('_').ok_or_else(invalid)?;
        let low: i64 = low.parse().map_err(|_| invalid())?;
        let high: i64 = high.parse().map_err(|_| invalid())?;

        if low == high {
            return Err(invalid());
        }
        let room = Self::between(UserId::new(low), UserId::new(high));
        // 只接受规范形式，防止 "chat_02_1" 之类的别名指向同一房间
        if room.to_string() != value {
            return Err(invalid());
        }
        Ok(room)
    }
}

impl TryFrom<String> for RoomName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoomName> for String {
    fn from(value: RoomName) -> Self {
        value.to_string()
    }
}
