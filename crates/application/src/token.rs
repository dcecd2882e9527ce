//! 会话令牌与邮箱确认令牌
//!
//! 两类令牌都是 HS256 签名的 JWT。确认令牌使用由密钥和盐派生出的独立签名密钥，
//! 并携带不同的命名空间，因此不能当作会话令牌使用，反之亦然。
//! 过期时间依据注入的 [`Clock`] 判断，而不是系统时间。

use std::sync::Arc;

use chrono::Duration;
use config::AuthConfig;
use domain::{UserEmail, UserId};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::hmac;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::Clock;

const SESSION_NAMESPACE: &str = "session";
const CONFIRMATION_NAMESPACE: &str = "email-confirmation";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// 签名错误、格式错误或命名空间不匹配
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// 令牌用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Session,
    Confirmation,
}

impl TokenKind {
    fn namespace(self) -> &'static str {
        match self {
            TokenKind::Session => SESSION_NAMESPACE,
            TokenKind::Confirmation => CONFIRMATION_NAMESPACE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    ns: String,
    iat: i64,
    exp: i64,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub confirmation_salt: String,
    pub session_ttl: Duration,
    pub confirmation_ttl: Duration,
}

impl From<&AuthConfig> for TokenSettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            confirmation_salt: config.confirmation_salt.clone(),
            session_ttl: Duration::hours(config.session_ttl_hours),
            confirmation_ttl: Duration::seconds(config.confirmation_ttl_seconds),
        }
    }
}

pub struct TokenService {
    session_keys: SigningKeys,
    confirmation_keys: SigningKeys,
    session_ttl: Duration,
    confirmation_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(settings: TokenSettings, clock: Arc<dyn Clock>) -> Self {
        let master = hmac::Key::new(hmac::HMAC_SHA256, settings.secret.as_bytes());
        let derived = hmac::sign(&master, settings.confirmation_salt.as_bytes());

        Self {
            session_keys: SigningKeys::from_secret(settings.secret.as_bytes()),
            confirmation_keys: SigningKeys::from_secret(derived.as_ref()),
            session_ttl: settings.session_ttl,
            confirmation_ttl: settings.confirmation_ttl,
            clock,
        }
    }

    pub fn from_config(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(TokenSettings::from(config), clock)
    }

    pub fn issue_session_token(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue(&user_id.to_string(), TokenKind::Session)
    }

    pub fn issue_confirmation_token(&self, email: &UserEmail) -> Result<String, TokenError> {
        self.issue(email.as_str(), TokenKind::Confirmation)
    }

    /// 校验令牌并返回其中编码的主体
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)?;

        if claims.ns != kind.namespace() {
            return Err(TokenError::Invalid);
        }
        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims.sub)
    }

    pub fn verify_session(&self, token: &str) -> Result<UserId, TokenError> {
        let subject = self.verify(token, TokenKind::Session)?;
        subject
            .parse::<i64>()
            .map(UserId::new)
            .map_err(|_| TokenError::Invalid)
    }

    pub fn verify_confirmation(&self, token: &str) -> Result<UserEmail, TokenError> {
        let subject = self.verify(token, TokenKind::Confirmation)?;
        UserEmail::parse(subject).map_err(|_| TokenError::Invalid)
    }

    fn issue(&self, subject: &str, kind: TokenKind) -> Result<String, TokenError> {
        let now = self.clock.now();
        let ttl = match kind {
            TokenKind::Session => self.session_ttl,
            TokenKind::Confirmation => self.confirmation_ttl,
        };
        let claims = Claims {
            sub: subject.to_owned(),
            ns: kind.namespace().to_owned(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(ttl)
                .ok_or_else(|| TokenError::Encoding("token expiry out of range".to_owned()))?
                .timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys(kind).encoding,
        )
        .map_err(|err| TokenError::Encoding(err.to_string()))
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Session => &self.session_keys,
            TokenKind::Confirmation => &self.confirmation_keys,
        }
    }
}
