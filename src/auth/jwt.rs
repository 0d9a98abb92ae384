use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use uuid::Uuid;

use crate::config::parse_or;
use crate::entities::user::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("JWT configuration error: {0}")]
    Config(String),
    #[error("Expected a {0:?} token")]
    WrongTokenType(TokenType),
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, JwtError> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| JwtError::Config("JWT_SECRET not set".to_string()))?;
        let access_minutes = parse_or("JWT_ACCESS_TTL_MINUTES", 60i64)
            .map_err(|e| JwtError::Config(e.to_string()))?;
        let refresh_days = parse_or("JWT_REFRESH_TTL_DAYS", 7i64)
            .map_err(|e| JwtError::Config(e.to_string()))?;

        Ok(Self {
            secret,
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::days(refresh_days),
        })
    }

    fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn create_token(
    user_id: Uuid,
    username: &str,
    role: UserRole,
    token_type: TokenType,
) -> Result<String, JwtError> {
    let config = JwtConfig::from_env()?;

    let now = Utc::now();
    let expires_at = now + config.ttl(token_type);

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role: role.to_string(),
        token_type,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(JwtError::Jwt)
}

pub fn create_token_pair(user_id: Uuid, username: &str, role: UserRole) -> Result<TokenPair, JwtError> {
    Ok(TokenPair {
        access: create_token(user_id, username, role, TokenType::Access)?,
        refresh: create_token(user_id, username, role, TokenType::Refresh)?,
    })
}

pub fn validate_token(token: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let config = JwtConfig::from_env()?;

    let validation = Validation::default();

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(JwtError::Jwt)?;

    if token_data.claims.token_type != expected {
        return Err(JwtError::WrongTokenType(expected));
    }

    Ok(token_data.claims)
}
