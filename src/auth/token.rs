use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::routes::user::User;

use super::AuthError;
use super::ledger::Token;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // 用户邮箱
    pub name: String, // 展示用全名
    pub iat: i64,
    pub exp: i64,
    pub jti: String, // 同一用户并发登录时保证token串唯一
}

impl Claims {
    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}

pub fn generate_token(user: &User, config: &Config) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::seconds(
            config.token_expiration().as_secs() as i64,
        ))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: user.email.clone(),
        name: user.fullname(),
        iat: now.timestamp(),
        exp: expiration,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )
}

/// 只验证签名和载荷格式。过期与吊销由 validate_token 按序判断，
/// 保证已吊销的过期token报告的是吊销而不是过期
pub fn decode_token(token: &str, config: &Config) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS512);
    validation.validate_exp = false;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

/// 签发token并登记到token台账，每次登录都产生一条新记录
pub async fn issue_token(pool: &PgPool, config: &Config, user: &User) -> Result<String, AuthError> {
    let token = generate_token(user, config).map_err(|e| {
        tracing::error!("Failed to sign token for {}: {}", user.email, e);
        AuthError::Internal
    })?;

    Token::record(pool, &token).await.map_err(db_error)?;
    Ok(token)
}

/// 完整校验：签名 -> 台账吊销状态 -> 过期时间 -> 解析用户
pub async fn validate_token(
    pool: &PgPool,
    config: &Config,
    token: &str,
) -> Result<User, AuthError> {
    let claims = decode_token(token, config)?;

    if !Token::is_usable(pool, token).await.map_err(db_error)? {
        return Err(AuthError::TokenRevoked);
    }

    if claims.is_expired() {
        return Err(AuthError::TokenExpired);
    }

    match User::find_by_email(pool, &claims.sub)
        .await
        .map_err(db_error)?
    {
        Some(user) => Ok(user),
        None => {
            // 账号已被删除，顺带吊销其遗留token
            if let Err(e) = Token::revoke(pool, token).await {
                tracing::warn!("Failed to revoke token of deleted account: {}", e);
            }
            Err(AuthError::InvalidToken)
        }
    }
}

fn db_error(e: sqlx::Error) -> AuthError {
    tracing::error!("Database error during token handling: {}", e);
    AuthError::Internal
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/wedding_test".into(),
            secret_key: "test-secret-key".into(),
            api_base_uri: "/api".into(),
            token_expiration_secs: 7 * 24 * 3600,
            code_expiration_secs: 3 * 3600,
            server_host: "127.0.0.1".into(),
            server_port: 3000,
        }
    }

    fn test_user() -> User {
        User {
            id: 1,
            email: "a@x.com".into(),
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            registered_on: Utc::now(),
            admin: false,
            password_hash: None,
            verified: true,
            verification_code: None,
            verified_on: None,
            password_recovery_code: None,
            password_recovery_gendate: None,
            group_id: None,
        }
    }

    #[test]
    fn generate_then_decode_round_trips() {
        let config = test_config();
        let token = generate_token(&test_user(), &config).unwrap();

        let claims = decode_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.name, "Ada Lovelace");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn concurrent_logins_get_distinct_tokens() {
        let config = test_config();
        let first = generate_token(&test_user(), &config).unwrap();
        let second = generate_token(&test_user(), &config).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = test_config();
        let token = generate_token(&test_user(), &config).unwrap();

        let flipped = if token.ends_with('A') { 'B' } else { 'A' };
        let mut tampered = token[..token.len() - 1].to_string();
        tampered.push(flipped);

        assert_eq!(decode_token(&tampered, &config), Err(AuthError::InvalidToken));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let config = test_config();
        let mut other = test_config();
        other.secret_key = "some-other-secret".into();

        let token = generate_token(&test_user(), &other).unwrap();
        assert_eq!(decode_token(&token, &config), Err(AuthError::InvalidToken));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let config = test_config();
        assert_eq!(decode_token("not-a-jwt", &config), Err(AuthError::InvalidToken));
        assert_eq!(decode_token("", &config), Err(AuthError::InvalidToken));
    }

    #[test]
    fn expired_claims_still_decode_but_report_expiry() {
        // 先报吊销后报过期的顺序依赖解码不检查exp
        let config = test_config();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "a@x.com".into(),
            name: "Ada Lovelace".into(),
            iat: now - 8 * 24 * 3600,
            exp: now - 24 * 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(config.secret_key.as_bytes()),
        )
        .unwrap();

        let decoded = decode_token(&token, &config).unwrap();
        assert!(decoded.is_expired());
    }
}
