use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// 邮箱验证码/密码找回码的载荷。无状态：不带exp，
/// 有效期由调用方在校验时以max_age给出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeClaims {
    pub sub: String, // 用户邮箱
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeError {
    Expired,
    Invalid,
}

pub fn generate_code(email: &str, config: &Config) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = CodeClaims {
        sub: email.to_string(),
        iat: Utc::now().timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    sign_code(&claims, &config.secret_key)
}

fn sign_code(claims: &CodeClaims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(Algorithm::HS512),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// 校验并取出其中的邮箱。签名不符返回Invalid，超龄返回Expired
pub fn validate_code(code: &str, max_age: Duration, config: &Config) -> Result<String, CodeError> {
    let mut validation = Validation::new(Algorithm::HS512);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let claims = decode::<CodeClaims>(
        code,
        &DecodingKey::from_secret(config.secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| CodeError::Invalid)?;

    let age = Utc::now().timestamp() - claims.iat;
    if age > max_age.as_secs() as i64 {
        return Err(CodeError::Expired);
    }

    Ok(claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_AGE: Duration = Duration::from_secs(3 * 3600);

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

    #[test]
    fn fresh_code_round_trips_to_its_email() {
        let config = test_config();
        let code = generate_code("a@x.com", &config).unwrap();
        assert_eq!(validate_code(&code, MAX_AGE, &config).unwrap(), "a@x.com");
    }

    #[test]
    fn codes_for_the_same_email_are_unique() {
        let config = test_config();
        let first = generate_code("a@x.com", &config).unwrap();
        let second = generate_code("a@x.com", &config).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn stale_code_reports_expired_not_invalid() {
        let config = test_config();
        let claims = CodeClaims {
            sub: "a@x.com".into(),
            iat: Utc::now().timestamp() - 4 * 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let code = sign_code(&claims, &config.secret_key).unwrap();

        assert_eq!(validate_code(&code, MAX_AGE, &config), Err(CodeError::Expired));
    }

    #[test]
    fn code_just_inside_the_window_is_accepted() {
        let config = test_config();
        let claims = CodeClaims {
            sub: "a@x.com".into(),
            iat: Utc::now().timestamp() - 3 * 3600 + 60,
            jti: Uuid::new_v4().to_string(),
        };
        let code = sign_code(&claims, &config.secret_key).unwrap();

        assert_eq!(validate_code(&code, MAX_AGE, &config).unwrap(), "a@x.com");
    }

    #[test]
    fn single_byte_tamper_is_invalid_never_a_wrong_payload() {
        let config = test_config();
        let code = generate_code("a@x.com", &config).unwrap();

        // 逐个翻转每个字符，任何一个被改动都必须判为Invalid
        for i in 0..code.len() {
            let original = code.as_bytes()[i] as char;
            let replacement = if original == 'A' { 'B' } else { 'A' };
            if original == replacement {
                continue;
            }
            let mut tampered = code.clone();
            tampered.replace_range(i..=i, &replacement.to_string());

            match validate_code(&tampered, MAX_AGE, &config) {
                Err(CodeError::Invalid) => {}
                other => panic!("tampered byte {} produced {:?}", i, other),
            }
        }
    }

    #[test]
    fn code_signed_with_other_secret_is_invalid() {
        let config = test_config();
        let mut other = test_config();
        other.secret_key = "some-other-secret".into();

        let code = generate_code("a@x.com", &other).unwrap();
        assert_eq!(validate_code(&code, MAX_AGE, &config), Err(CodeError::Invalid));
    }
}
