use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::utils::{EmptyResponse, error_codes, error_to_api_response};

mod code;
mod ledger;
mod token;

pub use code::{CodeError, generate_code, validate_code};
pub use ledger::Token;
pub use token::{Claims, decode_token, generate_token, issue_token, validate_token};

/// 鉴权失败的具体种类，由边界层统一转换为状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    TokenExpired,
    TokenRevoked,
    Forbidden,
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                "Authentication token is missing. Please log in.",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                "Invalid token. Please log in again.",
            ),
            AuthError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                "Token has expired. Please log in again.",
            ),
            AuthError::TokenRevoked => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                "Token has been revoked. Please log in again.",
            ),
            AuthError::Forbidden => (
                StatusCode::FORBIDDEN,
                error_codes::PERMISSION_DENIED,
                "You are not authorized to visit this page",
            ),
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "Internal server error",
            ),
        };

        let body = error_to_api_response::<EmptyResponse>(code, msg.to_string());
        (status, body).into_response()
    }
}
