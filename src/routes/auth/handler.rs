use axum::{
    extract::{Extension, Json, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::{
    AppState,
    auth::{CodeError, Token, generate_code, issue_token, validate_code},
    middleware::TOKEN_HEADER,
    routes::group::InvitationGroup,
    routes::user::{User, UserInfo},
    utils::{
        EmptyResponse, error_codes, error_to_api_response, hash_password, success_to_api_response,
        verify_password,
    },
};

use super::model::{
    ChangePasswordRequest, ForgottenPasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
    ResetPasswordRequest, VerifyEmailRequest,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    // 必填字段检查
    if req.email.trim().is_empty()
        || req.password.is_empty()
        || req.firstname.trim().is_empty()
        || req.lastname.trim().is_empty()
        || req.registration_code.trim().is_empty()
    {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "email, password, firstname, lastname and registration_code are required"
                    .to_string(),
            ),
        );
    }

    // 注册码换邀请组
    let group = match InvitationGroup::find_by_code(&state.pool, &req.registration_code).await {
        Ok(Some(group)) => group,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::NOT_FOUND,
                    "registration code does not exist".to_string(),
                ),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            );
        }
    };

    match User::find_by_email(&state.pool, &req.email).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                error_to_api_response(
                    error_codes::ALREADY_EXISTS,
                    "an account already exists with that email".to_string(),
                ),
            );
        }
        Ok(None) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            );
        }
    }

    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to create account".to_string(),
                ),
            );
        }
    };

    let user = match User::create(
        &state.pool,
        &req.email,
        &password_hash,
        &req.firstname,
        &req.lastname,
        group.id,
    )
    .await
    {
        Ok(user) => user,
        Err(e) => {
            // 并发注册同一邮箱时靠唯一约束兜底
            if e.to_string().contains("unique constraint") {
                return (
                    StatusCode::CONFLICT,
                    error_to_api_response(
                        error_codes::ALREADY_EXISTS,
                        "an account already exists with that email".to_string(),
                    ),
                );
            }
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            );
        }
    };

    // 生成验证码。邮件投递不在本服务职责内，仅记录日志
    match generate_code(&user.email, &state.config) {
        Ok(code) => {
            if let Err(e) = User::set_verification_code(&state.pool, user.id, &code).await {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
                );
            }
            tracing::info!("Verification code generated for {}: {}", user.email, code);
        }
        Err(e) => {
            tracing::error!("Failed to sign verification code: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to create account".to_string(),
                ),
            );
        }
    }

    (
        StatusCode::CREATED,
        success_to_api_response(EmptyResponse {}),
    )
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let user = match User::find_by_email(&state.pool, &req.email).await {
        Ok(Some(user)) => user,
        // 未知邮箱与密码错误返回同一响应，防止账号枚举
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::AUTH_FAILED,
                    "username/password combo incorrect".to_string(),
                ),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            );
        }
    };

    let password_ok = user
        .password_hash
        .as_deref()
        .map(|hash| verify_password(&req.password, hash))
        .unwrap_or(false);
    if !password_ok {
        return (
            StatusCode::NOT_FOUND,
            error_to_api_response(
                error_codes::AUTH_FAILED,
                "username/password combo incorrect".to_string(),
            ),
        );
    }

    if !user.verified {
        return (
            StatusCode::GONE,
            error_to_api_response(
                error_codes::AUTH_FAILED,
                "account has not been verified".to_string(),
            ),
        );
    }

    match issue_token(&state.pool, &state.config, &user).await {
        Ok(token) => (StatusCode::OK, success_to_api_response(LoginResponse { token })),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(
                error_codes::INTERNAL_ERROR,
                "Failed to generate token".to_string(),
            ),
        ),
    }
}

/// 吊销当前token。中间件已验证过它，吊销后立即不可用
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let token = match headers.get(TOKEN_HEADER).and_then(|h| h.to_str().ok()) {
        Some(token) => token,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                error_to_api_response(
                    error_codes::AUTH_FAILED,
                    "Authentication token is missing. Please log in.".to_string(),
                ),
            );
        }
    };

    match Token::revoke(&state.pool, token).await {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response(EmptyResponse {}),
        ),
        Err(e) => {
            tracing::error!("Failed to revoke token: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to log out".to_string(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn change_password(
    Extension(user): Extension<User>,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> impl IntoResponse {
    // bcrypt输入上限72字节
    if req.password.len() < 6 || req.password.len() > 72 {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "password must be between 6 and 72 characters".to_string(),
            ),
        );
    }

    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to update password".to_string(),
                ),
            );
        }
    };

    match User::set_password(&state.pool, user.id, &password_hash).await {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response(EmptyResponse {}),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

/// 无论邮箱是否存在都返回200，防止账号枚举
#[axum::debug_handler]
pub async fn forgotten_password(
    State(state): State<AppState>,
    Json(req): Json<ForgottenPasswordRequest>,
) -> impl IntoResponse {
    match User::find_by_email(&state.pool, &req.email).await {
        Ok(Some(user)) => {
            let code = match generate_code(&user.email, &state.config) {
                Ok(code) => code,
                Err(e) => {
                    tracing::error!("Failed to sign recovery code: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        error_to_api_response(
                            error_codes::INTERNAL_ERROR,
                            "Failed to process request".to_string(),
                        ),
                    );
                }
            };

            // 覆盖旧找回码，旧码随即作废
            if let Err(e) = User::set_recovery_code(&state.pool, user.id, &code).await {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
                );
            }
            // 邮件投递是外部职责
            tracing::info!("Recovery code generated for {}: {}", user.email, code);
        }
        Ok(None) => {
            tracing::debug!("Password recovery requested for unknown email");
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            );
        }
    }

    (
        StatusCode::OK,
        success_to_api_response(EmptyResponse {}),
    )
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> impl IntoResponse {
    if req.new_password.len() < 6 || req.new_password.len() > 72 {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "password must be between 6 and 72 characters".to_string(),
            ),
        );
    }

    let email = match validate_code(&req.code, state.config.code_expiration(), &state.config) {
        Ok(email) => email,
        Err(CodeError::Expired) => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::CODE_EXPIRED,
                    "Code has expired. Please try and reset your password again".to_string(),
                ),
            );
        }
        Err(CodeError::Invalid) => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::CODE_INVALID,
                    "Code is not valid. Please try and reset your password again".to_string(),
                ),
            );
        }
    };

    // 签名有效还不够，必须与当前存储的找回码一致，被新码顶掉的旧码在这里被拒
    let user = match User::find_by_email_and_recovery_code(&state.pool, &email, &req.code).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::CODE_INVALID,
                    "Code is not valid. Please try and reset your password again".to_string(),
                ),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            );
        }
    };

    let password_hash = match hash_password(&req.new_password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to reset password".to_string(),
                ),
            );
        }
    };

    match User::reset_password(&state.pool, user.id, &password_hash).await {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response(EmptyResponse {}),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> impl IntoResponse {
    let email = match validate_code(&req.code, state.config.code_expiration(), &state.config) {
        Ok(email) => email,
        Err(CodeError::Expired) => {
            return (
                StatusCode::GONE,
                error_to_api_response(
                    error_codes::CODE_EXPIRED,
                    "Code has expired. Please try again".to_string(),
                ),
            );
        }
        Err(CodeError::Invalid) => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::CODE_INVALID,
                    "Code is not valid. Please try again".to_string(),
                ),
            );
        }
    };

    match User::mark_verified(&state.pool, &email).await {
        Ok(Some(user)) => {
            tracing::info!("Email verified for {}", user.email);
            (
                StatusCode::OK,
                success_to_api_response(EmptyResponse {}),
            )
        }
        Ok(None) => (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::CODE_INVALID,
                "Code is not valid. Please try again".to_string(),
            ),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

/// 中间件已完成校验，这里直接返回解析出的用户
#[axum::debug_handler]
pub async fn check_token(Extension(user): Extension<User>) -> impl IntoResponse {
    (StatusCode::OK, success_to_api_response(UserInfo::from(user)))
}
