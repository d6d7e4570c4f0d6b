use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    auth::{AuthError, validate_token},
    routes::user::User,
};

/// 客户端通过该请求头携带token，签发方和校验方必须一致
pub const TOKEN_HEADER: &str = "X-API-Token";

/// 校验token并把解析出的用户注入请求扩展，失败一律401
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = request
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthError::MissingToken)?
        .to_string();

    let user = validate_token(&state.pool, &state.config, &token).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// 信任auth_middleware注入的用户，只检查admin标记
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    match request.extensions().get::<User>() {
        Some(user) if user.admin => Ok(next.run(request).await),
        Some(_) => Err(AuthError::Forbidden),
        // 本中间件必须挂在auth_middleware内侧
        None => Err(AuthError::MissingToken),
    }
}
