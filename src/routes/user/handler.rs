use axum::{
    extract::{Extension, Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    routes::group::{Guest, GroupDetail, Invitation, InvitationGroup, InvitationType, ResponseType},
    routes::menu::{MenuCourse, MenuItem},
    utils::{EmptyResponse, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{AdminUpdateUserRequest, UpdateProfileRequest, User, UserInfo};

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct FindUserQuery {
    pub q: String,
    pub orphaned: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitInvitationRequest {
    pub invitation: InvitationPayload,
    #[serde(default)]
    pub guests: Vec<GuestPayload>,
}

#[derive(Debug, Deserialize)]
pub struct InvitationPayload {
    pub response: ResponseType,
    pub requirements: Option<String>,
    pub staying_in_house: Option<bool>,
    pub plus_one_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GuestPayload {
    pub id: i32,
    pub is_coming: bool,
    pub first_course: Option<i32>,
    pub main_course: Option<i32>,
    pub desert_course: Option<i32>,
}

#[axum::debug_handler]
pub async fn get_me(Extension(user): Extension<User>) -> impl IntoResponse {
    (StatusCode::OK, success_to_api_response(UserInfo::from(user)))
}

#[axum::debug_handler]
pub async fn patch_me(
    Extension(user): Extension<User>,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    match User::update_profile(&state.pool, user.id, &req).await {
        Ok(updated) => (
            StatusCode::OK,
            success_to_api_response(UserInfo::from(updated)),
        ),
        Err(e) => {
            if e.to_string().contains("unique constraint") {
                return (
                    StatusCode::CONFLICT,
                    error_to_api_response(
                        error_codes::ALREADY_EXISTS,
                        "an account already exists with that email".to_string(),
                    ),
                );
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            )
        }
    }
}

/// 当前用户所属邀请组的全量视图
#[axum::debug_handler]
pub async fn get_invitation(
    Extension(user): Extension<User>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let group_id = match user.group_id {
        Some(group_id) => group_id,
        None => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::NOT_FOUND,
                    "You are not a member of an invitation group".to_string(),
                ),
            );
        }
    };

    match load_group_detail(&state, group_id).await {
        Ok(Some(detail)) => (StatusCode::OK, success_to_api_response(detail)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(
                error_codes::NOT_FOUND,
                "Invitation group does not exist".to_string(),
            ),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn submit_invitation(
    Extension(user): Extension<User>,
    State(state): State<AppState>,
    Json(req): Json<SubmitInvitationRequest>,
) -> impl IntoResponse {
    let group_id = match user.group_id {
        Some(group_id) => group_id,
        None => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::NOT_FOUND,
                    "You are not a member of an invitation group".to_string(),
                ),
            );
        }
    };

    let invitation = match Invitation::find_by_group(&state.pool, group_id).await {
        Ok(Some(invitation)) => invitation,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::NOT_FOUND,
                    "Invitation does not exist".to_string(),
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

    if invitation.locked {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "The invitation has been locked and can no longer be changed".to_string(),
            ),
        );
    }

    // 拒绝出席时不再处理其余字段
    if req.invitation.response == ResponseType::Declined {
        return match Invitation::submit(
            &state.pool,
            group_id,
            ResponseType::Declined,
            None,
            false,
            None,
        )
        .await
        {
            Ok(()) => (
                StatusCode::OK,
                success_to_api_response(EmptyResponse {}),
            ),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            ),
        };
    }

    // 只有住宿型邀请才记录住宿选择
    let staying_in_house = invitation.invitation_type == InvitationType::House
        && req.invitation.staying_in_house.unwrap_or(false);
    let plus_one_name = if invitation.plus_one {
        req.invitation.plus_one_name.as_deref()
    } else {
        None
    };

    if let Err(e) = Invitation::submit(
        &state.pool,
        group_id,
        ResponseType::Confirmed,
        req.invitation.requirements.as_deref(),
        staying_in_house,
        plus_one_name,
    )
    .await
    {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        );
    }

    for guest_req in &req.guests {
        let guest = match Guest::find_by_id(&state.pool, guest_req.id).await {
            Ok(Some(guest)) if guest.group_id == group_id => guest,
            Ok(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    error_to_api_response(
                        error_codes::VALIDATION_ERROR,
                        format!("Guest '{}' does not belong to your invitation", guest_req.id),
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

        if !guest_req.is_coming {
            // 不出席的席位清空选菜
            if let Err(e) = Guest::update_attendance(&state.pool, guest.id, false, None, None, None).await
            {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
                );
            }
            continue;
        }

        let courses = [
            (MenuCourse::Starter, guest_req.first_course),
            (MenuCourse::Main, guest_req.main_course),
            (MenuCourse::Desert, guest_req.desert_course),
        ];
        for (course, item_id) in courses {
            let Some(item_id) = item_id else { continue };
            match MenuItem::find_by_course_and_id(&state.pool, course, item_id).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        error_to_api_response(
                            error_codes::VALIDATION_ERROR,
                            format!("'{}' is not a valid menu choice", item_id),
                        ),
                    );
                }
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
                    );
                }
            }
        }

        if let Err(e) = Guest::update_attendance(
            &state.pool,
            guest.id,
            true,
            guest_req.first_course,
            guest_req.main_course,
            guest_req.desert_course,
        )
        .await
        {
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
pub async fn all_users(State(state): State<AppState>) -> impl IntoResponse {
    match User::all(&state.pool).await {
        Ok(users) => {
            let infos = users.into_iter().map(UserInfo::from).collect::<Vec<_>>();
            (StatusCode::OK, success_to_api_response(infos))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn find_user(
    State(state): State<AppState>,
    Query(query): Query<FindUserQuery>,
) -> impl IntoResponse {
    match User::search(&state.pool, &query.q, query.orphaned.unwrap_or(false)).await {
        Ok(users) => {
            let infos = users.into_iter().map(UserInfo::from).collect::<Vec<_>>();
            (StatusCode::OK, success_to_api_response(infos))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> impl IntoResponse {
    match User::find_by_id(&state.pool, query.user_id).await {
        Ok(Some(user)) => (StatusCode::OK, success_to_api_response(UserInfo::from(user))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(
                error_codes::NOT_FOUND,
                format!("User with ID {} does not exist", query.user_id),
            ),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn patch_user(
    Extension(acting): Extension<User>,
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
    Json(req): Json<AdminUpdateUserRequest>,
) -> impl IntoResponse {
    // 管理员不能改自己的admin标记
    let admin = if acting.id == query.user_id {
        None
    } else {
        req.admin
    };

    match User::update_details(&state.pool, query.user_id, &req, admin).await {
        Ok(Some(user)) => (StatusCode::OK, success_to_api_response(UserInfo::from(user))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(
                error_codes::NOT_FOUND,
                format!("User with ID {} does not exist", query.user_id),
            ),
        ),
        Err(e) => {
            if e.to_string().contains("unique constraint") {
                return (
                    StatusCode::CONFLICT,
                    error_to_api_response(
                        error_codes::ALREADY_EXISTS,
                        "an account already exists with that email".to_string(),
                    ),
                );
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> impl IntoResponse {
    match User::delete(&state.pool, query.user_id).await {
        Ok(0) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(
                error_codes::NOT_FOUND,
                format!("User with ID {} does not exist", query.user_id),
            ),
        ),
        Ok(_) => (
            StatusCode::OK,
            success_to_api_response(EmptyResponse {}),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

async fn load_group_detail(
    state: &AppState,
    group_id: i32,
) -> Result<Option<GroupDetail>, sqlx::Error> {
    let Some(group) = InvitationGroup::find_by_id(&state.pool, group_id).await? else {
        return Ok(None);
    };
    let Some(invitation) = Invitation::find_by_group(&state.pool, group_id).await? else {
        return Ok(None);
    };
    let guests = Guest::list_by_group(&state.pool, group_id).await?;

    Ok(Some(GroupDetail {
        id: group.id,
        name: group.friendly_name,
        registration_code: group.group_code,
        invitation,
        guests,
    }))
}
