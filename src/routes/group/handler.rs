use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    routes::user::User,
    utils::{EmptyResponse, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{
    AvailableGuest, GroupDetail, Guest, Invitation, InvitationGroup, InvitationType, ResponseType,
};

#[derive(Debug, Deserialize)]
pub struct GroupIdQuery {
    pub group_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct CodeQuery {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub code: String,
    pub invitation: CreateInvitationPayload,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvitationPayload {
    #[serde(rename = "type")]
    pub invitation_type: InvitationType,
    #[serde(default)]
    pub plus_one: bool,
}

#[derive(Debug, Deserialize)]
pub struct PatchGroupRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub invitation: Option<PatchInvitationPayload>,
}

#[derive(Debug, Deserialize)]
pub struct PatchInvitationPayload {
    pub response: Option<ResponseType>,
    #[serde(rename = "type")]
    pub invitation_type: Option<InvitationType>,
    pub requirements: Option<String>,
    pub locked: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AddGuestRequest {
    pub group_id: i32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveGuestRequest {
    pub group_id: i32,
    pub guest_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct RelateGuestRequest {
    pub group_id: i32,
    pub guest_id: i32,
    pub user_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct UnrelateGuestRequest {
    pub group_id: i32,
    pub guest_id: i32,
}

/// 注册页用：按注册码查组，只暴露未认领的席位名
#[derive(Debug, Serialize)]
pub struct GroupByCodeResponse {
    pub id: i32,
    pub name: String,
    pub registration_code: String,
    pub guests: Vec<AvailableGuest>,
}

#[axum::debug_handler]
pub async fn all_groups(State(state): State<AppState>) -> impl IntoResponse {
    match InvitationGroup::all(&state.pool).await {
        Ok(groups) => (StatusCode::OK, success_to_api_response(groups)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn create_group(
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() || req.code.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "name and code are required".to_string(),
            ),
        );
    }

    match InvitationGroup::create(
        &state.pool,
        &req.name,
        &req.code,
        req.invitation.invitation_type,
        req.invitation.plus_one,
    )
    .await
    {
        Ok(group) => (StatusCode::CREATED, success_to_api_response(group)),
        Err(e) => {
            if e.to_string().contains("unique constraint") {
                return (
                    StatusCode::CONFLICT,
                    error_to_api_response(
                        error_codes::ALREADY_EXISTS,
                        format!("A group named '{}' already exists", req.name),
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
pub async fn find_by_registration_code(
    State(state): State<AppState>,
    Query(query): Query<CodeQuery>,
) -> impl IntoResponse {
    let group = match InvitationGroup::find_by_code(&state.pool, &query.code).await {
        Ok(Some(group)) => group,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::NOT_FOUND,
                    format!(
                        "Group with invitation code '{}' doesn't exist. Please check and try again",
                        query.code
                    ),
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

    match Guest::unclaimed_by_group(&state.pool, group.id).await {
        Ok(guests) => {
            let available = guests
                .into_iter()
                .map(|g| AvailableGuest { id: g.id, name: g.name })
                .collect::<Vec<_>>();
            (
                StatusCode::OK,
                success_to_api_response(GroupByCodeResponse {
                    id: group.id,
                    name: group.friendly_name,
                    registration_code: group.group_code,
                    guests: available,
                }),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn get_group(
    State(state): State<AppState>,
    Query(query): Query<GroupIdQuery>,
) -> impl IntoResponse {
    let group = match InvitationGroup::find_by_id(&state.pool, query.group_id).await {
        Ok(Some(group)) => group,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::NOT_FOUND,
                    format!("Group '{}' does not exist", query.group_id),
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

    let invitation = match Invitation::find_by_group(&state.pool, group.id).await {
        Ok(Some(invitation)) => invitation,
        Ok(None) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    format!("Group '{}' has no invitation", query.group_id),
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

    match Guest::list_by_group(&state.pool, group.id).await {
        Ok(guests) => (
            StatusCode::OK,
            success_to_api_response(GroupDetail {
                id: group.id,
                name: group.friendly_name,
                registration_code: group.group_code,
                invitation,
                guests,
            }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn patch_group(
    State(state): State<AppState>,
    Query(query): Query<GroupIdQuery>,
    Json(req): Json<PatchGroupRequest>,
) -> impl IntoResponse {
    let updated = match InvitationGroup::update(
        &state.pool,
        query.group_id,
        req.name.as_deref(),
        req.code.as_deref(),
    )
    .await
    {
        Ok(Some(group)) => group,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::NOT_FOUND,
                    format!("Group '{}' does not exist", query.group_id),
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

    if let Some(inv) = &req.invitation {
        if let Err(e) = Invitation::admin_update(
            &state.pool,
            updated.id,
            inv.response,
            inv.invitation_type,
            inv.requirements.as_deref(),
            inv.locked,
        )
        .await
        {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            );
        }
    }

    (StatusCode::OK, success_to_api_response(updated))
}

#[axum::debug_handler]
pub async fn delete_group(
    State(state): State<AppState>,
    Query(query): Query<GroupIdQuery>,
) -> impl IntoResponse {
    match InvitationGroup::delete(&state.pool, query.group_id).await {
        Ok(0) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(
                error_codes::NOT_FOUND,
                format!("Group '{}' does not exist", query.group_id),
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

#[axum::debug_handler]
pub async fn add_guest(
    State(state): State<AppState>,
    Json(req): Json<AddGuestRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "A guest name is required".to_string(),
            ),
        );
    }

    match InvitationGroup::find_by_id(&state.pool, req.group_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::NOT_FOUND,
                    format!("Group '{}' does not exist", req.group_id),
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

    match Guest::create(&state.pool, req.group_id, &req.name).await {
        Ok(guest) => (StatusCode::CREATED, success_to_api_response(guest)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn remove_guest(
    State(state): State<AppState>,
    Json(req): Json<RemoveGuestRequest>,
) -> impl IntoResponse {
    let guest = match Guest::find_by_id(&state.pool, req.guest_id).await {
        Ok(Some(guest)) if guest.group_id == req.group_id => guest,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::NOT_FOUND,
                    format!("Guest with id '{}' does not exist", req.guest_id),
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

    match Guest::delete(&state.pool, guest.id).await {
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

/// 把注册账号关联到席位
#[axum::debug_handler]
pub async fn relate_guest(
    State(state): State<AppState>,
    Json(req): Json<RelateGuestRequest>,
) -> impl IntoResponse {
    let guest = match Guest::find_by_id(&state.pool, req.guest_id).await {
        Ok(Some(guest)) if guest.group_id == req.group_id => guest,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::NOT_FOUND,
                    format!("Guest with id '{}' does not exist", req.guest_id),
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

    match User::find_by_id(&state.pool, req.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::NOT_FOUND,
                    format!("User with id '{}' does not exist", req.user_id),
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

    match Guest::set_user(&state.pool, guest.id, Some(req.user_id)).await {
        Ok(Some(guest)) => (StatusCode::OK, success_to_api_response(guest)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(
                error_codes::NOT_FOUND,
                format!("Guest with id '{}' does not exist", req.guest_id),
            ),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn unrelate_guest(
    State(state): State<AppState>,
    Json(req): Json<UnrelateGuestRequest>,
) -> impl IntoResponse {
    let guest = match Guest::find_by_id(&state.pool, req.guest_id).await {
        Ok(Some(guest)) if guest.group_id == req.group_id => guest,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(
                    error_codes::NOT_FOUND,
                    format!("Guest with id '{}' does not exist", req.guest_id),
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

    if guest.user_id.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                format!("Guest '{}' has no related user", guest.name),
            ),
        );
    }

    match Guest::set_user(&state.pool, guest.id, None).await {
        Ok(Some(guest)) => (StatusCode::OK, success_to_api_response(guest)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(
                error_codes::NOT_FOUND,
                format!("Guest with id '{}' does not exist", req.guest_id),
            ),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}
