use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    routes::group::Guest,
    utils::{EmptyResponse, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{MenuCourse, MenuItem};

#[derive(Debug, Deserialize)]
pub struct MenuIdQuery {
    pub id: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateMenuItemRequest {
    pub course: Option<MenuCourse>,
    pub description: Option<String>,
    pub gluten_free: Option<bool>,
    pub vegetarian: Option<bool>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMenuItemRequest {
    pub id: i32,
    pub course: Option<MenuCourse>,
    pub description: Option<String>,
    pub gluten_free: Option<bool>,
    pub vegetarian: Option<bool>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGuestMenuRequest {
    pub guest_id: i32,
    pub starter_id: Option<i32>,
    pub main_id: Option<i32>,
    pub desert_id: Option<i32>,
}

#[axum::debug_handler]
pub async fn get_all(State(state): State<AppState>) -> impl IntoResponse {
    match MenuItem::all(&state.pool).await {
        Ok(items) => (StatusCode::OK, success_to_api_response(items)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn get_item(
    State(state): State<AppState>,
    Query(query): Query<MenuIdQuery>,
) -> impl IntoResponse {
    match MenuItem::find_by_id(&state.pool, query.id).await {
        Ok(Some(item)) => (StatusCode::OK, success_to_api_response(item)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(
                error_codes::NOT_FOUND,
                format!("Menu item with id {} does not exist", query.id),
            ),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateMenuItemRequest>,
) -> impl IntoResponse {
    let Some(course) = req.course else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "The course value is required".to_string(),
            ),
        );
    };
    let Some(description) = req.description.filter(|d| !d.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "The description value is required".to_string(),
            ),
        );
    };
    let Some(gluten_free) = req.gluten_free else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "The gluten_free value is required".to_string(),
            ),
        );
    };
    let Some(vegetarian) = req.vegetarian else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "The vegetarian value is required".to_string(),
            ),
        );
    };

    match MenuItem::create(
        &state.pool,
        course,
        &description,
        gluten_free,
        vegetarian,
        req.additional_info.as_deref(),
    )
    .await
    {
        Ok(item) => (StatusCode::CREATED, success_to_api_response(item)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn update_item(
    State(state): State<AppState>,
    Json(req): Json<UpdateMenuItemRequest>,
) -> impl IntoResponse {
    match MenuItem::update(
        &state.pool,
        req.id,
        req.course,
        req.description.as_deref(),
        req.gluten_free,
        req.vegetarian,
        req.additional_info.as_deref(),
    )
    .await
    {
        Ok(Some(item)) => (StatusCode::OK, success_to_api_response(item)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(
                error_codes::NOT_FOUND,
                format!("Menu item with id {} does not exist", req.id),
            ),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn delete_item(
    State(state): State<AppState>,
    Query(query): Query<MenuIdQuery>,
) -> impl IntoResponse {
    match MenuItem::delete(&state.pool, query.id).await {
        Ok(0) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(
                error_codes::NOT_FOUND,
                format!("Menu item with id {} does not exist", query.id),
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

/// 管理端替宾客改选菜，每个菜品id都按所属菜式校验
#[axum::debug_handler]
pub async fn update_guest_menu(
    State(state): State<AppState>,
    Json(req): Json<UpdateGuestMenuRequest>,
) -> impl IntoResponse {
    match Guest::find_by_id(&state.pool, req.guest_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Guest not found".to_string()),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            );
        }
    }

    let courses = [
        (MenuCourse::Starter, req.starter_id, "starter"),
        (MenuCourse::Main, req.main_id, "main course"),
        (MenuCourse::Desert, req.desert_id, "desert"),
    ];
    for (course, item_id, label) in courses {
        let Some(item_id) = item_id else { continue };
        match MenuItem::find_by_course_and_id(&state.pool, course, item_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return (
                    StatusCode::BAD_REQUEST,
                    error_to_api_response(
                        error_codes::VALIDATION_ERROR,
                        format!("'{}' is not a valid {}", item_id, label),
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

    match Guest::set_courses(
        &state.pool,
        req.guest_id,
        req.starter_id,
        req.main_id,
        req.desert_id,
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
    }
}
