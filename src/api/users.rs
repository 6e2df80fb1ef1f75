use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::{validate_id, validate_pagination};
use super::{
    ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, AppState, RegisterRequest, SetActiveRequest,
};
use crate::models::{NewUser, Pagination, User, UserPatch};
use crate::services::Caller;

/// POST /users
/// Public registration; always creates a CLIENT account
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let user = state
        .auth_service()
        .register(NewUser::client(
            payload.email.trim(),
            payload.username.trim(),
            payload.password,
        ))
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// GET /users/me
pub async fn get_current_user(
    Extension(user): Extension<User>,
) -> Json<ApiResponse<User>> {
    Json(ApiResponse::success(user))
}

/// PUT /users/me
pub async fn update_current_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state
        .auth_service()
        .update_profile(caller.id, patch)
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

/// GET /admin/users
/// Superuser only
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let page = validate_pagination(page)?;
    let users = state.auth_service().list_users(&caller, page).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// GET /admin/users/{id}
/// Superuser only
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    if !caller.is_superuser {
        return Err(ApiError::Forbidden);
    }

    let id = validate_id(id)?;
    let user = state.auth_service().get_user(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /admin/users/{id}/active
/// Superuser only
pub async fn set_user_active(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<SetActiveRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id(id)?;
    let user = state
        .auth_service()
        .set_user_active(&caller, id, payload.is_active)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}
