use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::{validate_id, validate_pagination};
use super::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, AppState};
use crate::models::{NewVirtualMachine, Pagination, VirtualMachine, VirtualMachinePatch};
use crate::services::Caller;

pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiJson(payload): ApiJson<NewVirtualMachine>,
) -> Result<(StatusCode, Json<ApiResponse<VirtualMachine>>), ApiError> {
    let vm = state.vm_service().create(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(vm))))
}

pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<ApiResponse<Vec<VirtualMachine>>>, ApiError> {
    let page = validate_pagination(page)?;
    let vms = state.vm_service().list(&caller, page).await?;
    Ok(Json(ApiResponse::success(vms)))
}

pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<VirtualMachine>>, ApiError> {
    let id = validate_id(id)?;
    let vm = state.vm_service().get(id, &caller).await?;
    Ok(Json(ApiResponse::success(vm)))
}

pub async fn update_record(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<VirtualMachinePatch>,
) -> Result<Json<ApiResponse<VirtualMachine>>, ApiError> {
    let id = validate_id(id)?;
    let vm = state.vm_service().update(id, &caller, patch).await?;
    Ok(Json(ApiResponse::success(vm)))
}

pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<VirtualMachine>>, ApiError> {
    let id = validate_id(id)?;
    let vm = state.vm_service().delete(id, &caller).await?;
    Ok(Json(ApiResponse::success(vm)))
}
