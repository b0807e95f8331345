use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::packages::PackageMessageResponse;
use crate::dtos::users::UserMessageResponse;
use crate::dtos::MessageResponse;
use crate::models::{AccountStatus, PackageStatus};
use crate::AppState;

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.admin.stats().await?))
}

pub async fn pending_approvals(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.admin.pending_approvals().await?))
}

pub async fn top_packages(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.admin.top_packages().await?))
}

pub async fn approve_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let package = state
        .admin
        .set_package_status(&id, PackageStatus::Approved)
        .await?;
    Ok(Json(PackageMessageResponse {
        message: "Package approved successfully".to_string(),
        package,
    }))
}

pub async fn reject_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let package = state
        .admin
        .set_package_status(&id, PackageStatus::Rejected)
        .await?;
    Ok(Json(PackageMessageResponse {
        message: "Package rejected successfully".to_string(),
        package,
    }))
}

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.admin.list_users().await?))
}

pub async fn block_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.admin.set_user_status(&id, AccountStatus::Blocked).await?;
    Ok(Json(UserMessageResponse {
        message: "User blocked successfully".to_string(),
        user,
    }))
}

pub async fn unblock_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.admin.set_user_status(&id, AccountStatus::Active).await?;
    Ok(Json(UserMessageResponse {
        message: "User unblocked successfully".to_string(),
        user,
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.admin.delete_user(&id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
