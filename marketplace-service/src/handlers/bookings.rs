use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::bookings::{BookingListResponse, BookingMessageResponse, CreateBookingRequest};
use crate::middleware::AuthUser;
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn create_booking(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.bookings.create(&caller, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookingMessageResponse {
            message: "Booking created successfully".to_string(),
            booking,
        }),
    ))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.bookings.list_all(&caller).await?;
    Ok(Json(BookingListResponse { bookings }))
}

pub async fn get_booking(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.get(&caller, &id).await?))
}

pub async fn list_seller_bookings(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(seller_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state
        .bookings
        .list_for_seller(&caller, &seller_id, false)
        .await?;
    Ok(Json(BookingListResponse { bookings }))
}

pub async fn list_seller_pending_bookings(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(seller_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state
        .bookings
        .list_for_seller(&caller, &seller_id, true)
        .await?;
    Ok(Json(BookingListResponse { bookings }))
}

pub async fn list_tourist_bookings(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(tourist_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.bookings.list_for_tourist(&caller, &tourist_id).await?;
    Ok(Json(BookingListResponse { bookings }))
}

pub async fn approve_booking(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.bookings.approve(&caller, &id).await?;
    Ok(Json(BookingMessageResponse {
        message: "Booking approved".to_string(),
        booking,
    }))
}

pub async fn reject_booking(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.bookings.reject(&caller, &id).await?;
    Ok(Json(BookingMessageResponse {
        message: "Booking rejected".to_string(),
        booking,
    }))
}
