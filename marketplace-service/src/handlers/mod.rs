pub mod admin;
pub mod bookings;
pub mod health;
pub mod metrics;
pub mod packages;
pub mod users;

use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::dtos::MessageResponse;

pub async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse::new("Route not found")),
    )
}
