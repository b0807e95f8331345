use axum::{
    extract::{multipart::Field, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::packages::{ImageUpload, PackageForm, PackageListParams, PackageMessageResponse};
use crate::dtos::MessageResponse;
use crate::middleware::AuthUser;
use crate::models::ItineraryDay;
use crate::AppState;

pub async fn list_packages(
    State(state): State<AppState>,
    Query(params): Query<PackageListParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.packages.list(params.status).await?))
}

pub async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.packages.get(&id).await?))
}

pub async fn list_seller_packages(
    State(state): State<AppState>,
    Path(seller_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.packages.list_by_seller(&seller_id).await?))
}

pub async fn create_package(
    State(state): State<AppState>,
    caller: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_package_form(multipart).await?;
    let package = state.packages.create(&caller, form).await?;
    Ok((
        StatusCode::CREATED,
        Json(PackageMessageResponse {
            message: "Package added successfully".to_string(),
            package,
        }),
    ))
}

pub async fn edit_package(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_package_form(multipart).await?;
    let package = state.packages.edit(&caller, &id, form).await?;
    Ok(Json(PackageMessageResponse {
        message: "Package updated successfully".to_string(),
        package,
    }))
}

pub async fn delete_package(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.packages.delete(&caller, &id).await?;
    Ok(Json(MessageResponse::new("Package deleted successfully")))
}

/// Collect the package form. List fields arrive either as one JSON array
/// string or as repeated parts; `images` parts carry the files.
async fn read_package_form(mut multipart: Multipart) -> Result<PackageForm, AppError> {
    let mut form = PackageForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field
            .name()
            .unwrap_or_default()
            .trim_end_matches("[]")
            .to_string();

        match name.as_str() {
            "images" => form.images.push(read_image(field).await?),
            "title" => form.title = Some(read_text(field).await?),
            "description" => form.description = Some(read_text(field).await?),
            "price" => form.price = Some(read_text(field).await?),
            "duration" => form.duration = Some(read_text(field).await?),
            "location" => form.location = Some(read_text(field).await?),
            "highlights" => push_list_value(&mut form.highlights, read_text(field).await?)?,
            "includes" => push_list_value(&mut form.includes, read_text(field).await?)?,
            "itinerary" => form.itinerary = parse_itinerary(&read_text(field).await?)?,
            other => tracing::debug!(field = %other, "Ignoring package form field"),
        }
    }

    Ok(form)
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::bad_request(format!("Failed to read form field: {}", e)))
}

async fn read_image(field: Field<'_>) -> Result<ImageUpload, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::bad_request(format!("Failed to read file bytes: {}", e)))?
        .to_vec();

    Ok(ImageUpload {
        file_name,
        content_type,
        data,
    })
}

fn push_list_value(list: &mut Option<Vec<String>>, value: String) -> Result<(), AppError> {
    let trimmed = value.trim();
    if trimmed.starts_with('[') {
        let parsed: Vec<String> = serde_json::from_str(trimmed)
            .map_err(|_| AppError::bad_request("List fields must be a JSON array of strings"))?;
        list.get_or_insert_with(Vec::new).extend(parsed);
    } else if !trimmed.is_empty() {
        list.get_or_insert_with(Vec::new).push(trimmed.to_string());
    } else {
        list.get_or_insert_with(Vec::new);
    }
    Ok(())
}

fn parse_itinerary(raw: &str) -> Result<Option<Vec<ItineraryDay>>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|_| AppError::bad_request("Itinerary must be a JSON array"))
}
