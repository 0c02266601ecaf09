use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use service::country::domain::{CountryPayload, FlagUpload};
use service::country::service::{COUNTRY_DELETED, FLAG_UPDATED};

use crate::errors::ApiError;
use crate::routes::auth::ServerState;

#[utoipa::path(
    get, path = "/countries", tag = "countries",
    responses((status = 200, description = "All countries"))
)]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<models::country::Model>>, ApiError> {
    let countries = state.countries.list().await?;
    info!(count = countries.len(), "list countries");
    Ok(Json(countries))
}

#[utoipa::path(
    post, path = "/countries", tag = "countries",
    request_body = crate::openapi::CountryInput,
    responses(
        (status = 201, description = "Created"),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CountryPayload>,
) -> Result<(StatusCode, Json<models::country::Model>), ApiError> {
    let created = state.countries.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get, path = "/countries/{id}", tag = "countries",
    params(("id" = Uuid, Path, description = "Country ID")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not Found"))
)]
pub async fn show(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::country::Model>, ApiError> {
    Ok(Json(state.countries.get(id).await?))
}

#[utoipa::path(
    put, path = "/countries/{id}", tag = "countries",
    params(("id" = Uuid, Path, description = "Country ID")),
    request_body = crate::openapi::CountryInput,
    responses(
        (status = 200, description = "Updated"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CountryPayload>,
) -> Result<Json<models::country::Model>, ApiError> {
    Ok(Json(state.countries.update(id, payload).await?))
}

#[utoipa::path(
    delete, path = "/countries/{id}", tag = "countries",
    params(("id" = Uuid, Path, description = "Country ID")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn destroy(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.countries.delete(id).await?;
    Ok(Json(serde_json::json!({ "message": COUNTRY_DELETED })))
}

#[utoipa::path(
    post, path = "/countries/{id}/flag", tag = "flags",
    params(("id" = Uuid, Path, description = "Country ID")),
    responses(
        (status = 200, description = "Flag stored"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn update_flag(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut upload = FlagUpload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    {
        if field.name() == Some("flag") {
            upload.file_name = field.file_name().map(str::to_string);
            upload.content_type = field.content_type().map(str::to_string);
            upload.bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?
                .to_vec();
            break;
        }
    }

    let flag_url = state.countries.update_flag(id, upload).await?;
    Ok(Json(serde_json::json!({ "message": FLAG_UPDATED, "flag_url": flag_url })))
}

#[utoipa::path(
    get, path = "/countries/{id}/flag", tag = "flags",
    params(("id" = Uuid, Path, description = "Country ID")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not Found"))
)]
pub async fn get_flag(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let flag_url = state.countries.get_flag(id).await?;
    Ok(Json(serde_json::json!({ "flag_url": flag_url })))
}
