use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::resumes::local::{read_resume, sanitize_filename, save_upload};
use crate::state::AppState;
use crate::storage::check_upload_size;

#[derive(Deserialize)]
pub struct ResumeUrlQuery {
    pub id: Option<String>,
}

#[derive(Serialize)]
pub struct ResumeUrlResponse {
    pub url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

struct UploadedFile {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

/// POST /upload
///
/// Multipart fields: `file` (required) and `directory` (optional). With a
/// directory the file goes to object storage under that prefix; without one
/// it is written to the local upload directory.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut directory: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("directory") => {
                directory = Some(field.text().await?);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("No file received.".to_string()))?;
    let file_name = sanitize_filename(file.file_name.as_deref());

    let url = match directory.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(directory) => Some(
            state
                .storage
                .upload(
                    directory,
                    &file_name,
                    file.data,
                    file.content_type.as_deref(),
                )
                .await?,
        ),
        None => {
            check_upload_size(file.data.len(), state.storage.max_upload_bytes())?;
            save_upload(&state.config.upload_dir, &file_name, &file.data).await?;
            None
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully".to_string(),
            file_name,
            url,
        }),
    ))
}

/// GET /resume-url?id=
pub async fn handle_resume_url(
    State(state): State<AppState>,
    Query(params): Query<ResumeUrlQuery>,
) -> Result<Json<ResumeUrlResponse>, AppError> {
    let id = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("No ID provided".to_string()))?;

    let key = state
        .storage
        .find_document(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("No resume found".to_string()))?;

    let url = state
        .storage
        .signed_link(&key, state.config.signed_url_expiry())
        .await?;
    info!("Generated signed URL for {key}");

    Ok(Json(ResumeUrlResponse { url }))
}

/// GET /resume/:id
/// Serves `<resumes_dir>/<id>.pdf` inline.
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = read_resume(&state.config.resumes_dir, &id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "inline"),
        ],
        bytes,
    ))
}
