use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DirectoryQuery {
    #[serde(default)]
    pub directory: String,
}

#[derive(Deserialize)]
pub struct FileQuery {
    #[serde(default)]
    pub directory: String,
    pub filename: String,
}

#[derive(Serialize)]
pub struct FileListResponse {
    pub directory: String,
    pub keys: Vec<String>,
}

/// GET /files?directory=
pub async fn handle_list_files(
    State(state): State<AppState>,
    Query(params): Query<DirectoryQuery>,
) -> Result<Json<FileListResponse>, AppError> {
    let keys = state.storage.list(&params.directory).await?;
    Ok(Json(FileListResponse {
        directory: params.directory,
        keys,
    }))
}

/// GET /files/content?directory=&filename=
pub async fn handle_download_file(
    State(state): State<AppState>,
    Query(params): Query<FileQuery>,
) -> Result<impl IntoResponse, AppError> {
    require_filename(&params)?;
    let bytes = state
        .storage
        .download(&params.directory, &params.filename)
        .await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}

/// DELETE /files?directory=&filename=
pub async fn handle_delete_file(
    State(state): State<AppState>,
    Query(params): Query<FileQuery>,
) -> Result<StatusCode, AppError> {
    require_filename(&params)?;
    state
        .storage
        .delete(&params.directory, &params.filename)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn require_filename(params: &FileQuery) -> Result<(), AppError> {
    if params.filename.trim_matches('/').is_empty() {
        return Err(AppError::Validation("filename is required".to_string()));
    }
    Ok(())
}
