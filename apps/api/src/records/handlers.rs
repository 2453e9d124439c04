use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::records::{persist, Attributes, RecordKey, UpsertOutcome};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ViewerQuery {
    pub id: Option<String>,
}

#[derive(Serialize)]
pub struct UpsertResponse {
    pub outcome: UpsertOutcome,
}

/// GET /viewers?id=
/// Without `id` the whole table is scanned.
pub async fn handle_list_viewers(
    State(state): State<AppState>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<Vec<Attributes>>, AppError> {
    let records = match params.id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => state.records.query_by_id(id).await?,
        None => state.records.scan().await?,
    };
    Ok(Json(records))
}

/// PUT /viewers
pub async fn handle_upsert_viewer(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UpsertResponse>, AppError> {
    let Json(body) = payload?;
    let Value::Object(item) = body else {
        return Err(AppError::Validation(
            "Record must be a JSON object".to_string(),
        ));
    };
    let outcome = persist(state.records.as_ref(), item).await?;
    Ok(Json(UpsertResponse { outcome }))
}

/// DELETE /viewers/:id/:email
pub async fn handle_delete_viewer(
    State(state): State<AppState>,
    Path((id, email)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state.records.delete(&RecordKey::new(id, email)).await?;
    Ok(StatusCode::NO_CONTENT)
}
