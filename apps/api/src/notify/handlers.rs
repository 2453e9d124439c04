use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::notify::{render_viewer_notification, ViewerContact};
use crate::records::persist;
use crate::state::AppState;

#[derive(Serialize)]
pub struct NotifyResponse {
    pub message: String,
}

/// POST /notify
/// Records the viewer against the requested resume (when one is named) and
/// emails the owner.
pub async fn handle_notify(
    State(state): State<AppState>,
    payload: Result<Json<ViewerContact>, JsonRejection>,
) -> Result<Json<NotifyResponse>, AppError> {
    let Json(contact) = payload?;
    contact.validate()?;

    if let Some(resume_id) = contact.resume_id() {
        let record = contact.to_record(resume_id, Utc::now());
        let outcome = persist(state.records.as_ref(), record).await?;
        info!("Viewer {} for resume {resume_id}: {outcome:?}", contact.email);
    }

    let notification = render_viewer_notification(&contact);
    state.notifier.send(&notification).await?;

    Ok(Json(NotifyResponse {
        message: "Email sent successfully".to_string(),
    }))
}
