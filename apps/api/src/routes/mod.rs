pub mod auth;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::notify::handlers as notify;
use crate::pages;
use crate::records::handlers as records;
use crate::resumes::handlers as resumes;
use crate::state::AppState;
use crate::storage::handlers as storage;

/// Room for multipart boundaries and the `directory` field on top of the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .storage
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let admin = Router::new()
        .route(
            "/files",
            get(storage::handle_list_files).delete(storage::handle_delete_file),
        )
        .route("/files/content", get(storage::handle_download_file))
        .route(
            "/viewers",
            get(records::handle_list_viewers).put(records::handle_upsert_viewer),
        )
        .route("/viewers/:id/:email", delete(records::handle_delete_viewer))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        // Pages
        .route("/", get(pages::handle_form_page))
        .route("/upload", get(pages::handle_upload_index).post(resumes::handle_upload))
        .route("/upload/resume", get(pages::handle_resume_upload_page))
        .route("/upload/update", get(pages::handle_update_upload_page))
        .route("/assets/app.js", get(pages::handle_app_js))
        .route("/assets/app.css", get(pages::handle_app_css))
        // Resume delivery
        .route("/resume-url", get(resumes::handle_resume_url))
        .route("/resume/:id", get(resumes::handle_get_resume))
        .route("/notify", post(notify::handle_notify))
        .merge(admin)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
