//! Server-rendered pages. Templates are compiled into the binary and filled
//! with simple `{{NAME}}` substitution; every substituted value is escaped.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

use crate::notify::templates::escape_html;
use crate::state::AppState;
use crate::storage::keys::{is_valid_identifier, updates_directory};

const FORM_PAGE: &str = include_str!("../../assets/form.html");
const UPLOAD_PAGE: &str = include_str!("../../assets/upload.html");
const MISSING_ID_PAGE: &str = include_str!("../../assets/missing_id.html");
const APP_JS: &str = include_str!("../../assets/app.js");
const APP_CSS: &str = include_str!("../../assets/app.css");

const RESUME_MAX_MB: u64 = 5;
const UPDATE_MAX_MB: u64 = 10;

#[derive(Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

struct UploadPage<'a> {
    title: &'a str,
    label: &'a str,
    directory: &'a str,
    accept: &'a str,
    max_mb: u64,
}

fn render(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |page, (name, value)| {
        page.replace(&format!("{{{{{name}}}}}"), &escape_html(value))
    })
}

fn render_upload_page(page: &UploadPage<'_>) -> String {
    let max_mb = page.max_mb.to_string();
    render(
        UPLOAD_PAGE,
        &[
            ("TITLE", page.title),
            ("LABEL", page.label),
            ("DIRECTORY", page.directory),
            ("ACCEPT", page.accept),
            ("MAX_MB", &max_mb),
        ],
    )
}

/// GET /
pub async fn handle_form_page(Query(params): Query<IdQuery>) -> Html<String> {
    let whose = match params.id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => format!("{id}'s"),
        None => "the".to_string(),
    };
    Html(render(FORM_PAGE, &[("WHOSE", &whose)]))
}

/// GET /upload
pub async fn handle_upload_index() -> Redirect {
    Redirect::to("/upload/resume")
}

/// GET /upload/resume
pub async fn handle_resume_upload_page(State(state): State<AppState>) -> Html<String> {
    Html(render_upload_page(&UploadPage {
        title: "Resume Upload",
        label: "Resume",
        directory: "resumes",
        accept: ".pdf,.doc,.docx",
        max_mb: RESUME_MAX_MB.min(state.config.max_upload_mb),
    }))
}

/// GET /upload/update?id=
pub async fn handle_update_upload_page(
    State(state): State<AppState>,
    Query(params): Query<IdQuery>,
) -> impl IntoResponse {
    let Some(id) = params.id.filter(|id| is_valid_identifier(id)) else {
        return (StatusCode::BAD_REQUEST, Html(MISSING_ID_PAGE.to_string()));
    };

    let title = format!("Update Upload for ID: {id}");
    let directory = updates_directory(&id);
    (
        StatusCode::OK,
        Html(render_upload_page(&UploadPage {
            title: &title,
            label: "Update",
            directory: &directory,
            accept: ".pdf,.txt",
            max_mb: UPDATE_MAX_MB.min(state.config.max_upload_mb),
        })),
    )
}

/// GET /assets/app.js
pub async fn handle_app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
}

/// GET /assets/app.css
pub async fn handle_app_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], APP_CSS)
}
