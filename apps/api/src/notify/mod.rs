//! Viewer notifications: the contact form payload, the email rendered from
//! it, and the transport that delivers it.

pub mod handlers;
pub mod smtp;
pub mod templates;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::records::{Attributes, EMAIL_FIELD, ID_FIELD};

pub use smtp::SmtpNotifier;
pub use templates::render_viewer_notification;

/// Contact details a visitor submits before viewing a resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerContact {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub where_we_met: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub resume_id: Option<String>,
}

impl ViewerContact {
    pub fn validate(&self) -> Result<(), AppError> {
        let missing: Vec<&str> = [
            ("email", &self.email),
            ("company", &self.company),
            ("phone", &self.phone),
            ("whereWeMet", &self.where_we_met),
            ("position", &self.position),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }

    pub fn resume_id(&self) -> Option<&str> {
        self.resume_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Viewer record for this submission, keyed by resume id and viewer email.
    pub fn to_record(&self, resume_id: &str, viewed_at: DateTime<Utc>) -> Attributes {
        let mut item = Attributes::new();
        item.insert(ID_FIELD.to_string(), Value::String(resume_id.to_string()));
        item.insert(EMAIL_FIELD.to_string(), Value::String(self.email.clone()));
        item.insert("company".to_string(), Value::String(self.company.clone()));
        item.insert("phone".to_string(), Value::String(self.phone.clone()));
        item.insert(
            "viewedBy".to_string(),
            json!({
                "position": self.position,
                "whereWeMet": self.where_we_met,
                "viewedAt": viewed_at.to_rfc3339(),
            }),
        );
        item
    }
}

/// A rendered email, ready for any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub plain: String,
    pub html: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Hands the message to the relay. No retries.
    async fn send(&self, notification: &Notification) -> Result<(), AppError>;
}
