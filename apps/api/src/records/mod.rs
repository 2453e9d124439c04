//! Viewer records keyed by `(id, email)`.
//!
//! Records are free-form JSON objects. `id` (resume identifier) and `email`
//! (viewer address) form the composite key; every other top-level attribute
//! is data.

pub mod handlers;
pub mod postgres;
pub mod upsert;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::AppError;

pub use postgres::PgRecordStore;
pub use upsert::{persist, UpsertOutcome};

/// A record: attribute name to JSON value.
pub type Attributes = Map<String, Value>;

pub const ID_FIELD: &str = "id";
pub const EMAIL_FIELD: &str = "email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKey {
    pub id: String,
    pub email: String,
}

impl RecordKey {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }

    /// Reads the key fields out of a record. Both must be non-empty strings.
    pub fn from_item(item: &Attributes) -> Result<Self, AppError> {
        let id = key_field(item, ID_FIELD);
        let email = key_field(item, EMAIL_FIELD);
        match (id, email) {
            (Some(id), Some(email)) => Ok(Self::new(id, email)),
            _ => Err(AppError::Validation(
                "Both id and email are required".to_string(),
            )),
        }
    }
}

fn key_field<'a>(item: &'a Attributes, field: &str) -> Option<&'a str> {
    item.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Copy of `item` without the key fields.
pub fn strip_key_fields(item: &Attributes) -> Attributes {
    item.iter()
        .filter(|(name, _)| name.as_str() != ID_FIELD && name.as_str() != EMAIL_FIELD)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Key-value table of viewer records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Writes the full record, replacing any record with the same key.
    async fn create(&self, item: &Attributes) -> Result<(), AppError>;

    async fn get(&self, key: &RecordKey) -> Result<Option<Attributes>, AppError>;

    /// Sets each attribute in `updates` on the record; attributes not named
    /// keep their current values. Key fields in `updates` are ignored.
    async fn update(&self, key: &RecordKey, updates: &Attributes) -> Result<(), AppError>;

    async fn delete(&self, key: &RecordKey) -> Result<(), AppError>;

    async fn scan(&self) -> Result<Vec<Attributes>, AppError>;

    /// All records sharing the partition identifier.
    async fn query_by_id(&self, id: &str) -> Result<Vec<Attributes>, AppError>;
}
