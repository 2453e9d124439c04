use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::records::{strip_key_fields, Attributes, RecordKey, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
    /// Record exists and the submission carried no attributes besides the key.
    Unchanged,
}

/// Ensures exactly one record exists for the item's `(id, email)` pair.
///
/// Missing records are created from the full item. Existing records get the
/// item's non-key attributes merged in; attributes the item omits are kept.
///
/// The lookup and the write are separate calls, so two concurrent upserts of
/// a new key can both take the create path. Writers are expected to be
/// single per key.
pub async fn persist(store: &dyn RecordStore, item: Attributes) -> Result<UpsertOutcome, AppError> {
    let key = RecordKey::from_item(&item)?;
    debug!("Persisting record id={} email={}", key.id, key.email);

    if store.get(&key).await?.is_none() {
        store.create(&item).await?;
        info!("Created record id={} email={}", key.id, key.email);
        return Ok(UpsertOutcome::Created);
    }

    let updates = strip_key_fields(&item);
    if updates.is_empty() {
        return Ok(UpsertOutcome::Unchanged);
    }

    store.update(&key, &updates).await?;
    info!(
        "Updated {} attribute(s) on record id={} email={}",
        updates.len(),
        key.id,
        key.email
    );
    Ok(UpsertOutcome::Updated)
}
