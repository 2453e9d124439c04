use std::sync::Arc;

use crate::config::Config;
use crate::notify::Notifier;
use crate::records::RecordStore;
use crate::storage::StorageGateway;

/// Shared application state injected into all route handlers via Axum extractors.
/// Clients are built once in `main` and passed in here; tests swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub storage: StorageGateway,
    pub records: Arc<dyn RecordStore>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Config,
}
