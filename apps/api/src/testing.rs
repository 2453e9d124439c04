//! In-memory stand-ins for the external services, used by unit and router tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::TempDir;

use crate::config::Config;
use crate::errors::AppError;
use crate::notify::{Notification, Notifier, ViewerContact};
use crate::records::{strip_key_fields, Attributes, RecordKey, RecordStore, EMAIL_FIELD, ID_FIELD};
use crate::state::AppState;
use crate::storage::{ObjectStore, StorageGateway};

pub const ADMIN_TOKEN: &str = "admin-token";

pub fn test_config() -> Config {
    Config {
        aws_region: "us-east-1".to_string(),
        aws_access_key_id: "AKIDEXAMPLE".to_string(),
        aws_secret_access_key: "secret".to_string(),
        s3_bucket: "ingress.example".to_string(),
        s3_endpoint: None,
        email_user: "sender@example.com".to_string(),
        email_password: "app-password".to_string(),
        recipient_email: "owner@example.com".to_string(),
        smtp_host: "smtp.example.com".to_string(),
        smtp_port: 587,
        database_url: "postgres://localhost/gate".to_string(),
        record_table: "viewers".to_string(),
        signed_url_expiry_secs: 3600,
        max_upload_mb: 10,
        upload_dir: PathBuf::from("uploads"),
        resumes_dir: PathBuf::from("resumes"),
        request_timeout_secs: 5,
        port: 8080,
        rust_log: "debug".to_string(),
        admin_token: Some(ADMIN_TOKEN.to_string()),
    }
}

pub fn viewer_contact() -> ViewerContact {
    ViewerContact {
        email: "recruiter@acme.io".to_string(),
        company: "Acme".to_string(),
        phone: "5551234567".to_string(),
        where_we_met: "conference".to_string(),
        position: "Staff Engineer".to_string(),
        resume_id: Some("42".to_string()),
    }
}

/// One-shot failure switch shared by the fakes.
#[derive(Default)]
struct FailNext(Mutex<Option<String>>);

impl FailNext {
    fn set(&self, message: &str) {
        *self.0.lock().unwrap() = Some(message.to_string());
    }

    fn take(&self) -> Option<String> {
        self.0.lock().unwrap().take()
    }
}

struct StoredObject {
    body: Bytes,
    content_type: Option<String>,
}

/// Bucket kept in a sorted map, so listings come back in key order like S3.
pub struct MemoryObjectStore {
    bucket: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    calls: AtomicUsize,
    fail: FailNext,
}

impl MemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Mutex::new(BTreeMap::new()),
            calls: AtomicUsize::new(0),
            fail: FailNext::default(),
        }
    }

    /// Seeds an object without counting as a store call.
    pub fn insert(&self, key: &str, body: &[u8]) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body: Bytes::copy_from_slice(body),
                content_type: None,
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .and_then(|o| o.content_type.clone())
    }

    /// Number of trait calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, message: &str) {
        self.fail.set(message);
    }

    fn enter(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail.take() {
            Some(message) => Err(AppError::Storage(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), AppError> {
        self.enter()?;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, AppError> {
        self.enter()?;
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| AppError::NotFound(format!("No object at {key}")))
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        self.enter()?;
        Ok(self.contains(key))
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        self.enter()?;
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        self.enter()?;
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    /// Only echoes the expiry back; real SigV4 output is checked in `storage::s3`.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, AppError> {
        self.enter()?;
        Ok(format!(
            "https://{}.s3.amazonaws.com/{}?X-Amz-Expires={}&X-Amz-Signature=fake",
            self.bucket,
            key,
            expires_in.as_secs()
        ))
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://{}.s3.amazonaws.com/{}", self.bucket, key)
    }
}

#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<(String, String), Attributes>>,
    writes: AtomicUsize,
    fail: FailNext,
}

impl MemoryRecordStore {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, message: &str) {
        self.fail.set(message);
    }

    fn check(&self) -> Result<(), AppError> {
        match self.fail.take() {
            Some(message) => Err(AppError::Internal(anyhow::anyhow!(message))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, item: &Attributes) -> Result<(), AppError> {
        self.check()?;
        let key = RecordKey::from_item(item)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .insert((key.id, key.email), item.clone());
        Ok(())
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<Attributes>, AppError> {
        self.check()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(key.id.clone(), key.email.clone()))
            .cloned())
    }

    async fn update(&self, key: &RecordKey, updates: &Attributes) -> Result<(), AppError> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        let record = records
            .entry((key.id.clone(), key.email.clone()))
            .or_insert_with(|| {
                let mut item = Attributes::new();
                item.insert(ID_FIELD.to_string(), key.id.clone().into());
                item.insert(EMAIL_FIELD.to_string(), key.email.clone().into());
                item
            });
        for (name, value) in strip_key_fields(updates) {
            record.insert(name, value);
        }
        Ok(())
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), AppError> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .remove(&(key.id.clone(), key.email.clone()));
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<Attributes>, AppError> {
        self.check()?;
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    async fn query_by_id(&self, id: &str) -> Result<Vec<Attributes>, AppError> {
        self.check()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|((record_id, _), _)| record_id == id)
            .map(|(_, item)| item.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: FailNext,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next(&self, message: &str) {
        self.fail.set(message);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), AppError> {
        if let Some(message) = self.fail.take() {
            return Err(AppError::Email(message));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Fakes plus a scratch directory for local uploads and resumes.
pub struct TestHarness {
    pub objects: Arc<MemoryObjectStore>,
    pub records: Arc<MemoryRecordStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub config: Config,
    _scratch: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_max_upload_mb(10)
    }

    pub fn with_max_upload_mb(max_upload_mb: u64) -> Self {
        let scratch = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.max_upload_mb = max_upload_mb;
        config.upload_dir = scratch.path().join("uploads");
        config.resumes_dir = scratch.path().join("resumes");
        std::fs::create_dir_all(&config.resumes_dir).unwrap();

        Self {
            objects: Arc::new(MemoryObjectStore::new(&config.s3_bucket)),
            records: Arc::new(MemoryRecordStore::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            config,
            _scratch: scratch,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    pub fn resumes_dir(&self) -> &Path {
        &self.config.resumes_dir
    }

    pub fn state(&self) -> AppState {
        AppState {
            storage: StorageGateway::new(self.objects.clone(), self.config.max_upload_bytes()),
            records: self.records.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        }
    }
}
