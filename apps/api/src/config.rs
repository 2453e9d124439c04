use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// S3 refuses presigned requests that live longer than one week.
pub const MAX_SIGNED_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub aws_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub s3_bucket: String,
    /// Custom endpoint (MinIO, localstack). `None` talks to AWS directly.
    pub s3_endpoint: Option<String>,
    pub email_user: String,
    pub email_password: String,
    pub recipient_email: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub database_url: String,
    pub record_table: String,
    pub signed_url_expiry_secs: u64,
    pub max_upload_mb: u64,
    pub upload_dir: PathBuf,
    pub resumes_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
    /// Bearer token for the `/files` and `/viewers` routes. Unset refuses them all.
    pub admin_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        Ok(Config {
            aws_region: env.require("AWS_REGION")?,
            aws_access_key_id: env.require("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: env.require("AWS_SECRET_ACCESS_KEY")?,
            s3_bucket: env.require("S3_BUCKET")?,
            s3_endpoint: env.optional("S3_ENDPOINT"),
            email_user: env.require("EMAIL_USER")?,
            email_password: env.require("EMAIL_PASSWORD")?,
            recipient_email: env.require("RECIPIENT_EMAIL")?,
            smtp_host: env
                .optional("SMTP_HOST")
                .unwrap_or_else(|| "smtp.gmail.com".to_string()),
            smtp_port: env.parse_or("SMTP_PORT", 587)?,
            database_url: env.require("DATABASE_URL")?,
            record_table: env.require("RECORD_TABLE")?,
            signed_url_expiry_secs: env.parse_within(
                "SIGNED_URL_EXPIRY_SECS",
                3600,
                1..=MAX_SIGNED_URL_EXPIRY_SECS,
            )?,
            max_upload_mb: env.parse_within("MAX_UPLOAD_MB", 10, 1..=u64::MAX)?,
            upload_dir: env
                .optional("UPLOAD_DIR")
                .unwrap_or_else(|| "uploads".to_string())
                .into(),
            resumes_dir: env
                .optional("RESUMES_DIR")
                .unwrap_or_else(|| "resumes".to_string())
                .into(),
            request_timeout_secs: env.parse_within("REQUEST_TIMEOUT_SECS", 30, 1..=u64::MAX)?,
            port: env.parse_or("PORT", 8080)?,
            rust_log: env.optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            admin_token: env.optional("ADMIN_TOKEN"),
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.signed_url_expiry_secs)
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.optional(key)
            .with_context(|| format!("Required environment variable '{key}' is not set"))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.optional(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
            None => Ok(default),
        }
    }

    fn parse_within<T>(&self, key: &str, default: T, range: RangeInclusive<T>) -> Result<T>
    where
        T: FromStr + PartialOrd + Display,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let value = self.parse_or(key, default)?;
        if !range.contains(&value) {
            bail!(
                "{key} must be between {} and {}, got {value}",
                range.start(),
                range.end()
            );
        }
        Ok(value)
    }
}
