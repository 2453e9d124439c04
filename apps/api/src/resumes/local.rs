use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::storage::keys::is_valid_identifier;

/// Reduces a client-supplied filename to its final path component.
/// Names that reduce to nothing get a generated `upload-<uuid>` name.
pub fn sanitize_filename(name: Option<&str>) -> String {
    let base = name
        .unwrap_or_default()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "." || base == ".." {
        format!("upload-{}", Uuid::new_v4())
    } else {
        base.to_string()
    }
}

/// Writes `content` to `dir/filename`, creating `dir` if needed.
pub async fn save_upload(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf, AppError> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        AppError::Internal(anyhow::anyhow!(
            "Failed to create upload directory {}: {e}",
            dir.display()
        ))
    })?;

    let path = dir.join(filename);
    tokio::fs::write(&path, content).await.map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Failed to write {}: {e}", path.display()))
    })?;

    info!("Saved {} bytes to {}", content.len(), path.display());
    Ok(path)
}

/// Reads `dir/<id>.pdf`.
pub async fn read_resume(dir: &Path, id: &str) -> Result<Vec<u8>, AppError> {
    if !is_valid_identifier(id) {
        return Err(AppError::Validation(format!("Invalid resume id '{id}'")));
    }

    let path = dir.join(format!("{id}.pdf"));
    debug!("Looking for resume at {}", path.display());

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(AppError::NotFound("PDF not found".to_string()))
        }
        Err(e) => Err(AppError::Internal(anyhow::anyhow!(
            "Failed to read {}: {e}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_plain_name() {
        assert_eq!(sanitize_filename(Some("resume.pdf")), "resume.pdf");
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename(Some("../../etc/passwd")), "passwd");
        assert_eq!(sanitize_filename(Some("C:\\Users\\me\\cv.docx")), "cv.docx");
    }

    #[test]
    fn test_sanitize_generates_name_when_empty() {
        assert!(sanitize_filename(None).starts_with("upload-"));
        assert!(sanitize_filename(Some("dir/")).starts_with("upload-"));
        assert!(sanitize_filename(Some("..")).starts_with("upload-"));
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("uploads");

        let path = save_upload(&dir, "notes.txt", b"hello").await.unwrap();
        assert_eq!(path, dir.join("notes.txt"));
        assert_eq!(std::fs::read(path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_read_resume_found() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("42.pdf"), b"%PDF-1.7").unwrap();

        assert_eq!(read_resume(tmp.path(), "42").await.unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_read_resume_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_resume(tmp.path(), "43").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_read_resume_rejects_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_resume(tmp.path(), "../42").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
