//! Storage key conventions.
//!
//! Keys are `<directory>/<filename>`. The only normalization applied is
//! trimming slashes so that `"/updates/42/"` and `"updates/42"` address the
//! same prefix.

/// Prefix holding per-identifier update documents.
pub const UPDATES_DIR: &str = "updates";

/// Filename looked up first when resolving the document for an identifier.
pub const CANONICAL_DOCUMENT: &str = "resume.pdf";

pub fn clean_directory(directory: &str) -> &str {
    directory.trim_matches('/')
}

pub fn clean_filename(filename: &str) -> &str {
    filename.trim_start_matches('/')
}

/// Joins a directory and filename into an object key.
pub fn build_key(directory: &str, filename: &str) -> String {
    let directory = clean_directory(directory);
    let filename = clean_filename(filename);
    if directory.is_empty() {
        filename.to_string()
    } else {
        format!("{directory}/{filename}")
    }
}

/// Listing prefix for a directory; empty lists the whole bucket.
pub fn list_prefix(directory: &str) -> String {
    let directory = clean_directory(directory);
    if directory.is_empty() {
        String::new()
    } else {
        format!("{directory}/")
    }
}

pub fn updates_directory(id: &str) -> String {
    format!("{UPDATES_DIR}/{id}")
}

/// Identifiers become a single path segment, so separators and traversal
/// sequences are refused.
pub fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty() && !id.contains('/') && !id.contains('\\') && !id.contains("..")
}
