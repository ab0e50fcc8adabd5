//! Reads a user-selected plain-text file into memory.

use std::path::Path;

use crate::error::IngestError;

/// Extensions accepted as `text/plain`.
const TEXT_EXTENSIONS: &[&str] = &["txt", "text"];

/// Read `path` as UTF-8 text, refusing anything that is not a plain-text file
/// or is larger than `max_bytes`.
pub async fn read_text_file(path: &Path, max_bytes: u64) -> Result<String, IngestError> {
    if !is_plain_text(path) {
        return Err(IngestError::UnsupportedFileType {
            path: path.to_path_buf(),
            reason: "expected a .txt file".to_string(),
        });
    }

    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(IngestError::UnsupportedFileType {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }
    if metadata.len() > max_bytes {
        return Err(IngestError::PayloadTooLarge {
            size: metadata.len(),
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await?;
    let text = String::from_utf8(bytes).map_err(|_| IngestError::UnsupportedFileType {
        path: path.to_path_buf(),
        reason: "content is not valid UTF-8 text".to_string(),
    })?;

    tracing::debug!(path = %path.display(), bytes = text.len(), "Read text file");
    Ok(text)
}

pub fn is_plain_text(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TEXT_EXTENSIONS.iter().any(|t| ext.eq_ignore_ascii_case(t)))
        .unwrap_or(false)
}
