// Stored, uploaded and tailored resumes plus the job postings they target.
// Upload text extraction lives here; the routes are in handlers.rs.

use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;

pub mod handlers;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    PlainText,
}

impl UploadKind {
    /// Picks the parser from the file extension, falling back to the declared
    /// content type.
    pub fn detect(file_name: &str, content_type: Option<&str>) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();
        match (extension.as_str(), content_type) {
            ("pdf", _) | (_, Some("application/pdf")) => Some(UploadKind::Pdf),
            ("txt" | "md", _) | (_, Some("text/plain" | "text/markdown")) => {
                Some(UploadKind::PlainText)
            }
            _ => None,
        }
    }
}

/// Resume name derived from an upload's file name.
pub fn name_from_file(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .unwrap_or("Uploaded resume")
        .to_string()
}

/// Pulls plain text out of an uploaded resume file.
pub async fn extract_upload_text(
    file_name: &str,
    content_type: Option<&str>,
    data: Bytes,
) -> Result<String, AppError> {
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(
            "File too large. Maximum size is 10MB".to_string(),
        ));
    }

    let kind = UploadKind::detect(file_name, content_type).ok_or_else(|| {
        AppError::Validation("Invalid file type. Only PDF and plain text files are allowed".to_string())
    })?;
    debug!("Extracting {kind:?} upload {file_name} ({} bytes)", data.len());

    let text = match kind {
        UploadKind::PlainText => String::from_utf8(data.to_vec())
            .map_err(|_| AppError::Validation("Text upload is not valid UTF-8".to_string()))?,
        // PDF parsing is CPU-bound.
        UploadKind::Pdf => {
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
                .await
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF extraction: {e}"))
                })?
                .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?
        }
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Validation(
            "No text could be extracted from the upload".to_string(),
        ));
    }
    Ok(text)
}
