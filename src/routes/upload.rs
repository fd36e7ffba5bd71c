use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::routes::auth::AdminSession;
use crate::store::Bucket;
use crate::AppState;

pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024; // 5MB
pub const MAX_DOCUMENT_SIZE: usize = 10 * 1024 * 1024; // 10MB
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub bucket: String,
    pub filename: String,
    pub size: usize,
    pub mime_type: String,
}

fn detect_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: 52 49 46 46 ... 57 45 42 50
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn detect_document(bytes: &[u8]) -> Option<&'static str> {
    // PDF: "%PDF"
    bytes.starts_with(b"%PDF").then_some("application/pdf")
}

/// Content type of `bytes` if the bucket accepts it
pub fn detect_mime(bucket: Bucket, bytes: &[u8]) -> Option<&'static str> {
    if bucket.accepts_documents() {
        detect_document(bytes)
    } else {
        detect_image(bytes)
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

fn sanitize_filename(filename: &str) -> bool {
    // Reject path traversal and special characters
    !filename.is_empty()
        && !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains('\0')
}

fn parse_bucket(bucket: &str) -> ApiResult<Bucket> {
    bucket.parse::<Bucket>().map_err(ApiError::NotFound)
}

/// POST /api/admin/uploads/{bucket}
/// Stores the first multipart file and returns its public URL. Nothing references the
/// file until a record holding the URL is saved.
pub async fn upload_file(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let bucket = parse_bucket(&bucket)?;
    let (allowed, max_size, kind) = if bucket.accepts_documents() {
        (DOCUMENT_EXTENSIONS, MAX_DOCUMENT_SIZE, "PDF")
    } else {
        (IMAGE_EXTENSIONS, MAX_IMAGE_SIZE, "JPEG, PNG, WebP, GIF")
    };

    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => return Err(ApiError::BadRequest("No file provided".to_string())),
        Err(e) => {
            tracing::error!("Multipart error: {}", e);
            return Err(ApiError::BadRequest("Invalid multipart data".to_string()));
        }
    };

    let original_name = field.file_name().unwrap_or("unknown").to_string();
    let original_ext = original_name
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_lowercase();
    if !allowed.contains(&original_ext.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unsupported file type. Allowed: {}.",
            kind
        )));
    }

    let bytes = field.bytes().await.map_err(|e| {
        tracing::error!("Failed to read upload bytes: {}", e);
        ApiError::BadRequest("Failed to read file data".to_string())
    })?;

    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Empty file".to_string()));
    }
    if bytes.len() > max_size {
        return Err(ApiError::BadRequest(format!(
            "File too large. Maximum size is {}MB.",
            max_size / (1024 * 1024)
        )));
    }

    let mime_type = detect_mime(bucket, &bytes).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "File content does not match an allowed type ({}).",
            kind
        ))
    })?;

    let filename = format!("{}.{}", Uuid::new_v4(), extension_for(mime_type));
    let size = bytes.len();
    let url = state.blobs.put(bucket, &filename, bytes.to_vec()).await?;

    tracing::info!(bucket = bucket.name(), "File uploaded: {} ({} bytes)", filename, size);

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url,
            bucket: bucket.name().to_string(),
            filename,
            size,
            mime_type: mime_type.to_string(),
        }),
    ))
}

/// DELETE /api/admin/uploads/{bucket}/{filename}
pub async fn delete_file(
    _session: AdminSession,
    State(state): State<AppState>,
    Path((bucket, filename)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let bucket = parse_bucket(&bucket)?;
    if !sanitize_filename(&filename) {
        return Err(ApiError::BadRequest("Invalid filename".to_string()));
    }

    if !state.blobs.delete(bucket, &filename).await? {
        return Err(ApiError::NotFound("File not found".to_string()));
    }

    tracing::info!(bucket = bucket.name(), "File deleted: {}", filename);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_bytes_per_bucket() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A];
        let pdf = b"%PDF-1.7\n";

        assert_eq!(detect_mime(Bucket::Avatars, &png), Some("image/png"));
        assert_eq!(detect_mime(Bucket::ProjectImages, &png), Some("image/png"));
        assert_eq!(detect_mime(Bucket::Resumes, &png), None);

        assert_eq!(detect_mime(Bucket::Resumes, pdf), Some("application/pdf"));
        assert_eq!(detect_mime(Bucket::Avatars, pdf), None);
    }

    #[test]
    fn test_webp_needs_full_header() {
        let webp = *b"RIFF\x00\x00\x00\x00WEBPVP8 ";
        assert_eq!(detect_image(&webp), Some("image/webp"));
        assert_eq!(detect_image(b"RIFF"), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert!(sanitize_filename("3f2c.png"));
        assert!(!sanitize_filename("../etc/passwd"));
        assert!(!sanitize_filename("a/b.png"));
        assert!(!sanitize_filename(""));
    }
}
