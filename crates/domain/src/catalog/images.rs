//! Product image uploads and the file storage collaborator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DomainError;

/// Accepted upload content types.
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/jpg", "image/webp"];

/// Largest accepted file, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Largest number of files accepted in one upload.
pub const MAX_IMAGES_PER_UPLOAD: usize = 8;

const MAX_SLUG_LEN: usize = 40;

/// An uploaded image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// The file name as sent by the client.
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    fn extension(&self) -> Option<&'static str> {
        match self.content_type.as_str() {
            "image/png" => Some("png"),
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/webp" => Some("webp"),
            _ => None,
        }
    }

    /// Name to store the file under: slugged base name, timestamp, position
    /// in the upload and an extension derived from the content type.
    pub fn stored_name(&self, at: DateTime<Utc>, position: usize) -> Result<String, DomainError> {
        let extension = self.extension().ok_or_else(|| {
            DomainError::invalid(format!("unsupported image type: {}", self.content_type))
        })?;
        let base = match self.file_name.rsplit_once('.') {
            Some((base, _)) if !base.is_empty() => base,
            _ => self.file_name.as_str(),
        };

        Ok(format!(
            "{}-{}-{position}.{extension}",
            slugify(base),
            at.timestamp_millis()
        ))
    }
}

/// Lower-cases a name and collapses every run of non-alphanumeric characters
/// into a single `-`, keeping at most 40 characters.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_gap = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            in_gap = false;
        } else if !in_gap {
            slug.push('-');
            in_gap = true;
        }
    }
    slug.truncate(MAX_SLUG_LEN);

    if slug.trim_matches('-').is_empty() {
        "image".to_string()
    } else {
        slug
    }
}

/// Checks an upload batch against the type, size and count limits.
pub fn validate_uploads(uploads: &[ImageUpload]) -> Result<(), DomainError> {
    if uploads.is_empty() {
        return Err(DomainError::invalid("no images provided"));
    }
    if uploads.len() > MAX_IMAGES_PER_UPLOAD {
        return Err(DomainError::invalid(format!(
            "at most {MAX_IMAGES_PER_UPLOAD} images per upload, got {}",
            uploads.len()
        )));
    }
    for upload in uploads {
        if !ALLOWED_CONTENT_TYPES.contains(&upload.content_type.as_str()) {
            return Err(DomainError::invalid(format!(
                "unsupported image type {} for {} (png, jpg, jpeg, webp)",
                upload.content_type, upload.file_name
            )));
        }
        if upload.bytes.len() > MAX_IMAGE_BYTES {
            return Err(DomainError::invalid(format!(
                "{} exceeds the 5 MiB limit",
                upload.file_name
            )));
        }
    }
    Ok(())
}

/// File storage for product images.
///
/// Stores bytes under a name and returns the URI the image is served from.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<String, DomainError>;

    /// Removes a stored image. Removing a missing image is not an error.
    async fn remove(&self, file_name: &str) -> Result<(), DomainError>;
}
