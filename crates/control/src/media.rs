use airport_models::{AirportError, StorageConfig};
use image::ImageFormat;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

pub const AIRPLANE_UPLOAD_DIR: &str = "uploads/airplanes";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const NO_FILE: &str = "No file was submitted.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";

/// Accepted upload formats and the extension each is stored under.
const ACCEPTED_FORMATS: &[(ImageFormat, &str)] = &[
    (ImageFormat::Png, "png"),
    (ImageFormat::Jpeg, "jpg"),
    (ImageFormat::Gif, "gif"),
    (ImageFormat::WebP, "webp"),
];

/// Identify the format from the magic bytes, then decode the whole file so
/// a valid signature in front of corrupted data is rejected too.
/// Returns the file extension to store the image under.
pub fn validate_image(bytes: &[u8]) -> Result<&'static str, AirportError> {
    let invalid = || AirportError::field("image", INVALID_IMAGE);
    let format = image::guess_format(bytes).map_err(|_| invalid())?;
    let extension = ACCEPTED_FORMATS
        .iter()
        .find(|(accepted, _)| *accepted == format)
        .map(|(_, extension)| *extension)
        .ok_or_else(invalid)?;
    image::load_from_memory_with_format(bytes, format).map_err(|e| {
        warn!("Rejected {:?} upload: {}", format, e);
        invalid()
    })?;
    Ok(extension)
}

/// Lowercase ASCII alphanumerics joined by single dashes.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// User uploaded files under the media root.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url: url.into(),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(&storage.media_root, &storage.media_url)
    }

    /// Public URL of a stored relative path.
    pub fn url_for(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }

    /// Write an airplane image and return its path relative to the media root.
    pub async fn save_airplane_image(
        &self,
        airplane_name: &str,
        bytes: &[u8],
    ) -> Result<String, AirportError> {
        if bytes.is_empty() {
            return Err(AirportError::field("image", EMPTY_FILE));
        }
        let owned = bytes.to_vec();
        let extension = tokio::task::spawn_blocking(move || validate_image(&owned))
            .await
            .map_err(|e| AirportError::InternalError {
                reason: format!("Image validation task failed: {}", e),
            })??;

        let slug = slugify(airplane_name);
        let file_name = if slug.is_empty() {
            format!("{}.{}", Uuid::new_v4(), extension)
        } else {
            format!("{}-{}.{}", slug, Uuid::new_v4(), extension)
        };
        let relative = format!("{}/{}", AIRPLANE_UPLOAD_DIR, file_name);

        let directory = self.root.join(AIRPLANE_UPLOAD_DIR);
        tokio::fs::create_dir_all(&directory).await?;
        tokio::fs::write(directory.join(&file_name), bytes).await?;

        info!("Stored airplane image {} ({} bytes)", relative, bytes.len());
        Ok(relative)
    }

    /// Best-effort removal of a replaced file.
    pub async fn remove(&self, relative: &str) {
        let path = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}
