//! Image attachments

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::Result;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const ACCEPTED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageRejection {
    #[error("unsupported image type {0} (use JPEG, PNG, GIF or WEBP)")]
    UnsupportedType(String),
    #[error("image is {size} bytes, the limit is {max}")]
    TooLarge { size: usize, max: usize },
    #[error("image is empty")]
    Empty,
}

/// An image picked for upload
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// Content type guessed from the file name
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.file_name)
            .first_or_octet_stream()
            .to_string()
    }

    pub fn validate(&self) -> std::result::Result<(), ImageRejection> {
        let mime_type = self.mime_type();
        if !ACCEPTED_TYPES.contains(&mime_type.as_str()) {
            return Err(ImageRejection::UnsupportedType(mime_type));
        }
        if self.bytes.is_empty() {
            return Err(ImageRejection::Empty);
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageRejection::TooLarge {
                size: self.bytes.len(),
                max: MAX_IMAGE_BYTES,
            });
        }
        Ok(())
    }
}

/// Where attachments are put; returns the URL stored on the message
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: &ImageUpload) -> Result<String>;
}

/// Stores images on disk named by their blake3 hash
#[derive(Debug, Clone)]
pub struct LocalImageHost {
    root: PathBuf,
}

impl LocalImageHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ImageHost for LocalImageHost {
    async fn upload(&self, image: &ImageUpload) -> Result<String> {
        image.validate()?;

        let hash = blake3::hash(&image.bytes).to_hex();
        let extension = Path::new(&image.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "bin".to_string());
        let path = self.root.join(format!("{}.{}", hash, extension));

        if tokio::fs::try_exists(&path).await? {
            debug!("Image {} already stored", hash);
        } else {
            tokio::fs::create_dir_all(&self.root).await?;
            tokio::fs::write(&path, &image.bytes).await?;
            info!("Stored image {} ({} bytes)", path.display(), image.bytes.len());
        }

        Ok(format!("file://{}", path.display()))
    }
}
