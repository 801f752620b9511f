//! # ma-storage-local
//!
//! Local filesystem implementation of `ImageUploader`.
//! Uploads are re-encoded as JPEG (quality 75) and stored under a sharded,
//! content-addressed path, so identical pictures share one file.

use std::path::PathBuf;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use log::debug;
use ma_core::models::{ImageFolder, RawImage};
use ma_core::traits::ImageUploader;
use sha2::{Digest, Sha256};
use tokio::fs;

pub const JPEG_QUALITY: u8 = 75;

pub struct LocalImageStore {
    /// Root directory for all uploads (e.g. "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g. "/static/uploads")
    url_prefix: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root_path: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// "ab/cd/abcd...hash.jpg" relative to the folder.
    fn relative_path(hash: &str) -> String {
        format!("{}/{}/{}.jpg", &hash[0..2], &hash[2..4], hash)
    }
}

fn encode_jpeg(data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let decoded = image::load_from_memory(data)?;
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(decoded.to_rgb8())
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))?;
    Ok(out)
}

#[async_trait]
impl ImageUploader for LocalImageStore {
    async fn upload(&self, folder: ImageFolder, image: RawImage) -> anyhow::Result<String> {
        let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(&image.data)).await??;

        let hash = hex::encode(Sha256::digest(&jpeg));
        let relative = Self::relative_path(&hash);
        let target_path = self.root_path.join(folder.as_str()).join(&relative);

        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if !fs::try_exists(&target_path).await? {
            fs::write(&target_path, &jpeg).await?;
            debug!("Stored {} bytes at {}", jpeg.len(), target_path.display());
        }

        Ok(format!("{}/{}/{}", self.url_prefix, folder.as_str(), relative))
    }
}
