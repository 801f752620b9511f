//! Parallel image fan-out used when a place is submitted with pictures.

use futures_util::stream::{FuturesUnordered, StreamExt};
use log::warn;
use ma_core::models::{ImageFolder, RawImage};
use ma_core::traits::ImageUploader;

/// Uploads every image concurrently and returns the URLs that succeeded, in
/// completion order. A failed upload is logged and skipped; it never aborts
/// the rest of the batch.
pub async fn upload_many(uploader: &dyn ImageUploader, folder: ImageFolder, images: Vec<RawImage>) -> Vec<String> {
    let total = images.len();
    let mut pending: FuturesUnordered<_> = images
        .into_iter()
        .map(|image| uploader.upload(folder, image))
        .collect();

    let mut urls = Vec::with_capacity(total);
    while let Some(result) = pending.next().await {
        match result {
            Ok(url) => urls.push(url),
            Err(err) => warn!("Image upload failed, skipping it: {err:#}"),
        }
    }

    if urls.len() < total {
        warn!("Uploaded {} of {} images", urls.len(), total);
    }
    urls
}
