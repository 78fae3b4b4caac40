//! Round image sources.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Shown when no image source could produce a reference.
pub const PLACEHOLDER_IMAGE_URL: &str = "placeholder:cat";

pub const DEFAULT_CAT_API_URL: &str = "https://api.thecatapi.com/v1/images/search";

#[derive(Debug, Error)]
pub enum ImageSourceError {
    #[error("image request failed: {0}")]
    Transport(String),
    #[error("image source returned HTTP {0}")]
    Status(u16),
    #[error("image source returned no images")]
    Empty,
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_image_reference(&self) -> Result<String, ImageSourceError>;
}

/// TheCatAPI search endpoint.
pub struct CatApiImageSource {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct CatImage {
    url: String,
}

impl CatApiImageSource {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ImageSourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImageSourceError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl ImageSource for CatApiImageSource {
    async fn fetch_image_reference(&self) -> Result<String, ImageSourceError> {
        let mut req = self
            .client
            .get(&self.url)
            .query(&[("size", "med"), ("mime_types", "jpg,png"), ("limit", "1")]);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ImageSourceError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ImageSourceError::Status(resp.status().as_u16()));
        }

        let images: Vec<CatImage> = resp
            .json()
            .await
            .map_err(|e| ImageSourceError::Transport(e.to_string()))?;
        images
            .into_iter()
            .next()
            .map(|img| img.url)
            .ok_or(ImageSourceError::Empty)
    }
}

/// Cycles through a fixed list of references. Used offline and in tests.
pub struct StaticImageSource {
    urls: Vec<String>,
    next: std::sync::atomic::AtomicUsize,
}

impl StaticImageSource {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            next: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageSource for StaticImageSource {
    async fn fetch_image_reference(&self) -> Result<String, ImageSourceError> {
        if self.urls.is_empty() {
            return Err(ImageSourceError::Empty);
        }
        let idx = self
            .next
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(self.urls[idx % self.urls.len()].clone())
    }
}
