//! Image loading for scene elements.

use async_trait::async_trait;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use crate::error::{PixxelError, Result};

/// Anything that can turn an image URL into decoded pixels.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn load(&self, url: &str) -> Result<Arc<RgbaImage>>;
}

/// Loads images over HTTP and keeps every decoded result.
///
/// URLs under the server's own `/media/` prefix are read straight from the
/// media directory.
pub struct HttpImageSource {
    client: reqwest::Client,
    cache: RwLock<HashMap<String, Arc<RgbaImage>>>,
    local_media: Option<(String, PathBuf)>,
}

impl HttpImageSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
            local_media: None,
        }
    }

    /// Build with a default client.
    pub fn with_default_client() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pixxel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PixxelError::Remote(format!("HTTP client error: {}", e)))?;
        Ok(Self::new(client))
    }

    /// Serve `{public_url}/media/...` from `media_dir` instead of the network.
    pub fn with_local_media(mut self, public_url: &str, media_dir: PathBuf) -> Self {
        let prefix = format!("{}/media/", public_url.trim_end_matches('/'));
        self.local_media = Some((prefix, media_dir));
        self
    }

    fn local_path(&self, url: &str) -> Option<PathBuf> {
        let (prefix, dir) = self.local_media.as_ref()?;
        let name = url.strip_prefix(prefix.as_str())?;
        let name = name.split('?').next().unwrap_or(name);
        // Flat directory only.
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return None;
        }
        Some(dir.join(name))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(path) = self.local_path(url) {
            return Ok(tokio::fs::read(&path).await?);
        }
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PixxelError::Remote(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(PixxelError::Remote(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PixxelError::Remote(format!("Failed to read image data: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn load(&self, url: &str) -> Result<Arc<RgbaImage>> {
        if let Some(image) = self.cache.read().await.get(url) {
            return Ok(image.clone());
        }

        let bytes = self.fetch(url).await?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| PixxelError::Image(format!("Failed to decode {}: {}", url, e)))?;
        let image = Arc::new(image.to_rgba8());
        tracing::debug!(url, width = image.width(), height = image.height(), "Loaded image");

        self.cache
            .write()
            .await
            .insert(url.to_string(), image.clone());
        Ok(image)
    }
}

/// In-process image table. Records every URL requested.
#[derive(Default)]
pub struct MemoryImageSource {
    images: Mutex<HashMap<String, Arc<RgbaImage>>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, image: RgbaImage) {
        if let Ok(mut images) = self.images.lock() {
            images.insert(url.into(), Arc::new(image));
        }
    }

    /// URLs passed to [`ImageSource::load`] so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ImageSource for MemoryImageSource {
    async fn load(&self, url: &str) -> Result<Arc<RgbaImage>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        self.images
            .lock()
            .ok()
            .and_then(|images| images.get(url).cloned())
            .ok_or_else(|| PixxelError::Remote(format!("Failed to download {}: HTTP 404", url)))
    }
}
