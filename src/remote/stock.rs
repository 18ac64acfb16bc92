//! Stock-photo search.

use serde::{Deserialize, Serialize};

use crate::config::StockPhotoConfig;
use crate::error::{PixxelError, Result};

/// Results requested per search.
pub const PER_PAGE: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoUrls {
    pub small: String,
    pub regular: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPhoto {
    pub id: String,
    pub urls: PhotoUrls,
    #[serde(default)]
    pub user: serde_json::Value,
    #[serde(default)]
    pub alt_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<StockPhoto>,
}

/// Client for the stock-photo API.
#[derive(Clone)]
pub struct StockPhotoClient {
    client: reqwest::Client,
    config: StockPhotoConfig,
}

impl StockPhotoClient {
    pub fn new(client: reqwest::Client, config: StockPhotoConfig) -> Self {
        Self { client, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.access_key.is_some()
    }

    fn auth_header(&self) -> Option<String> {
        self.config
            .access_key
            .as_ref()
            .map(|key| format!("Client-ID {}", key))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Search photos. A blank query or a missing key yields no results.
    pub async fn search(&self, query: &str) -> Result<Vec<StockPhoto>> {
        let query = query.trim();
        let Some(auth) = self.auth_header() else {
            return Ok(Vec::new());
        };
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let per_page = PER_PAGE.to_string();
        let response = self
            .client
            .get(self.endpoint("/search/photos"))
            .query(&[("query", query), ("per_page", per_page.as_str())])
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| PixxelError::Remote(format!("Failed to search images: {}", e)))?;
        if !response.status().is_success() {
            return Err(PixxelError::Remote(format!(
                "Failed to search images: HTTP {}",
                response.status()
            )));
        }
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| PixxelError::Remote(format!("Malformed search response: {}", e)))?;
        Ok(body.results)
    }

    /// Report a download to the API. Failures are logged and dropped.
    pub async fn track_download(&self, photo_id: &str) {
        let Some(auth) = self.auth_header() else {
            return;
        };
        let url = self.endpoint(&format!("/photos/{}/download", photo_id));
        if let Err(e) = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await
        {
            tracing::debug!(photo_id, error = %e, "Download tracking failed");
        }
    }
}
