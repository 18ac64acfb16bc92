//! Server state.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::remote::{HttpImageSource, StockPhotoClient};
use crate::store::{Identity, MemoryStore};

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<MemoryStore>,
    /// Loads scene images. Our own `/media` URLs are read straight from disk.
    pub images: Arc<HttpImageSource>,
    pub stock: StockPhotoClient,
    /// Bearer token → identity.
    tokens: HashMap<String, Identity>,
}

impl AppState {
    /// Build state for `config`, opening the snapshot file when one is set.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let store = match &config.data_file {
            Some(path) => MemoryStore::open(path).await?,
            None => MemoryStore::new(),
        };
        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(config: ServerConfig, store: Arc<MemoryStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pixxel/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let images = HttpImageSource::new(client.clone())
            .with_local_media(&config.public_url, config.media_dir.clone());
        let stock = StockPhotoClient::new(client, config.stock.clone());
        let tokens = config
            .tokens
            .iter()
            .map(|grant| {
                let mut identity = Identity::new(grant.token.clone()).with_name(grant.name.clone());
                if !grant.email.is_empty() {
                    identity = identity.with_email(grant.email.clone());
                }
                (grant.token.clone(), identity)
            })
            .collect();
        Ok(Self {
            config,
            store,
            images: Arc::new(images),
            stock,
            tokens,
        })
    }

    /// Identity for a bearer token, if the token is known.
    pub fn identity_for(&self, token: &str) -> Option<&Identity> {
        self.tokens.get(token)
    }

    /// Public URL of a file stored under the media directory.
    pub fn media_url(&self, relative: &str) -> String {
        format!(
            "{}/media/{}",
            self.config.public_url.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }
}
