//! # Configuration
//!
//! Runtime settings for the editor core and the HTTP service. The CLI in
//! `main.rs` fills these from flags and environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Idle period after the last scene mutation before an autosave is issued.
pub const DEFAULT_AUTOSAVE_DEBOUNCE: Duration = Duration::from_secs(2);

/// Default host of the image transformation service.
pub const DEFAULT_TRANSFORM_HOST: &str = "ik.imagekit.io";

/// Default stock-photo API endpoint.
pub const DEFAULT_STOCK_API_URL: &str = "https://api.unsplash.com";

/// Settings shared by every editing session.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Autosave debounce window.
    pub autosave_debounce: Duration,
    /// Host whose URLs accept `tr=` transformation directives.
    pub transform_host: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_debounce: DEFAULT_AUTOSAVE_DEBOUNCE,
            transform_host: DEFAULT_TRANSFORM_HOST.to_string(),
        }
    }
}

/// Stock-photo search credentials.
#[derive(Debug, Clone)]
pub struct StockPhotoConfig {
    /// API base URL (e.g., "https://api.unsplash.com")
    pub api_url: String,
    /// Client access key. Search is disabled when absent.
    pub access_key: Option<String>,
}

impl Default for StockPhotoConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STOCK_API_URL.to_string(),
            access_key: None,
        }
    }
}

/// A statically configured bearer token and the identity it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub token: String,
    pub name: String,
    pub email: String,
}

impl TokenGrant {
    /// Parse `token=name[:email]`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (token, who) = raw
            .split_once('=')
            .ok_or_else(|| format!("expected token=name[:email], got '{}'", raw))?;
        if token.trim().is_empty() {
            return Err("token must not be empty".to_string());
        }
        let (name, email) = match who.split_once(':') {
            Some((name, email)) => (name, email),
            None => (who, ""),
        };
        Ok(Self {
            token: token.trim().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
        })
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Public base URL used to build media links (e.g., "http://localhost:8080")
    pub public_url: String,
    /// Directory uploaded images are written to.
    pub media_dir: PathBuf,
    /// Optional JSON snapshot file for the project store.
    pub data_file: Option<PathBuf>,
    /// Accepted bearer tokens.
    pub tokens: Vec<TokenGrant>,
    pub editor: EditorConfig,
    pub stock: StockPhotoConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_grant_with_email() {
        let grant = TokenGrant::parse("abc=Ada:ada@example.com").unwrap();
        assert_eq!(grant.token, "abc");
        assert_eq!(grant.name, "Ada");
        assert_eq!(grant.email, "ada@example.com");
    }

    #[test]
    fn test_token_grant_without_email() {
        let grant = TokenGrant::parse("abc=Ada").unwrap();
        assert_eq!(grant.email, "");
    }

    #[test]
    fn test_token_grant_rejects_garbage() {
        assert!(TokenGrant::parse("nope").is_err());
        assert!(TokenGrant::parse("=Ada").is_err());
    }

    #[test]
    fn test_default_debounce_is_two_seconds() {
        assert_eq!(EditorConfig::default().autosave_debounce, Duration::from_secs(2));
    }
}
