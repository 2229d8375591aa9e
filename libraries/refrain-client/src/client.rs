//! Main Refrain client.

use crate::error::{ClientError, Result};
use crate::likes::LikesClient;
use crate::types::{ClientConfig, LikeKey};
use refrain_core::Catalog;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Client for the catalog document and the likes API.
///
/// The catalog is public; likes need an access token.
#[derive(Clone)]
pub struct RefrainClient {
    http: Client,
    config: Arc<RwLock<ClientConfig>>,
}

impl RefrainClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let url = config.url.trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        url::Url::parse(&url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        let catalog_path = if config.catalog_path.starts_with('/') {
            config.catalog_path
        } else {
            format!("/{}", config.catalog_path)
        };

        let normalized_config = ClientConfig {
            url,
            access_token: config.access_token.filter(|t| !t.is_empty()),
            catalog_path,
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Refrain/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(RwLock::new(normalized_config)),
        })
    }

    /// Get the server URL.
    pub async fn url(&self) -> String {
        self.config.read().await.url.clone()
    }

    /// Check if the client has an access token.
    pub async fn is_authenticated(&self) -> bool {
        self.config.read().await.access_token.is_some()
    }

    /// Set the access token (e.g., after signing in elsewhere).
    pub async fn set_token(&self, access_token: String) {
        self.config.write().await.access_token = Some(access_token);
    }

    /// Clear the stored token.
    pub async fn logout(&self) {
        self.config.write().await.access_token = None;
        info!("Logged out");
    }

    /// Fetch and parse the catalog document.
    ///
    /// Loaded whole, no pagination, no authentication.
    pub async fn fetch_catalog(&self) -> Result<Catalog> {
        let config = self.config.read().await;
        let url = format!("{}{}", config.url, config.catalog_path);
        drop(config);

        debug!(url = %url, "Fetching catalog");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            let catalog = Catalog::from_json(&body).map_err(|e| {
                ClientError::ParseError(format!("Failed to parse catalog: {}", e))
            })?;

            info!(
                artist = %catalog.artist(),
                albums = catalog.albums().len(),
                "Fetched catalog"
            );

            Ok(catalog)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(ClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }

    /// Load the user's liked tracks.
    pub async fn likes(&self) -> Result<Vec<LikeKey>> {
        let (url, token) = self.authenticated().await?;
        LikesClient::new(&self.http, &url, &token).list().await
    }

    /// Make the remote like state match `liked`.
    ///
    /// "Already liked" and "nothing to remove" both count as success.
    pub async fn set_liked(&self, key: LikeKey, liked: bool) -> Result<()> {
        let (url, token) = self.authenticated().await?;
        let likes = LikesClient::new(&self.http, &url, &token);

        if liked {
            let outcome = likes.like(key).await?;
            debug!(?outcome, "Like settled");
        } else {
            let outcome = likes.unlike(key).await?;
            debug!(?outcome, "Unlike settled");
        }
        Ok(())
    }

    /// Sub-client for the likes endpoints.
    ///
    /// Returns `AuthRequired` without a token.
    pub async fn likes_client(&self) -> Result<LikesClientHandle> {
        let (url, token) = self.authenticated().await?;
        Ok(LikesClientHandle {
            http: self.http.clone(),
            base_url: url,
            access_token: token,
        })
    }

    async fn authenticated(&self) -> Result<(String, String)> {
        let config = self.config.read().await;
        match &config.access_token {
            Some(token) => Ok((config.url.clone(), token.clone())),
            None => {
                warn!("Likes API needs an access token");
                Err(ClientError::AuthRequired)
            }
        }
    }
}

/// Owned handle for the likes API.
pub struct LikesClientHandle {
    http: Client,
    base_url: String,
    access_token: String,
}

impl LikesClientHandle {
    /// Get a reference to the likes client.
    pub fn client(&self) -> LikesClient<'_> {
        LikesClient::new(&self.http, &self.base_url, &self.access_token)
    }
}
