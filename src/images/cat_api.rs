//! TheCatAPI client.
//!
//! `GET {base_url}images/search?limit=N`, authenticated with an optional
//! `x-api-key` header. The response is a JSON array of image objects; only
//! `id` and `url` are kept.

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, warn};

use super::ImageSource;
use crate::cards::CardImage;
use crate::core::{Error, ImageSourceConfig, ImageSourceError, Result};

const SEARCH_PATH: &str = "images/search";
const HEADER_API_KEY: &str = "x-api-key";

/// HTTP image source backed by TheCatAPI.
#[derive(Clone, Debug)]
pub struct CatApiClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl CatApiClient {
    /// Build a client from configuration.
    pub fn new(config: &ImageSourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Self::with_client(client, config)
    }

    /// Build on top of an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, config: &ImageSourceConfig) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: search_endpoint(&config.base_url)?,
            api_key: config.api_key.clone(),
        })
    }

    /// The URL searched for images, without query parameters.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, count: usize) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("limit", &count.to_string());
        url
    }
}

#[async_trait]
impl ImageSource for CatApiClient {
    async fn fetch(&self, count: usize) -> std::result::Result<Vec<CardImage>, ImageSourceError> {
        let url = self.request_url(count);
        debug!("Fetching {} images from {}", count, self.endpoint);

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header(HEADER_API_KEY, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Image search failed with status {}", status);
            return Err(ImageSourceError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let images: Vec<CardImage> = serde_json::from_slice(&body)?;
        debug!("Image search returned {} images", images.len());
        Ok(images)
    }
}

/// Resolve `images/search` against the configured base URL.
///
/// A missing trailing slash is added so the last path segment of the base
/// (e.g. `v1`) is kept.
fn search_endpoint(base_url: &str) -> Result<Url> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }

    let base = Url::parse(&base)
        .map_err(|e| Error::config(format!("invalid image_source.base_url {base_url:?}: {e}")))?;
    base.join(SEARCH_PATH)
        .map_err(|e| Error::config(format!("invalid image search URL: {e}")))
}
