// ABOUTME: Optional stock photo lookup for slide illustrations
// ABOUTME: Searches Unsplash for a prompt and downloads the first landscape hit

use crate::errors::Result;
use log::{debug, info, warn};
use serde_json::Value;
use std::time::Duration;

const UNSPLASH_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(5);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves an image prompt to raw image bytes. Returning `None` means the
/// slide is exported without a picture; sources never fail an export.
pub trait ImageSource {
    fn resolve(&self, query: &str) -> Option<Vec<u8>>;
}

/// Unsplash-backed image source. Without an access key every lookup
/// degrades to `None`, so image support is strictly opt-in.
pub struct UnsplashImages {
    client: reqwest::blocking::Client,
    access_key: Option<String>,
}

impl UnsplashImages {
    pub fn new(access_key: Option<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        Ok(UnsplashImages { client, access_key })
    }

    fn search_image_url(&self, access_key: &str, query: &str) -> Option<String> {
        let response = match self
            .client
            .get(UNSPLASH_SEARCH_URL)
            .timeout(SEARCH_TIMEOUT)
            .header("Authorization", format!("Client-ID {}", access_key))
            .header("Accept-Version", "v1")
            .query(&[
                ("query", query),
                ("per_page", "1"),
                ("orientation", "landscape"),
                ("content_filter", "high"),
            ])
            .send()
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Image search failed for {:?}: {}", query, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "Image search for {:?} returned status {}",
                query,
                response.status()
            );
            return None;
        }

        let payload: Value = match response.json() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Image search response was not JSON: {}", e);
                return None;
            }
        };

        let url = payload["results"][0]["urls"]["regular"].as_str()?;
        debug!("Image search for {:?} resolved to {}", query, url);
        Some(url.to_string())
    }

    fn download(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.client.get(url).send() {
            Ok(response) => response,
            Err(e) => {
                warn!("Image download failed for {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Image download for {} returned status {}", url, response.status());
            return None;
        }

        match response.bytes() {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                warn!("Could not read image bytes from {}: {}", url, e);
                None
            }
        }
    }
}

impl ImageSource for UnsplashImages {
    fn resolve(&self, query: &str) -> Option<Vec<u8>> {
        let access_key = self.access_key.as_deref()?;
        if query.trim().is_empty() {
            return None;
        }

        let url = self.search_image_url(access_key, query)?;
        let bytes = self.download(&url)?;
        info!("Fetched image for {:?} ({} bytes)", query, bytes.len());
        Some(bytes)
    }
}
