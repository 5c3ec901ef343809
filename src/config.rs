// ABOUTME: Configuration module for the decksmith application
// ABOUTME: Provides configuration settings and environment variable handling

use crate::cache::{DeckCache, MemoryCache, RedisCache};
use crate::errors::{DeckError, Result};
use crate::exporter::ExportConfig;
use crate::images::UnsplashImages;
use crate::llm::OpenRouterClient;
use log::warn;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "openrouter/auto";
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
pub const DEFAULT_TEMPLATE_PATH: &str = "templates/base_template.pptx";
pub const DEFAULT_DOWNLOADS_DIR: &str = "downloads";

/// Global configuration for the application
pub struct Config {
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub llm_timeout_ms: u64,
    pub cache_backend: String,
    pub cache_ttl_secs: u64,
    pub redis_url: String,
    pub unsplash_access_key: Option<String>,
    pub template_path: PathBuf,
    pub downloads_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            openrouter_model: DEFAULT_MODEL.to_string(),
            llm_timeout_ms: 20000, // 20 seconds
            cache_backend: "memory".to_string(),
            cache_ttl_secs: 3600, // 1 hour
            redis_url: DEFAULT_REDIS_URL.to_string(),
            unsplash_access_key: None,
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            downloads_dir: PathBuf::from(DEFAULT_DOWNLOADS_DIR),
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let openrouter_api_key = env::var("OPENROUTER_API_KEY").ok();
        let openrouter_model =
            env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let llm_timeout_ms = env::var("LLM_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(20000);
        let cache_backend =
            env::var("CACHE_BACKEND").unwrap_or_else(|_| "memory".to_string());
        let cache_ttl_secs = env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(3600);
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());
        let unsplash_access_key = env::var("UNSPLASH_ACCESS_KEY").ok();
        let template_path = env::var("TEMPLATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TEMPLATE_PATH));
        let downloads_dir = env::var("DOWNLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DOWNLOADS_DIR));

        Self {
            openrouter_api_key,
            openrouter_model,
            llm_timeout_ms,
            cache_backend,
            cache_ttl_secs,
            redis_url,
            unsplash_access_key,
            template_path,
            downloads_dir,
        }
    }

    /// Build the configured cache backend. Unknown backend names fall back
    /// to the in-process cache with a warning.
    pub fn build_cache(&self) -> Result<Box<dyn DeckCache>> {
        let ttl = Duration::from_secs(self.cache_ttl_secs);
        match self.cache_backend.as_str() {
            "redis" => Ok(Box::new(RedisCache::new(&self.redis_url, ttl)?)),
            "memory" => Ok(Box::new(MemoryCache::new(ttl))),
            other => {
                warn!("Unknown cache backend {:?}, using memory", other);
                Ok(Box::new(MemoryCache::new(ttl)))
            }
        }
    }

    /// Build a generator against the configured OpenRouter account.
    pub fn build_generator(&self) -> Result<OpenRouterClient> {
        let api_key = self
            .openrouter_api_key
            .as_deref()
            .ok_or(DeckError::MissingApiKey)?;
        OpenRouterClient::new(
            api_key,
            self.openrouter_model.clone(),
            Duration::from_millis(self.llm_timeout_ms),
        )
    }

    /// Build the configured image source.
    pub fn build_image_source(&self) -> Result<UnsplashImages> {
        UnsplashImages::new(self.unsplash_access_key.clone())
    }

    /// Get an export configuration, with an optional template override
    pub fn get_export_config(&self, template_path: Option<PathBuf>) -> ExportConfig {
        ExportConfig {
            template_path: template_path.unwrap_or_else(|| self.template_path.clone()),
        }
    }
}
