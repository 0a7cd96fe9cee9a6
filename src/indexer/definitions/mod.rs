//! Provider definitions
//!
//! # Adding a new provider
//!
//! 1. Create a new file in this directory (e.g., `myprovider.rs`)
//! 2. Implement the `Provider` trait for it
//! 3. Add it to `AVAILABLE_PROVIDERS` and `build_provider`

pub mod nyaa;
pub mod seadex;
pub mod sukebei;

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;

use super::Provider;
use super::error::Result;
use super::http::HttpClient;
use super::normalize::ReleaseNameParser;
use super::types::ProviderKind;
use crate::config::{Config, Preferences};
use crate::services::AnimeReleaseParser;

/// Information about an available provider type
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    /// Unique identifier (e.g., "nyaa")
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ProviderKind,
    pub supports_adult: bool,
    /// Default site, overridable with the `apiUrl` preference
    pub site_link: &'static str,
}

/// All built-in providers
pub static AVAILABLE_PROVIDERS: Lazy<Vec<ProviderInfo>> = Lazy::new(|| {
    vec![
        ProviderInfo {
            id: nyaa::PROVIDER_ID,
            name: "Nyaa",
            description: "Public anime torrent index (English-translated category by default)",
            kind: ProviderKind::Main,
            supports_adult: false,
            site_link: "https://nyaa.si",
        },
        ProviderInfo {
            id: sukebei::PROVIDER_ID,
            name: "Nyaa Sukebei",
            description: "Adult section of Nyaa",
            kind: ProviderKind::Special,
            supports_adult: true,
            site_link: "https://sukebei.nyaa.si",
        },
        ProviderInfo {
            id: seadex::PROVIDER_ID,
            name: "SeaDex",
            description: "Curated best releases per title, linked to Nyaa",
            kind: ProviderKind::Special,
            supports_adult: false,
            site_link: seadex::DEFAULT_API_URL,
        },
    ]
});

/// Look up a provider type by id
pub fn get_provider_info(id: &str) -> Option<&'static ProviderInfo> {
    AVAILABLE_PROVIDERS.iter().find(|p| p.id == id)
}

/// Construct a provider instance by id, `None` for unknown ids
pub fn build_provider(id: &str, ctx: ProviderContext) -> Option<Arc<dyn Provider>> {
    let provider: Arc<dyn Provider> = match id {
        nyaa::PROVIDER_ID => Arc::new(nyaa::NyaaProvider::new(ctx)),
        sukebei::PROVIDER_ID => Arc::new(sukebei::SukebeiProvider::new(ctx)),
        seadex::PROVIDER_ID => Arc::new(seadex::SeaDexProvider::new(ctx)),
        _ => return None,
    };
    Some(provider)
}

/// Everything a provider needs from its host
#[derive(Clone)]
pub struct ProviderContext {
    pub http: HttpClient,
    /// Looked up on every request
    pub preferences: Arc<dyn Preferences>,
    pub parser: Arc<dyn ReleaseNameParser>,
    pub enrich_timeout: Duration,
    pub enrich_concurrency: usize,
}

impl ProviderContext {
    pub fn new(config: &Config, preferences: Arc<dyn Preferences>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config.request_timeout, &config.user_agent)?,
            preferences,
            parser: Arc::new(AnimeReleaseParser),
            enrich_timeout: config.enrich_timeout,
            enrich_concurrency: config.enrich_concurrency,
        })
    }

    /// Same context with a different preference source
    pub fn with_preferences(&self, preferences: Arc<dyn Preferences>) -> Self {
        Self {
            preferences,
            ..self.clone()
        }
    }

    pub fn with_parser(self, parser: Arc<dyn ReleaseNameParser>) -> Self {
        Self { parser, ..self }
    }
}
