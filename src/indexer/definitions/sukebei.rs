//! Nyaa Sukebei provider
//!
//! Same feed protocol as Nyaa against the adult site, pinned to the
//! art/anime category. No query synthesis.

use async_trait::async_trait;
use tracing::debug;

use super::ProviderContext;
use super::nyaa::NyaaFeed;
use crate::indexer::Provider;
use crate::indexer::error::Result;
use crate::indexer::types::{
    ProviderCapabilities, ProviderKind, Release, SearchOptions, SmartSearchOptions,
};

pub const PROVIDER_ID: &str = "nyaa-sukebei";

const DEFAULT_HOST: &str = "sukebei.nyaa.si";
const CATEGORY: &str = "1_1";

pub struct SukebeiProvider {
    feed: NyaaFeed,
}

impl SukebeiProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self {
            feed: NyaaFeed::new(ctx, PROVIDER_ID, DEFAULT_HOST, CATEGORY, false),
        }
    }

    pub fn feed(&self) -> &NyaaFeed {
        &self.feed
    }
}

#[async_trait]
impl Provider for SukebeiProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn name(&self) -> &str {
        "Nyaa Sukebei"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            can_smart_search: false,
            smart_search_filters: vec![],
            supports_adult: true,
            kind: ProviderKind::Special,
        }
    }

    async fn get_latest(&self) -> Vec<Release> {
        self.feed.search("").await
    }

    async fn search(&self, options: &SearchOptions) -> Vec<Release> {
        self.feed.search(&options.query).await
    }

    async fn smart_search(&self, _options: &SmartSearchOptions) -> Vec<Release> {
        debug!(provider = PROVIDER_ID, "Smart search not supported");
        vec![]
    }

    async fn resolve_magnet_link(&self, release: &Release) -> Result<String> {
        self.feed.context().http.resolve_magnet_link(release).await
    }
}
