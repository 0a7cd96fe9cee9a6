//! Nyaa provider
//!
//! Nyaa exposes search results as an RSS feed with a `nyaa:` namespace for
//! swarm statistics:
//!
//! ```text
//! https://nyaa.si/?page=rss&q=<query>&c=1_2&f=0&s=seeders&o=desc
//! ```
//!
//! # Preferences
//!
//! - `apiUrl`: site host or URL (default `nyaa.si`)
//! - `category`: category id (default `1_2`, English-translated anime)

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::ProviderContext;
use crate::indexer::aggregate::{filter_by_episode, merge_unique};
use crate::indexer::error::Result;
use crate::indexer::feed::parse_feed_items;
use crate::indexer::normalize::normalize_all;
use crate::indexer::query::build_smart_search_queries;
use crate::indexer::types::{
    ProviderCapabilities, ProviderKind, RawItem, Release, SearchOptions, SmartSearchFilter,
    SmartSearchOptions,
};
use crate::indexer::Provider;

pub const PROVIDER_ID: &str = "nyaa";

const DEFAULT_HOST: &str = "nyaa.si";
const DEFAULT_CATEGORY: &str = "1_2";

/// Turn a host or URL preference into a base URL without trailing slash
pub fn normalize_base_url(raw: &str) -> String {
    let raw = raw.trim();
    let url = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    url.trim_end_matches('/').to_string()
}

/// RSS search client shared by the Nyaa-family providers
pub struct NyaaFeed {
    ctx: ProviderContext,
    provider_id: &'static str,
    default_host: &'static str,
    default_category: &'static str,
    /// Whether the `category` preference is honoured
    category_overridable: bool,
}

impl NyaaFeed {
    pub fn new(
        ctx: ProviderContext,
        provider_id: &'static str,
        default_host: &'static str,
        default_category: &'static str,
        category_overridable: bool,
    ) -> Self {
        Self {
            ctx,
            provider_id,
            default_host,
            default_category,
            category_overridable,
        }
    }

    pub fn context(&self) -> &ProviderContext {
        &self.ctx
    }

    pub fn base_url(&self) -> String {
        let host = self
            .ctx
            .preferences
            .get_non_empty("apiUrl")
            .unwrap_or_else(|| self.default_host.to_string());
        normalize_base_url(&host)
    }

    fn category(&self) -> String {
        if !self.category_overridable {
            return self.default_category.to_string();
        }
        self.ctx
            .preferences
            .get_non_empty("category")
            .unwrap_or_else(|| self.default_category.to_string())
    }

    /// Feed URL for a query, sorted by seeders
    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/?page=rss&q={}&c={}&f=0&s=seeders&o=desc",
            self.base_url(),
            urlencoding::encode(query),
            self.category()
        )
    }

    /// Fetch and extract raw feed items for one query
    pub async fn fetch_items(&self, query: &str) -> Result<Vec<RawItem>> {
        let url = self.search_url(query);
        debug!(provider = self.provider_id, url = %url, "Fetching feed");

        let body = self.ctx.http.get_text(&url).await?;
        Ok(parse_feed_items(&body))
    }

    /// Run one query and normalize the results, degrading to empty on error
    pub async fn search(&self, query: &str) -> Vec<Release> {
        match self.fetch_items(query).await {
            Ok(items) => {
                let releases = normalize_all(items, self.ctx.parser.as_ref());
                info!(
                    provider = self.provider_id,
                    query = %query,
                    count = releases.len(),
                    "Feed search complete"
                );
                releases
            }
            Err(e) => {
                error!(
                    provider = self.provider_id,
                    query = %query,
                    error = %e,
                    "Feed search failed"
                );
                vec![]
            }
        }
    }
}

/// Nyaa, the main anime source
pub struct NyaaProvider {
    feed: NyaaFeed,
}

impl NyaaProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self {
            feed: NyaaFeed::new(ctx, PROVIDER_ID, DEFAULT_HOST, DEFAULT_CATEGORY, true),
        }
    }

    pub fn feed(&self) -> &NyaaFeed {
        &self.feed
    }
}

#[async_trait]
impl Provider for NyaaProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn name(&self) -> &str {
        "Nyaa"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            can_smart_search: true,
            smart_search_filters: vec![
                SmartSearchFilter::Batch,
                SmartSearchFilter::EpisodeNumber,
                SmartSearchFilter::Resolution,
                SmartSearchFilter::Query,
            ],
            supports_adult: false,
            kind: ProviderKind::Main,
        }
    }

    async fn get_latest(&self) -> Vec<Release> {
        self.feed.search("").await
    }

    async fn search(&self, options: &SearchOptions) -> Vec<Release> {
        self.feed.search(&options.query).await
    }

    async fn smart_search(&self, options: &SmartSearchOptions) -> Vec<Release> {
        let queries = build_smart_search_queries(options);
        if queries.is_empty() {
            warn!(provider = PROVIDER_ID, "Smart search could not build queries");
            return vec![];
        }

        info!(provider = PROVIDER_ID, ?queries, "Smart searching");

        let result_sets = join_all(queries.iter().map(|query| async move {
            match self.feed.fetch_items(query).await {
                Ok(items) => items,
                Err(e) => {
                    error!(
                        provider = PROVIDER_ID,
                        query = %query,
                        error = %e,
                        "Smart search sub-query failed"
                    );
                    vec![]
                }
            }
        }))
        .await;

        let merged = merge_unique(result_sets);
        let releases = normalize_all(merged, self.feed.context().parser.as_ref());

        let releases = if options.batch {
            releases
        } else {
            filter_by_episode(
                releases,
                options.episode_number,
                options.media.absolute_offset(),
            )
        };

        info!(
            provider = PROVIDER_ID,
            count = releases.len(),
            "Smart search complete"
        );
        releases
    }

    async fn resolve_magnet_link(&self, release: &Release) -> Result<String> {
        self.feed.context().http.resolve_magnet_link(release).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn provider(prefs: &[(&str, &str)]) -> NyaaProvider {
        let prefs: HashMap<String, String> = prefs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NyaaProvider::new(ProviderContext::new(&Config::default(), Arc::new(prefs)).unwrap())
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("nyaa.si"), "https://nyaa.si");
        assert_eq!(normalize_base_url("https://nyaa.si/"), "https://nyaa.si");
        assert_eq!(normalize_base_url(" http://localhost:8080 "), "http://localhost:8080");
    }

    #[test]
    fn test_default_search_url() {
        let nyaa = provider(&[]);
        assert_eq!(
            nyaa.feed().search_url("frieren 05"),
            "https://nyaa.si/?page=rss&q=frieren%2005&c=1_2&f=0&s=seeders&o=desc"
        );
        assert_eq!(
            nyaa.feed().search_url(""),
            "https://nyaa.si/?page=rss&q=&c=1_2&f=0&s=seeders&o=desc"
        );
    }

    #[test]
    fn test_preferences_override_host_and_category() {
        let nyaa = provider(&[("apiUrl", "nyaa.land/"), ("category", "1_3")]);
        assert_eq!(
            nyaa.feed().search_url("x"),
            "https://nyaa.land/?page=rss&q=x&c=1_3&f=0&s=seeders&o=desc"
        );
    }

    #[test]
    fn test_capabilities() {
        let caps = provider(&[]).capabilities();
        assert!(caps.can_smart_search);
        assert!(caps.supports_filter(SmartSearchFilter::Query));
        assert!(!caps.supports_adult);
        assert_eq!(caps.kind, ProviderKind::Main);
    }
}
