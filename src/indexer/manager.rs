//! Provider Manager
//!
//! The ProviderManager is responsible for:
//! - Holding the registered provider instances
//! - Fanning searches out across providers
//! - Tagging every release with the provider that found it
//! - Routing magnet resolution back to that provider

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Semaphore;

use super::error::{ProviderError, Result};
use super::types::{Release, SearchOptions, SmartSearchOptions};
use super::Provider;

/// Default maximum concurrent searches per provider
pub const DEFAULT_PROVIDER_CONCURRENCY: usize = 2;

/// Results from a single provider
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSearchResult {
    pub provider_id: String,
    pub provider_name: String,
    pub releases: Vec<Release>,
    pub elapsed_ms: u64,
}

#[derive(Clone, Copy)]
enum SearchKind<'a> {
    Plain(&'a SearchOptions),
    Smart(&'a SmartSearchOptions),
}

/// Registry of provider instances
pub struct ProviderManager {
    providers: RwLock<HashMap<String, Arc<dyn Provider>>>,
    /// Rate limiting semaphores per provider
    rate_limiters: RwLock<HashMap<String, Arc<Semaphore>>>,
    max_concurrent_searches: usize,
}

impl Default for ProviderManager {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDER_CONCURRENCY)
    }
}

impl ProviderManager {
    pub fn new(max_concurrent_searches: usize) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            rate_limiters: RwLock::new(HashMap::new()),
            max_concurrent_searches: max_concurrent_searches.max(1),
        }
    }

    /// Register a provider, replacing any with the same id
    pub fn register(&self, provider: Arc<dyn Provider>) {
        let id = provider.id().to_string();

        tracing::info!(
            provider_id = %id,
            provider_name = %provider.name(),
            "Registered provider"
        );

        self.rate_limiters.write().insert(
            id.clone(),
            Arc::new(Semaphore::new(self.max_concurrent_searches)),
        );
        self.providers.write().insert(id, provider);
    }

    pub fn unregister(&self, provider_id: &str) {
        self.providers.write().remove(provider_id);
        self.rate_limiters.write().remove(provider_id);
    }

    pub fn get_provider(&self, provider_id: &str) -> Option<Arc<dyn Provider>> {
        self.providers.read().get(provider_id).cloned()
    }

    /// Registered providers ordered by id
    pub fn get_all_providers(&self) -> Vec<Arc<dyn Provider>> {
        let mut providers: Vec<_> = self.providers.read().values().cloned().collect();
        providers.sort_by(|a, b| a.id().cmp(b.id()));
        providers
    }

    /// Plain search across every provider
    pub async fn search_all(&self, options: &SearchOptions) -> Vec<ProviderSearchResult> {
        let options = Arc::new(options.clone());
        self.fan_out(|provider, limiter| {
            let options = options.clone();
            async move {
                Self::search_single(provider, SearchKind::Plain(&options), limiter).await
            }
        })
        .await
    }

    /// Smart search across every provider that supports it
    pub async fn smart_search_all(
        &self,
        options: &SmartSearchOptions,
    ) -> Vec<ProviderSearchResult> {
        let options = Arc::new(options.clone());
        self.fan_out(|provider, limiter| {
            let options = options.clone();
            async move {
                if !provider.capabilities().can_smart_search {
                    return None;
                }
                Self::search_single(provider, SearchKind::Smart(&options), limiter).await
            }
        })
        .await
    }

    async fn fan_out<F, Fut>(&self, task: F) -> Vec<ProviderSearchResult>
    where
        F: Fn(Arc<dyn Provider>, Option<Arc<Semaphore>>) -> Fut,
        Fut: std::future::Future<Output = Option<ProviderSearchResult>> + Send + 'static,
    {
        let providers = self.get_all_providers();

        let mut handles = Vec::with_capacity(providers.len());
        for provider in providers {
            let limiter = self.rate_limiters.read().get(provider.id()).cloned();
            handles.push(tokio::spawn(task(provider, limiter)));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Provider search task panicked");
                }
            }
        }

        results
    }

    async fn search_single(
        provider: Arc<dyn Provider>,
        kind: SearchKind<'_>,
        rate_limiter: Option<Arc<Semaphore>>,
    ) -> Option<ProviderSearchResult> {
        let start = Instant::now();

        let _permit = match rate_limiter {
            Some(ref limiter) => Some(limiter.acquire().await.ok()?),
            None => None,
        };

        let mut releases = match kind {
            SearchKind::Plain(options) => provider.search(options).await,
            SearchKind::Smart(options) => provider.smart_search(options).await,
        };

        for release in &mut releases {
            release.provider_id = Some(provider.id().to_string());
        }

        tracing::debug!(
            provider_id = provider.id(),
            count = releases.len(),
            "Provider search finished"
        );

        Some(ProviderSearchResult {
            provider_id: provider.id().to_string(),
            provider_name: provider.name().to_string(),
            releases,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Resolve a release's magnet link with the provider that found it
    pub async fn resolve_magnet_link(&self, release: &Release) -> Result<String> {
        let provider = release
            .provider_id
            .as_deref()
            .and_then(|id| self.get_provider(id))
            .ok_or_else(|| ProviderError::MagnetUnavailable {
                release: release.name.clone(),
                source: Box::new(ProviderError::Parse(format!(
                    "No registered provider for {:?}",
                    release.provider_id
                ))),
            })?;

        provider.resolve_magnet_link(release).await
    }
}
