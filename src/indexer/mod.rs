//! Torrent provider system
//!
//! Providers search remote anime indexes and return normalized [`Release`]s.
//!
//! # Architecture
//!
//! - [`Provider`] - the trait every source implements
//! - [`ProviderManager`] - registry and cross-provider fan-out
//! - [`definitions`] - concrete providers (Nyaa, Sukebei, SeaDex)
//!
//! Each source adapts its native format into [`RawItem`]s; [`normalize`]
//! is the only place a [`Release`] is built.

pub mod aggregate;
pub mod definitions;
pub mod error;
pub mod feed;
pub mod http;
pub mod manager;
pub mod normalize;
pub mod query;
pub mod types;
pub mod units;

pub use error::{ProviderError, Result};
pub use manager::ProviderManager;
pub use normalize::{ReleaseMetadata, ReleaseNameParser};
pub use types::*;

use async_trait::async_trait;

/// A torrent source
///
/// `get_latest`, `search` and `smart_search` never fail: internal errors are
/// logged and produce an empty result. Only magnet resolution surfaces errors.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier, e.g. "nyaa"
    fn id(&self) -> &str;

    /// Display name
    fn name(&self) -> &str;

    fn capabilities(&self) -> ProviderCapabilities;

    /// Most recent uploads
    async fn get_latest(&self) -> Vec<Release>;

    /// Search with a caller-supplied query
    async fn search(&self, options: &SearchOptions) -> Vec<Release>;

    /// Search with queries synthesized from the media metadata
    async fn smart_search(&self, options: &SmartSearchOptions) -> Vec<Release>;

    /// Find the magnet link on the release's detail page
    ///
    /// [`ProviderError::is_not_found`] distinguishes a page without a magnet
    /// link from a failed fetch. Callers should treat both as temporary.
    async fn resolve_magnet_link(&self, release: &Release) -> Result<String>;

    fn info_hash(&self, release: &Release) -> String {
        release.info_hash.clone()
    }
}
