//! Provider error taxonomy

use thiserror::Error;

/// Errors raised inside providers
///
/// Only magnet resolution lets these reach callers; every other façade
/// operation logs them and degrades to an empty result.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network-level error, including timeouts
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status
    #[error("{url} returned HTTP {status}")]
    HttpStatus { status: u16, url: String },

    /// A response could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// The detail page has no magnet-scheme hyperlink
    #[error("Magnet link not found on page for: {release}")]
    MagnetNotFound { release: String },

    /// Magnet resolution failed for another reason
    #[error("Could not fetch magnet link for: {release}")]
    MagnetUnavailable {
        release: String,
        #[source]
        source: Box<ProviderError>,
    },

    /// Curated lookups need an external media identifier
    #[error("Media ID is missing")]
    MissingMediaId,
}

impl ProviderError {
    /// True for the explicit "no magnet on page" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::MagnetNotFound { .. })
    }

    /// True when the underlying transport timed out
    pub fn is_timeout(&self) -> bool {
        match self {
            ProviderError::Request(e) => e.is_timeout(),
            ProviderError::MagnetUnavailable { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T, E = ProviderError> = std::result::Result<T, E>;
