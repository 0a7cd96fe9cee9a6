//! Shared HTTP access for providers
//!
//! Every outbound request is timeout-bounded; a timeout surfaces as a
//! [`ProviderError::Request`] like any other transport failure.

use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::{Client, RequestBuilder};
use scraper::{Html, Selector};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{ProviderError, Result};
use super::types::Release;

static MAGNET_CANDIDATES: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a.card-footer-item, a[href^="magnet:"]"#).expect("valid selector")
});

/// Thin wrapper over a shared [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build a client with a default per-request timeout
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self { client })
    }

    /// GET a page as text
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.send_text(self.client.get(url), url).await
    }

    /// GET a page as text with a tighter timeout than the client default
    pub async fn get_text_with_timeout(&self, url: &str, timeout: Duration) -> Result<String> {
        self.send_text(self.client.get(url).timeout(timeout), url).await
    }

    /// GET and decode a JSON document
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body)
            .map_err(|e| ProviderError::Parse(format!("Invalid JSON from {}: {}", url, e)))
    }

    async fn send_text(&self, request: RequestBuilder, url: &str) -> Result<String> {
        debug!(url = %url, "Fetching");

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    /// Fetch a release's detail page and pull out its magnet link
    ///
    /// A page without one is [`ProviderError::MagnetNotFound`]; any other
    /// failure is wrapped in [`ProviderError::MagnetUnavailable`].
    pub async fn resolve_magnet_link(&self, release: &Release) -> Result<String> {
        let html = match self.get_text(&release.page_link).await {
            Ok(html) => html,
            Err(e) => {
                warn!(
                    url = %release.page_link,
                    error = %e,
                    "Error fetching magnet link"
                );
                return Err(ProviderError::MagnetUnavailable {
                    release: release.name.clone(),
                    source: Box::new(e),
                });
            }
        };

        find_magnet_link(&html).ok_or_else(|| ProviderError::MagnetNotFound {
            release: release.name.clone(),
        })
    }
}

/// First hyperlink on a page whose target uses the magnet scheme
pub fn find_magnet_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&MAGNET_CANDIDATES)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.starts_with("magnet:"))
        .map(str::to_string)
}
