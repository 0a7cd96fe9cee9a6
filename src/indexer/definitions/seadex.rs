//! SeaDex provider
//!
//! SeaDex (releases.moe) is a human-curated list of the best release per
//! title. Lookups go by AniList id against its PocketBase records API:
//!
//! ```text
//! GET <api>?page=1&perPage=1&filter=alID%3D%22<id>%22&skipTotal=1&expand=trs
//! ```
//!
//! Entries only carry group, hash and file list, so each accepted entry's
//! Nyaa page is scraped for swarm statistics. A failed scrape leaves that
//! entry at its unscraped baseline.
//!
//! # Preferences
//!
//! - `apiUrl`: records endpoint (default [`DEFAULT_API_URL`])

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use url::Url;

use super::ProviderContext;
use crate::indexer::Provider;
use crate::indexer::aggregate::settle_bounded;
use crate::indexer::error::{ProviderError, Result};
use crate::indexer::normalize::normalize_all;
use crate::indexer::types::{
    MediaDescriptor, ProviderCapabilities, ProviderKind, Provenance, RawItem, Release,
    SearchOptions, SmartSearchOptions,
};

pub const PROVIDER_ID: &str = "seadex";

pub const DEFAULT_API_URL: &str = "https://releases.moe/api/collections/entries/records";

const ACCEPTED_TRACKER: &str = "Nyaa";
const ACCEPTED_HOST: &str = "nyaa.si";
const REDACTED_HASH: &str = "<redacted>";
const UNKNOWN_TITLE: &str = "Unknown Title";

static PANEL_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3.panel-title").expect("valid selector"));
static STAT_LABELS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".panel-body .row div.col-md-1").expect("valid selector"));
static DOWNLOAD_ANCHOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a.card-footer-item[href*="/download/"]"#).expect("valid selector")
});

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordsResponse {
    items: Vec<RecordItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordItem {
    expand: Option<RecordExpand>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordExpand {
    trs: Vec<CuratedTorrent>,
}

/// One torrent attached to a SeaDex entry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CuratedTorrent {
    pub created: String,
    pub url: String,
    pub info_hash: String,
    pub release_group: String,
    pub tracker: String,
    pub files: Vec<CuratedFile>,
    pub dual_audio: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CuratedFile {
    pub length: u64,
}

impl CuratedTorrent {
    /// Hash present, on the accepted tracker, linking to the accepted host
    pub fn is_accepted(&self) -> bool {
        !self.info_hash.is_empty()
            && self.info_hash != REDACTED_HASH
            && self.tracker == ACCEPTED_TRACKER
            && self.url.contains(ACCEPTED_HOST)
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.length).sum()
    }

    /// `[Group] Title`, tagged when dual audio
    pub fn display_name(&self, title: &str) -> String {
        let dual_audio = if self.dual_audio { " [Dual-Audio]" } else { "" };
        format!("[{}] {}{}", self.release_group, title, dual_audio)
    }

    /// Unscraped baseline record
    fn to_raw_item(&self, title: &str) -> RawItem {
        RawItem {
            title: self.display_name(title),
            page_link: self.url.clone(),
            raw_date: self.created.clone(),
            info_hash: self.info_hash.clone(),
            size_hint_bytes: Some(self.total_size()),
            release_group_hint: Some(self.release_group.clone()),
            provenance: Provenance::Curated,
            ..Default::default()
        }
    }
}

/// Statistics scraped from a Nyaa detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailPageStats {
    pub title: Option<String>,
    pub seeders: String,
    pub leechers: String,
    pub downloads: String,
    pub formatted_size: String,
    pub download_url: String,
}

impl DetailPageStats {
    fn apply(self, item: &mut RawItem) {
        if let Some(title) = self.title {
            item.title = title;
        }
        item.seeders = self.seeders;
        item.leechers = self.leechers;
        item.downloads = self.downloads;
        item.formatted_size = self.formatted_size;
        item.download_url = self.download_url;
    }
}

/// Scrape a Nyaa detail page
///
/// Statistic cells are label/value pairs of sibling columns. Relative
/// download links are resolved against `page_url`.
pub fn parse_detail_page(html: &str, page_url: &str) -> DetailPageStats {
    let document = Html::parse_document(html);
    let mut stats = DetailPageStats {
        title: document
            .select(&PANEL_TITLE)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty()),
        ..Default::default()
    };

    for label in document.select(&STAT_LABELS) {
        let Some(value) = label.next_siblings().find_map(ElementRef::wrap) else {
            continue;
        };
        let value = value.text().collect::<String>().trim().to_string();

        match label.text().collect::<String>().trim() {
            "Seeders:" => stats.seeders = value,
            "Leechers:" => stats.leechers = value,
            "Downloads:" => stats.downloads = value,
            "File size:" => stats.formatted_size = value,
            _ => {}
        }
    }

    if let Some(href) = document
        .select(&DOWNLOAD_ANCHOR)
        .next()
        .and_then(|a| a.value().attr("href"))
    {
        stats.download_url = absolute_url(href, page_url);
    }

    stats
}

fn absolute_url(href: &str, base: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    match Url::parse(base).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(e) => {
            debug!(href = %href, base = %base, error = %e, "Could not resolve relative link");
            href.to_string()
        }
    }
}

pub struct SeaDexProvider {
    ctx: ProviderContext,
}

impl SeaDexProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    fn api_url(&self) -> String {
        self.ctx
            .preferences
            .get_non_empty("apiUrl")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Records query for one AniList id
    pub fn records_url(&self, media_id: u64) -> String {
        let filter = format!("alID=\"{}\"", media_id);
        format!(
            "{}?page=1&perPage=1&filter={}&skipTotal=1&expand=trs",
            self.api_url(),
            urlencoding::encode(&filter)
        )
    }

    /// Accepted torrents of the first record for a media id
    async fn fetch_entries(&self, media_id: u64) -> Result<Vec<CuratedTorrent>> {
        let url = self.records_url(media_id);
        debug!(provider = PROVIDER_ID, url = %url, "Fetching records");

        let response: RecordsResponse = self.ctx.http.get_json(&url).await?;

        let Some(record) = response.items.into_iter().next() else {
            info!(provider = PROVIDER_ID, media_id, "No records found");
            return Ok(vec![]);
        };

        let torrents = record.expand.map(|e| e.trs).unwrap_or_default();
        if torrents.is_empty() {
            info!(provider = PROVIDER_ID, media_id, "Record has no torrents attached");
            return Ok(vec![]);
        }

        let total = torrents.len();
        let accepted: Vec<CuratedTorrent> =
            torrents.into_iter().filter(CuratedTorrent::is_accepted).collect();

        debug!(
            provider = PROVIDER_ID,
            media_id,
            total,
            accepted = accepted.len(),
            "Filtered curated torrents"
        );
        Ok(accepted)
    }

    /// Baseline record plus whatever the detail page scrape yields
    async fn enrich(&self, torrent: &CuratedTorrent, title: &str) -> RawItem {
        let mut item = torrent.to_raw_item(title);

        match self
            .ctx
            .http
            .get_text_with_timeout(&torrent.url, self.ctx.enrich_timeout)
            .await
        {
            Ok(html) => parse_detail_page(&html, &torrent.url).apply(&mut item),
            Err(e) => {
                warn!(
                    provider = PROVIDER_ID,
                    url = %torrent.url,
                    timed_out = e.is_timeout(),
                    error = %e,
                    "Failed to scrape detail page, keeping baseline"
                );
            }
        }

        item
    }

    async fn find_releases(&self, media: &MediaDescriptor) -> Result<Vec<Release>> {
        let media_id = media.id.ok_or(ProviderError::MissingMediaId)?;
        let title = media.display_title().unwrap_or(UNKNOWN_TITLE);

        let torrents = self.fetch_entries(media_id).await?;
        let items = settle_bounded(
            torrents
                .into_iter()
                .map(|t| async move { self.enrich(&t, title).await }),
            self.ctx.enrich_concurrency,
        )
        .await;

        Ok(normalize_all(items, self.ctx.parser.as_ref()))
    }

    async fn find_releases_or_empty(&self, media: &MediaDescriptor) -> Vec<Release> {
        match self.find_releases(media).await {
            Ok(releases) => {
                info!(
                    provider = PROVIDER_ID,
                    count = releases.len(),
                    "Curated lookup complete"
                );
                releases
            }
            Err(ProviderError::MissingMediaId) => {
                info!(provider = PROVIDER_ID, "Media ID is missing, cannot search");
                vec![]
            }
            Err(e) => {
                error!(provider = PROVIDER_ID, error = %e, "Curated lookup failed");
                vec![]
            }
        }
    }
}

#[async_trait]
impl Provider for SeaDexProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn name(&self) -> &str {
        "SeaDex"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        // Smart search is advertised for previews; no filters apply
        ProviderCapabilities {
            can_smart_search: true,
            smart_search_filters: vec![],
            supports_adult: false,
            kind: ProviderKind::Special,
        }
    }

    async fn get_latest(&self) -> Vec<Release> {
        vec![]
    }

    async fn search(&self, options: &SearchOptions) -> Vec<Release> {
        self.find_releases_or_empty(&options.media).await
    }

    async fn smart_search(&self, options: &SmartSearchOptions) -> Vec<Release> {
        self.find_releases_or_empty(&options.media).await
    }

    async fn resolve_magnet_link(&self, release: &Release) -> Result<String> {
        self.ctx.http.resolve_magnet_link(release).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Arc;

    const DETAIL_PAGE: &str = r#"
<div class="panel panel-success">
  <div class="panel-heading">
    <h3 class="panel-title">
      [Okay-Subs] Sousou no Frieren S01 (BD 1080p) [Dual-Audio]
    </h3>
  </div>
  <div class="panel-body">
    <div class="row">
      <div class="col-md-1">Category:</div>
      <div class="col-md-5"><a href="/?c=1_2">Anime - English-translated</a></div>
      <div class="col-md-1">Date:</div>
      <div class="col-md-5">2024-04-01 10:00 UTC</div>
    </div>
    <div class="row">
      <div class="col-md-1">Seeders:</div>
      <div class="col-md-5"><span style="color: green;">412</span></div>
      <div class="col-md-1">Leechers:</div>
      <div class="col-md-5"><span style="color: red;">9</span></div>
    </div>
    <div class="row">
      <div class="col-md-1">File size:</div>
      <div class="col-md-5">38.2 GiB</div>
      <div class="col-md-1">Downloads:</div>
      <div class="col-md-5">7,120</div>
    </div>
  </div>
  <div class="panel-footer clearfix">
    <a class="card-footer-item" href="/download/1793001.torrent">Download Torrent</a>
    <a class="card-footer-item" href="magnet:?xt=urn:btih:abc">Magnet</a>
  </div>
</div>"#;

    fn torrent() -> CuratedTorrent {
        CuratedTorrent {
            created: "2024-04-02 12:00:00.000Z".to_string(),
            url: "https://nyaa.si/view/1793001".to_string(),
            info_hash: "abc".to_string(),
            release_group: "Okay-Subs".to_string(),
            tracker: "Nyaa".to_string(),
            files: vec![CuratedFile { length: 1_000 }, CuratedFile { length: 24 }],
            dual_audio: true,
        }
    }

    #[test]
    fn test_parse_detail_page() {
        let stats = parse_detail_page(DETAIL_PAGE, "https://nyaa.si/view/1793001");
        assert_eq!(
            stats,
            DetailPageStats {
                title: Some(
                    "[Okay-Subs] Sousou no Frieren S01 (BD 1080p) [Dual-Audio]".to_string()
                ),
                seeders: "412".to_string(),
                leechers: "9".to_string(),
                downloads: "7,120".to_string(),
                formatted_size: "38.2 GiB".to_string(),
                download_url: "https://nyaa.si/download/1793001.torrent".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_empty_detail_page() {
        assert_eq!(
            parse_detail_page("<html></html>", "https://nyaa.si/view/1"),
            DetailPageStats::default()
        );
    }

    #[test]
    fn test_entry_acceptance() {
        assert!(torrent().is_accepted());

        let redacted = CuratedTorrent {
            info_hash: "<redacted>".to_string(),
            ..torrent()
        };
        let other_tracker = CuratedTorrent {
            tracker: "AB".to_string(),
            ..torrent()
        };
        let other_host = CuratedTorrent {
            url: "https://animetosho.org/view/1".to_string(),
            ..torrent()
        };
        let no_hash = CuratedTorrent {
            info_hash: String::new(),
            ..torrent()
        };

        for rejected in [redacted, other_tracker, other_host, no_hash] {
            assert!(!rejected.is_accepted(), "{:?}", rejected);
        }
    }

    #[test]
    fn test_baseline_record() {
        let item = torrent().to_raw_item("Sousou no Frieren");
        assert_eq!(item.title, "[Okay-Subs] Sousou no Frieren [Dual-Audio]");
        assert_eq!(item.size_hint_bytes, Some(1_024));
        assert_eq!(item.provenance, Provenance::Curated);
        assert_eq!(item.download_url, "");
        assert_eq!(item.seeders, "");

        let single = CuratedTorrent {
            dual_audio: false,
            ..torrent()
        };
        assert_eq!(single.display_name("Title"), "[Okay-Subs] Title");
    }

    #[test]
    fn test_records_response_shape() {
        let json = r#"{
            "page": 1,
            "perPage": 1,
            "items": [{
                "alID": 154587,
                "expand": {
                    "trs": [{
                        "created": "2024-04-02 12:00:00.000Z",
                        "url": "https://nyaa.si/view/1793001",
                        "infoHash": "abc",
                        "releaseGroup": "Okay-Subs",
                        "tracker": "Nyaa",
                        "dualAudio": true,
                        "files": [{"length": 10, "name": "a.mkv"}, {"length": 5, "name": "b.mkv"}]
                    }]
                }
            }]
        }"#;
        let response: RecordsResponse = serde_json::from_str(json).unwrap();
        let trs = &response.items[0].expand.as_ref().unwrap().trs;
        assert_eq!(trs.len(), 1);
        assert_eq!(trs[0].total_size(), 15);
        assert!(trs[0].dual_audio);
    }

    #[test]
    fn test_records_url() {
        let ctx =
            ProviderContext::new(&Config::default(), Arc::new(HashMap::<String, String>::new()))
                .unwrap();
        let seadex = SeaDexProvider::new(ctx);
        assert_eq!(
            seadex.records_url(21),
            "https://releases.moe/api/collections/entries/records?page=1&perPage=1&filter=alID%3D%2221%22&skipTotal=1&expand=trs"
        );
    }

    #[tokio::test]
    async fn test_missing_media_id_is_empty() {
        let ctx =
            ProviderContext::new(&Config::default(), Arc::new(HashMap::<String, String>::new()))
                .unwrap();
        let seadex = SeaDexProvider::new(ctx);
        assert!(seadex.search(&SearchOptions::default()).await.is_empty());
        assert!(seadex.get_latest().await.is_empty());
    }
}
