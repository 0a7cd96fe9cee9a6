//! RSS feed item extraction
//!
//! Turns a Nyaa-style RSS document into flat [`RawItem`]s, preserving
//! document order. Namespaced fields (`nyaa:seeders`, `nyaa:size`, ...) are
//! matched on their local name so any provider prefix works.

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, warn};

use super::types::{Provenance, RawItem};

/// Fields we collect from inside an `<item>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    Link,
    Guid,
    PubDate,
    Seeders,
    Leechers,
    Downloads,
    InfoHash,
    Size,
}

impl ItemField {
    fn from_tag(qualified: &[u8], local: &[u8]) -> Option<Self> {
        let is_namespaced = qualified != local;
        match (local, is_namespaced) {
            (b"title", false) => Some(Self::Title),
            (b"link", false) => Some(Self::Link),
            (b"guid", false) => Some(Self::Guid),
            (b"pubDate", false) => Some(Self::PubDate),
            (b"seeders", _) => Some(Self::Seeders),
            (b"leechers", _) => Some(Self::Leechers),
            (b"downloads", _) => Some(Self::Downloads),
            (b"infoHash", _) => Some(Self::InfoHash),
            (b"size", _) => Some(Self::Size),
            _ => None,
        }
    }
}

/// Extract every `<item>` of a feed
///
/// Missing fields become empty strings. Mismatched closing tags are
/// tolerated; an item hit by a parse error is dropped and reading resumes at
/// the next `<item>`. Zero items is a valid result.
pub fn parse_feed_items(content: &str) -> Vec<RawItem> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut items = Vec::new();
    let mut current_item: Option<RawItem> = None;
    let mut current_field: Option<ItemField> = None;
    let mut last_error_at = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                let local = e.local_name();
                if local.as_ref() == b"item" {
                    current_item = Some(RawItem {
                        provenance: Provenance::Feed,
                        ..Default::default()
                    });
                    current_field = None;
                } else if current_item.is_some() {
                    current_field = ItemField::from_tag(name.as_ref(), local.as_ref());
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"item"
                    && let Some(item) = current_item.take()
                {
                    items.push(item);
                }
                current_field = None;
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(item), Some(field)) = (current_item.as_mut(), current_field) {
                    match e.unescape() {
                        Ok(text) => append_field(item, field, &text),
                        Err(err) => {
                            debug!(error = %err, "Keeping raw feed text");
                            append_field(item, field, &String::from_utf8_lossy(&**e));
                        }
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let (Some(item), Some(field)) = (current_item.as_mut(), current_field) {
                    let text = String::from_utf8_lossy(e.as_ref());
                    append_field(item, field, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                let position = reader.buffer_position();
                warn!(position, error = %e, "Error parsing RSS XML, skipping item");
                // No progress since the last error means the reader cannot recover
                if last_error_at == Some(position) {
                    break;
                }
                last_error_at = Some(position);
                current_item = None;
                current_field = None;
            }
            _ => {}
        }
    }

    debug!(count = items.len(), "Parsed items from RSS feed");
    items
}

fn append_field(item: &mut RawItem, field: ItemField, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }

    let slot = match field {
        ItemField::Title => &mut item.title,
        // `link` is the .torrent file, `guid` the human-facing page
        ItemField::Link => &mut item.download_url,
        ItemField::Guid => &mut item.page_link,
        ItemField::PubDate => &mut item.raw_date,
        ItemField::Seeders => &mut item.seeders,
        ItemField::Leechers => &mut item.leechers,
        ItemField::Downloads => &mut item.downloads,
        ItemField::InfoHash => &mut item.info_hash,
        ItemField::Size => &mut item.formatted_size,
    };
    slot.push_str(text);
}
