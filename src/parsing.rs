//! HTML parsing for Gazelle site log pages.
//!
//! The log is a human-readable HTML page, not an API, so everything here is
//! best effort: lines that do not look like an upload are skipped rather
//! than reported.

use crate::LogEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static TORRENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"torrentid=(\d+)").expect("torrent id pattern"));

static RELEASE_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((.*?)\) \(").expect("release text pattern"));

/// Parser for the site log (`log.php`).
#[derive(Debug, Clone, Default)]
pub struct LogPageParser;

impl LogPageParser {
    pub fn new() -> Self {
        Self
    }

    /// Extract upload entries from one log page, in page order.
    ///
    /// An upload line looks like
    /// `Torrent <a href="torrents.php?torrentid=123">123</a> (Artist - Title) (41.2 MiB) was uploaded by ...`.
    /// The artist and title are a guess: the parenthesised text is split on
    /// `" - "`, and with no separator the whole text is taken as the title.
    pub fn parse_uploads(&self, html: &str) -> Vec<LogEntry> {
        let document = Html::parse_document(html);
        let upload_selector = Selector::parse("span.log_upload").unwrap();

        let entries: Vec<LogEntry> = document
            .select(&upload_selector)
            .filter_map(|span| self.parse_upload_span(&span))
            .collect();

        log::debug!("Parsed {} upload entries from log page", entries.len());
        entries
    }

    fn parse_upload_span(&self, span: &ElementRef) -> Option<LogEntry> {
        let link_selector = Selector::parse("a").unwrap();
        let link = span.select(&link_selector).next()?;

        let href = link.value().attr("href")?;
        let torrent_id = TORRENT_ID.captures(href)?.get(1)?.as_str().to_string();

        let trailing = link.next_sibling()?;
        let trailing: &str = &**trailing.value().as_text()?;
        let release = RELEASE_TEXT.captures(trailing)?.get(1)?.as_str();

        let mut parts = release.split(" - ");
        let first = parts.next().unwrap_or_default();
        let entry = match parts.next() {
            Some(title) => LogEntry::new(torrent_id, first, title),
            None => LogEntry::new(torrent_id, "", first),
        };
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG_PAGE: &str = r#"
        <html><body><table><tbody>
        <tr><td><span class="log_upload">Torrent <a href="torrents.php?torrentid=1001">1001</a> (Burial - Untrue) (120.4 MiB - FLAC / Lossless) was uploaded by someone</span></td></tr>
        <tr><td><span class="log_upload">Torrent <a href="torrents.php?torrentid=1002">1002</a> (Burial - Untrue) (48.0 MiB - MP3 / V0) was uploaded by someone</span></td></tr>
        <tr><td><span class="log_upload">Torrent <a href="torrents.php?torrentid=1003">1003</a> (Selected Ambient Works 85-92) (300 MiB - FLAC) was uploaded by someone</span></td></tr>
        <tr><td><span class="log_upload">Torrent 1004 was deleted by staff</span></td></tr>
        <tr><td><span class="log_upload">Torrent <a href="user.php?id=7">7</a> edited the group</span></td></tr>
        <tr><td><span class="log_other">Torrent <a href="torrents.php?torrentid=1005">1005</a> (A - B) (1 MiB) was edited</span></td></tr>
        </tbody></table></body></html>
    "#;

    #[test]
    fn test_parse_uploads() {
        let entries = LogPageParser::new().parse_uploads(LOG_PAGE);
        assert_eq!(
            entries,
            vec![
                LogEntry::new("1001", "Burial", "Untrue"),
                LogEntry::new("1002", "Burial", "Untrue"),
                LogEntry::new("1003", "", "Selected Ambient Works 85-92"),
            ]
        );
    }

    #[test]
    fn test_garbage_yields_nothing() {
        assert!(LogPageParser::new().parse_uploads("not html at all").is_empty());
        assert!(LogPageParser::new().parse_uploads("").is_empty());
    }
}
