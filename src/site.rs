use crate::parsing::LogPageParser;
use crate::{GroupDetail, LogEntry, Result, SearchPage, SearchReleaseData};
use async_trait::async_trait;

/// The capabilities the dupe check needs from a tracker.
///
/// Everything the dupe-check core knows about a site goes through this trait:
/// searching, browsing by label, reading the upload log, and looking up torrent
/// groups. Implementations are adapters; they absorb whatever naming quirks a
/// particular site's API has and hand back the canonical records from
/// [`crate::types`].
///
/// # Mocking Support
///
/// When the `mock` feature is enabled, this crate provides `MockTrackerSite`
/// that implements this trait using the `mockall` library.
///
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait(?Send)]
pub trait TrackerSite {
    /// Short site code such as `RED` or `OPS`, used in messages.
    fn site_code(&self) -> String;

    /// Site root without a trailing slash.
    fn base_url(&self) -> String;

    /// Run one structured search and return the first page of groups.
    async fn search(&self, query: &str) -> Result<SearchPage>;

    /// Browse a record label's releases, optionally limited to one year.
    async fn browse_label(
        &self,
        label: &str,
        year: Option<u32>,
        page: u32,
    ) -> Result<SearchPage<SearchReleaseData>>;

    /// Raw HTML of one page (1-based) of the site log.
    async fn fetch_log_page(&self, page: u32) -> Result<String>;

    /// Pull upload entries out of a log page. Unparseable lines are skipped.
    fn parse_log_page(&self, html: &str) -> Vec<LogEntry> {
        LogPageParser::new().parse_uploads(html)
    }

    /// Group id that owns the given torrent.
    async fn resolve_torrent_group_id(&self, torrent_id: u64) -> Result<u64>;

    /// Live details of a torrent group, including its torrents.
    async fn group_detail(&self, group_id: u64) -> Result<GroupDetail>;

    /// Link to a group's page.
    fn group_url(&self, group_id: u64) -> String {
        format!("{}/torrents.php?id={group_id}", self.base_url())
    }

    /// Link to a single torrent.
    fn torrent_url(&self, torrent_id: &str) -> String {
        format!("{}/torrents.php?torrentid={torrent_id}", self.base_url())
    }
}
