#![allow(dead_code)]
use async_trait::async_trait;
use gazelle_dupe::{
    DupeError, GroupDetail, ReleaseRecord, Result, SearchPage, SearchReleaseData, TorrentRecord,
    TrackerSite,
};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};

pub const BASE_URL: &str = "https://tracker.example";

/// In-memory tracker for driving the dupe check without a network.
///
/// Every call is recorded so tests can assert on what was (and was not)
/// requested. Failures are scripted as a count of calls that fail before the
/// site starts answering normally.
#[derive(Default)]
pub struct FakeSite {
    search_results: HashMap<String, Vec<ReleaseRecord>>,
    failing_searches: Cell<u32>,
    log_pages: Vec<String>,
    failing_log_fetches: Cell<u32>,
    torrent_groups: HashMap<u64, u64>,
    groups: HashMap<u64, GroupDetail>,
    label_pages: HashMap<u32, SearchPage<SearchReleaseData>>,

    pub search_calls: RefCell<Vec<String>>,
    pub log_calls: RefCell<Vec<u32>>,
    pub label_calls: RefCell<Vec<u32>>,
    pub group_calls: RefCell<Vec<u64>>,
    pub resolve_calls: RefCell<Vec<u64>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: &str, results: Vec<ReleaseRecord>) -> Self {
        self.search_results.insert(query.to_string(), results);
        self
    }

    /// The next `count` search requests fail with a transport error.
    pub fn with_failing_searches(self, count: u32) -> Self {
        self.failing_searches.set(count);
        self
    }

    /// Add a log page made of `(torrent_id, "Artist - Title")` upload lines.
    pub fn with_log_page(mut self, uploads: &[(u64, &str)]) -> Self {
        self.log_pages.push(log_page(uploads));
        self
    }

    pub fn with_failing_log_fetches(self, count: u32) -> Self {
        self.failing_log_fetches.set(count);
        self
    }

    pub fn with_torrent(mut self, torrent_id: u64, group_id: u64) -> Self {
        self.torrent_groups.insert(torrent_id, group_id);
        self
    }

    pub fn with_group(mut self, group: GroupDetail) -> Self {
        self.groups.insert(group.group_id, group);
        self
    }

    pub fn with_label_page(mut self, page: u32, results: SearchPage<SearchReleaseData>) -> Self {
        self.label_pages.insert(page, results);
        self
    }

    /// True if any request at all reached the site.
    pub fn was_contacted(&self) -> bool {
        !self.search_calls.borrow().is_empty()
            || !self.log_calls.borrow().is_empty()
            || !self.label_calls.borrow().is_empty()
            || !self.group_calls.borrow().is_empty()
            || !self.resolve_calls.borrow().is_empty()
    }

    fn take_failure(counter: &Cell<u32>) -> bool {
        let remaining = counter.get();
        if remaining > 0 {
            counter.set(remaining - 1);
            true
        } else {
            false
        }
    }
}

#[async_trait(?Send)]
impl TrackerSite for FakeSite {
    fn site_code(&self) -> String {
        "RED".to_string()
    }

    fn base_url(&self) -> String {
        BASE_URL.to_string()
    }

    async fn search(&self, query: &str) -> Result<SearchPage> {
        self.search_calls.borrow_mut().push(query.to_string());
        if Self::take_failure(&self.failing_searches) {
            return Err(DupeError::Http("connection reset by peer".to_string()));
        }
        let results = self.search_results.get(query).cloned().unwrap_or_default();
        Ok(SearchPage {
            results,
            pages: Some(1),
        })
    }

    async fn browse_label(
        &self,
        _label: &str,
        _year: Option<u32>,
        page: u32,
    ) -> Result<SearchPage<SearchReleaseData>> {
        self.label_calls.borrow_mut().push(page);
        Ok(self.label_pages.get(&page).cloned().unwrap_or_default())
    }

    async fn fetch_log_page(&self, page: u32) -> Result<String> {
        self.log_calls.borrow_mut().push(page);
        if Self::take_failure(&self.failing_log_fetches) {
            return Err(DupeError::Http("timed out".to_string()));
        }
        Ok(self
            .log_pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }

    async fn resolve_torrent_group_id(&self, torrent_id: u64) -> Result<u64> {
        self.resolve_calls.borrow_mut().push(torrent_id);
        self.torrent_groups
            .get(&torrent_id)
            .copied()
            .ok_or_else(|| DupeError::RequestFailed(format!("no redirect for torrent {torrent_id}")))
    }

    async fn group_detail(&self, group_id: u64) -> Result<GroupDetail> {
        self.group_calls.borrow_mut().push(group_id);
        self.groups
            .get(&group_id)
            .cloned()
            .ok_or_else(|| DupeError::RequestFailed("bad id parameter".to_string()))
    }
}

/// HTML for a log page with the given upload lines.
pub fn log_page(uploads: &[(u64, &str)]) -> String {
    let rows: String = uploads
        .iter()
        .map(|(id, release)| {
            format!(
                r#"<tr><td><span class="log_upload">Torrent <a href="torrents.php?torrentid={id}">{id}</a> ({release}) (99.1 MiB - FLAC / Lossless) was uploaded by uploader</span></td></tr>"#
            )
        })
        .collect();
    format!("<html><body><table><tbody>{rows}</tbody></table></body></html>")
}

pub fn record(group_id: u64, artist: &str, group_name: &str) -> ReleaseRecord {
    ReleaseRecord {
        group_id,
        artist: artist.to_string(),
        group_name: group_name.to_string(),
        group_year: Some(2007),
        release_type: "Album".to_string(),
        tags: BTreeSet::from(["electronic".to_string()]),
        url: format!("{BASE_URL}/torrents.php?id={group_id}"),
    }
}

pub fn group(group_id: u64, artist: &str, name: &str) -> GroupDetail {
    GroupDetail {
        group_id,
        name: name.to_string(),
        artist: artist.to_string(),
        year: Some(2007),
        record_label: "Hyperdub".to_string(),
        catalogue_number: "HDBCD002".to_string(),
        torrents: vec![TorrentRecord {
            id: group_id * 10,
            media: "CD".to_string(),
            format: "FLAC".to_string(),
            encoding: "Lossless".to_string(),
            remastered: false,
            remaster_year: None,
            remaster_catalogue_number: String::new(),
            remaster_record_label: String::new(),
        }],
    }
}

pub fn release_summary(url: &str, album: &str) -> SearchReleaseData {
    SearchReleaseData {
        lossless: true,
        lossless_web: false,
        year: Some(2007),
        artist: "Burial".to_string(),
        album: album.to_string(),
        release_type: "Album".to_string(),
        url: url.to_string(),
    }
}
