//! Adapters from Gazelle `ajax.php` JSON to the crate's canonical records.
//!
//! Gazelle forks disagree on small things: `artist` versus `artists`,
//! `torrents` versus `torrent`, release types as names versus numeric codes.
//! Everything in this module exists to flatten those differences before the
//! dupe-check code sees a record.

use crate::{
    DupeError, GroupDetail, ReleaseRecord, Result, SearchPage, SearchReleaseData, TorrentRecord,
};
use scraper::Html;
use serde::de::DeserializeOwned;
use serde::Deserialize;

// =============================================================================
// Envelope
// =============================================================================

/// Every `ajax.php` response is wrapped in `{"status": ..., "response": ...}`.
///
/// The response body is left as raw JSON until the status has been checked:
/// failure envelopes sometimes carry an empty list where the body would be.
#[derive(Deserialize)]
pub struct ApiEnvelope {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub response: serde_json::Value,
}

/// Unwrap an `ajax.php` body.
///
/// A body that is not JSON at all is almost always the login page, so it is
/// reported as an authentication failure. A failure envelope mentioning a
/// rate limit becomes [`DupeError::RateLimit`] with `retry_after` seconds;
/// any other failure becomes [`DupeError::RequestFailed`].
pub fn parse_api_response<T: DeserializeOwned>(body: &str, retry_after: u64) -> Result<T> {
    let envelope: ApiEnvelope = serde_json::from_str(body).map_err(|_| {
        DupeError::Auth("API did not return JSON; check the session cookie".to_string())
    })?;

    if envelope.status != "success" {
        let error = envelope.error.unwrap_or(envelope.status);
        if error.to_lowercase().contains("rate limit") {
            return Err(DupeError::RateLimit { retry_after });
        }
        return Err(DupeError::RequestFailed(error));
    }

    serde_json::from_value(envelope.response).map_err(|e| DupeError::Parse(e.to_string()))
}

// =============================================================================
// Browse
// =============================================================================

#[derive(Deserialize)]
pub struct ApiBrowseResponse {
    pub pages: Option<u32>,
    #[serde(default)]
    pub results: Vec<ApiBrowseGroup>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBrowseGroup {
    pub group_id: u64,
    pub group_name: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub group_year: Option<u32>,
    #[serde(default)]
    pub release_type: Option<ApiReleaseType>,
    #[serde(default, alias = "torrent")]
    pub torrents: Vec<ApiBrowseTorrent>,
}

#[derive(Deserialize)]
pub struct ApiArtist {
    pub name: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ApiBrowseTorrent {
    pub format: String,
    pub media: String,
    pub encoding: String,
}

/// Release type as either a display name or a Gazelle numeric code.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ApiReleaseType {
    Code(u32),
    Name(String),
}

impl ApiReleaseType {
    pub fn display_name(&self) -> String {
        match self {
            ApiReleaseType::Code(code) => release_type_name(*code)
                .map(str::to_string)
                .unwrap_or_else(|| code.to_string()),
            ApiReleaseType::Name(name) => name.clone(),
        }
    }

    pub fn is_compilation(&self) -> bool {
        match self {
            ApiReleaseType::Code(code) => *code == COMPILATION,
            ApiReleaseType::Name(name) => name.eq_ignore_ascii_case("compilation"),
        }
    }
}

const COMPILATION: u32 = 7;

/// Gazelle's release-type table, plus the artist-page pseudo types.
pub fn release_type_name(code: u32) -> Option<&'static str> {
    let name = match code {
        1 => "Album",
        3 => "Soundtrack",
        5 => "EP",
        6 => "Anthology",
        7 => "Compilation",
        9 => "Single",
        11 => "Live album",
        13 => "Remix",
        14 => "Bootleg",
        15 => "Interview",
        16 => "Mixtape",
        17 => "Demo",
        18 => "Concert Recording",
        19 => "DJ Mix",
        21 => "Unknown",
        1021 => "Produced By",
        1022 => "Composition",
        1023 => "Remixed By",
        1024 => "Guest Appearance",
        _ => return None,
    };
    Some(name)
}

/// Display string for a group's artists.
///
/// Compilations and groups with more than three artists collapse to the
/// various-artists word; otherwise names are joined with `" & "`.
pub fn compile_artists(
    artists: &[ApiArtist],
    release_type: Option<&ApiReleaseType>,
    various_artist_word: &str,
) -> String {
    let compilation = release_type.is_some_and(ApiReleaseType::is_compilation);
    if compilation || artists.len() > 3 {
        return various_artist_word.to_string();
    }
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(" & ")
}

/// Decode HTML entities (`&amp;`, `&#39;`, ...) that Gazelle leaves in names.
pub fn unescape_html(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    Html::parse_fragment(text)
        .root_element()
        .text()
        .collect::<String>()
}

impl ApiBrowseGroup {
    fn artist_display(&self, various_artist_word: &str) -> String {
        match self.artist.as_deref().filter(|a| !a.is_empty()) {
            Some(artist) => unescape_html(artist),
            None if !self.artists.is_empty() => unescape_html(&compile_artists(
                &self.artists,
                self.release_type.as_ref(),
                various_artist_word,
            )),
            None => String::new(),
        }
    }

    fn release_type_display(&self) -> String {
        self.release_type
            .as_ref()
            .map(ApiReleaseType::display_name)
            .unwrap_or_default()
    }

    pub fn into_release_record(self, base_url: &str, various_artist_word: &str) -> ReleaseRecord {
        ReleaseRecord {
            group_id: self.group_id,
            artist: self.artist_display(various_artist_word),
            group_name: unescape_html(&self.group_name),
            group_year: self.group_year.filter(|y| *y > 0),
            release_type: self.release_type_display(),
            tags: self.tags.iter().cloned().collect(),
            url: format!("{base_url}/torrents.php?id={}", self.group_id),
        }
    }

    pub fn into_release_summary(
        self,
        base_url: &str,
        various_artist_word: &str,
    ) -> SearchReleaseData {
        let flac = |t: &&ApiBrowseTorrent| t.format == "FLAC";
        SearchReleaseData {
            lossless: self.torrents.iter().any(|t| flac(&t)),
            lossless_web: self
                .torrents
                .iter()
                .filter(flac)
                .any(|t| t.media == "WEB"),
            year: self.group_year.filter(|y| *y > 0),
            artist: self.artist_display(various_artist_word),
            album: unescape_html(&self.group_name),
            release_type: self.release_type_display(),
            url: format!("{base_url}/torrents.php?id={}", self.group_id),
        }
    }
}

pub fn parse_browse_response(
    body: &str,
    retry_after: u64,
    base_url: &str,
    various_artist_word: &str,
) -> Result<SearchPage> {
    let response: ApiBrowseResponse = parse_api_response(body, retry_after)?;
    Ok(SearchPage {
        pages: response.pages,
        results: response
            .results
            .into_iter()
            .map(|g| g.into_release_record(base_url, various_artist_word))
            .collect(),
    })
}

pub fn parse_label_browse_response(
    body: &str,
    retry_after: u64,
    base_url: &str,
    various_artist_word: &str,
) -> Result<SearchPage<SearchReleaseData>> {
    let response: ApiBrowseResponse = parse_api_response(body, retry_after)?;
    Ok(SearchPage {
        pages: response.pages,
        results: response
            .results
            .into_iter()
            .map(|g| g.into_release_summary(base_url, various_artist_word))
            .collect(),
    })
}

// =============================================================================
// Torrent group
// =============================================================================

#[derive(Deserialize)]
pub struct ApiTorrentGroupResponse {
    pub group: ApiGroup,
    #[serde(default, alias = "torrent")]
    pub torrents: Vec<ApiTorrent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroup {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub record_label: Option<String>,
    #[serde(default)]
    pub catalogue_number: Option<String>,
    #[serde(default)]
    pub release_type: Option<ApiReleaseType>,
    #[serde(default)]
    pub music_info: Option<ApiMusicInfo>,
}

#[derive(Deserialize)]
pub struct ApiMusicInfo {
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTorrent {
    pub id: u64,
    #[serde(default)]
    pub media: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub encoding: String,
    #[serde(default)]
    pub remastered: bool,
    #[serde(default)]
    pub remaster_year: Option<u32>,
    #[serde(default)]
    pub remaster_catalogue_number: Option<String>,
    #[serde(default)]
    pub remaster_record_label: Option<String>,
}

pub fn parse_torrent_group_response(
    body: &str,
    retry_after: u64,
    various_artist_word: &str,
) -> Result<GroupDetail> {
    let response: ApiTorrentGroupResponse = parse_api_response(body, retry_after)?;
    let group = response.group;

    let artists = group
        .music_info
        .as_ref()
        .map(|m| m.artists.as_slice())
        .unwrap_or_default();

    Ok(GroupDetail {
        group_id: group.id,
        name: unescape_html(&group.name),
        artist: unescape_html(&compile_artists(
            artists,
            group.release_type.as_ref(),
            various_artist_word,
        )),
        year: group.year.filter(|y| *y > 0),
        record_label: unescape_html(group.record_label.as_deref().unwrap_or_default()),
        catalogue_number: group.catalogue_number.unwrap_or_default(),
        torrents: response
            .torrents
            .into_iter()
            .map(|t| TorrentRecord {
                id: t.id,
                media: t.media,
                format: t.format,
                encoding: t.encoding,
                remastered: t.remastered,
                remaster_year: t.remaster_year.filter(|y| *y > 0),
                remaster_catalogue_number: t.remaster_catalogue_number.unwrap_or_default(),
                remaster_record_label: unescape_html(
                    t.remaster_record_label.as_deref().unwrap_or_default(),
                ),
            })
            .collect(),
    })
}
