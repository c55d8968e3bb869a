//! Data types for releases, tracker records and dupe-check outcomes.
//!
//! This module contains the canonical shapes that the rest of the crate works
//! with. Site adapters (see [`crate::api`] and [`crate::parsing`]) are
//! responsible for producing these from whatever the tracker sends back.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::{DupeError, Result};

// ================================================================================================
// RELEASE METADATA
// ================================================================================================

/// The role an artist plays on a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtistRole {
    Main,
    Guest,
    Remixer,
    Composer,
    Conductor,
    DjCompiler,
    Producer,
}

impl ArtistRole {
    /// Parse a role from its Gazelle name (`main`, `guest`, ...).
    pub fn parse(role: &str) -> Option<Self> {
        match role.to_ascii_lowercase().as_str() {
            "main" => Some(Self::Main),
            "guest" => Some(Self::Guest),
            "remixer" => Some(Self::Remixer),
            "composer" => Some(Self::Composer),
            "conductor" => Some(Self::Conductor),
            "djcompiler" => Some(Self::DjCompiler),
            "producer" => Some(Self::Producer),
            _ => None,
        }
    }
}

/// One artist credit on a release.
///
/// A release's artists are an ordered list of these; only [`ArtistRole::Main`]
/// entries participate in search-string generation.
///
/// # Examples
///
/// ```rust
/// use gazelle_dupe::{ArtistEntry, ArtistRole};
///
/// let artists = vec![
///     ArtistEntry::main("Aphex Twin"),
///     ArtistEntry::new("Squarepusher", ArtistRole::Remixer),
/// ];
/// assert_eq!(artists.iter().filter(|a| a.is_main()).count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistEntry {
    pub name: String,
    pub role: ArtistRole,
}

impl ArtistEntry {
    pub fn new(name: impl Into<String>, role: ArtistRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    /// Shorthand for a main-role credit.
    pub fn main(name: impl Into<String>) -> Self {
        Self::new(name, ArtistRole::Main)
    }

    pub fn is_main(&self) -> bool {
        self.role == ArtistRole::Main
    }
}

// ================================================================================================
// SEARCH QUERIES
// ================================================================================================

/// The working set of search strings for one release.
///
/// Strings are kept shortest-first, which makes [`SearchQueries::primary`] the
/// broadest query. Equality is set equality: two query sets built in a
/// different order but holding the same strings compare equal.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
pub struct SearchQueries {
    strings: Vec<String>,
}

impl SearchQueries {
    /// Build a query set from already-filtered strings.
    ///
    /// Exact duplicates are dropped and the remaining strings are ordered by
    /// length (stable for equal lengths).
    pub fn new(strings: impl IntoIterator<Item = String>) -> Self {
        let mut kept: Vec<String> = Vec::new();
        for s in strings {
            if !kept.contains(&s) {
                kept.push(s);
            }
        }
        kept.sort_by_key(|s| s.chars().count());
        Self { strings: kept }
    }

    /// The shortest query in the set, used as the reference string for fuzzy
    /// comparisons against the site log.
    pub fn primary(&self) -> Option<&str> {
        self.strings.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn contains(&self, query: &str) -> bool {
        self.strings.iter().any(|s| s == query)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.strings
    }
}

impl PartialEq for SearchQueries {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|q| other.contains(q))
    }
}

impl fmt::Display for SearchQueries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.strings.join(" / "))
    }
}

// ================================================================================================
// TRACKER RECORDS
// ================================================================================================

/// One torrent group returned by a structured site search.
///
/// Aggregation across queries deduplicates on the whole record, not on
/// `group_id` alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub group_id: u64,
    pub artist: String,
    pub group_name: String,
    pub group_year: Option<u32>,
    pub release_type: String,
    pub tags: BTreeSet<String>,
    pub url: String,
}

/// A single page of browse results.
///
/// Structured searches yield [`ReleaseRecord`]s; label browsing yields
/// [`SearchReleaseData`] summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage<T = ReleaseRecord> {
    pub results: Vec<T>,
    /// Total number of pages, when the site reports it.
    pub pages: Option<u32>,
}

impl<T> Default for SearchPage<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            pages: None,
        }
    }
}

/// Best-effort parse of one upload line from the site log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntry {
    pub torrent_id: String,
    pub artist: String,
    pub title: String,
}

impl LogEntry {
    pub fn new(
        torrent_id: impl Into<String>,
        artist: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            torrent_id: torrent_id.into(),
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// Key used to collapse different torrents of the same logical release.
    pub fn release_key(&self) -> String {
        format!("{}{}", self.artist, self.title)
    }
}

/// One torrent inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentRecord {
    pub id: u64,
    pub media: String,
    pub format: String,
    pub encoding: String,
    pub remastered: bool,
    pub remaster_year: Option<u32>,
    pub remaster_catalogue_number: String,
    pub remaster_record_label: String,
}

/// Live detail for a torrent group, fetched when the user picks one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDetail {
    pub group_id: u64,
    pub name: String,
    pub artist: String,
    pub year: Option<u32>,
    pub record_label: String,
    pub catalogue_number: String,
    pub torrents: Vec<TorrentRecord>,
}

impl GroupDetail {
    /// Describe the edition of one torrent in this group.
    ///
    /// Original-release torrents borrow label and catalogue number from the
    /// group itself.
    pub fn edition_line(&self, torrent: &TorrentRecord) -> String {
        if torrent.remastered {
            format!(
                "{} / {} / {} / {} / {}",
                torrent
                    .remaster_year
                    .map(|y| y.to_string())
                    .unwrap_or_default(),
                torrent.remaster_catalogue_number,
                torrent.media,
                torrent.format,
                torrent.encoding
            )
        } else {
            format!(
                "OR / {} / {} / {} / {} / {}",
                self.record_label,
                self.catalogue_number,
                torrent.media,
                torrent.format,
                torrent.encoding
            )
        }
    }
}

/// Summary of a group from a label or artist listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReleaseData {
    pub lossless: bool,
    pub lossless_web: bool,
    pub year: Option<u32>,
    pub artist: String,
    pub album: String,
    pub release_type: String,
    pub url: String,
}

/// Deduplicate release summaries by URL.
///
/// A later duplicate replaces the earlier value but keeps its position.
pub fn dedupe_by_url(releases: Vec<SearchReleaseData>) -> Vec<SearchReleaseData> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut deduped: Vec<SearchReleaseData> = Vec::new();
    for release in releases {
        match positions.get(&release.url) {
            Some(&index) => deduped[index] = release,
            None => {
                positions.insert(release.url.clone(), deduped.len());
                deduped.push(release);
            }
        }
    }
    deduped
}

// ================================================================================================
// DUPE DECISIONS
// ================================================================================================

/// Terminal outcome of one dupe check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DupeDecision {
    /// Upload into this existing torrent group.
    ExistingGroup(u64),
    /// No matching group; upload as a new group.
    NewGroup,
    /// The user aborted the upload.
    Aborted,
    /// The user aborted and asked for the working folder to be removed.
    /// The dupe checker never touches the filesystem itself.
    DeleteAndAbort,
}

impl DupeDecision {
    /// Convert into the "raise on abort" form used by upload orchestration.
    pub fn into_group_id(self) -> Result<Option<u64>> {
        match self {
            DupeDecision::ExistingGroup(id) => Ok(Some(id)),
            DupeDecision::NewGroup => Ok(None),
            DupeDecision::Aborted => Err(DupeError::Aborted),
            DupeDecision::DeleteAndAbort => Err(DupeError::DeleteRequested),
        }
    }
}

impl fmt::Display for DupeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DupeDecision::ExistingGroup(id) => write!(f, "existing group {id}"),
            DupeDecision::NewGroup => write!(f, "new group"),
            DupeDecision::Aborted => write!(f, "aborted"),
            DupeDecision::DeleteAndAbort => write!(f, "aborted, delete folder"),
        }
    }
}

// ================================================================================================
// TESTS
// ================================================================================================
