//! Search-string generation.
//!
//! A release's artists, title, and catalogue number are boiled down to the
//! smallest set of search strings that still covers every way the release is
//! likely to be spelled on the site.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::config::DupeCheckConfig;
use crate::types::{ArtistEntry, SearchQueries};

static FEAT_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[\(\[\{]?\b(?:feat(?:uring)?|ft)\.?\s[^\)\]\}]*[\)\]\}]?")
        .expect("feat pattern")
});

static REMIXES_QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\(\[][^\)\]]*Remixes[^\)\]]*[\)\]]").expect("remixes pattern")
});

static REMIX_QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\(\[][^\)\]]*Remix[^\)\]]*[\)\]]").expect("remix pattern")
});

static EDITION_QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[\(\[][^\)\]]*(?:Edition|Version|Deluxe|Original|Reissue|Remaster|Vol|Mix|Edit)[^\)\]]*[\)\]]",
    )
    .expect("edition pattern")
});

static VOL_ABBREVIATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"vol[^u]").expect("vol trigger pattern"));

static VOL_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)vol\S*").expect("vol pattern"));

/// Lowercase, fold accents, drop apostrophes, and reduce everything outside
/// `[a-z0-9 ]` (plus non-Latin letters and digits) to single spaces.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| !matches!(c, '\'' | '\u{2019}' | '`'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip featured-artist clauses and bracketed edition qualifiers, then
/// collapse any remaining bracketed remix qualifiers to a bare word.
///
/// `Mix` is part of the edition vocabulary, so a bracketed `(X Remix)` or
/// `(Remixes)` is stripped whole by the edition pass.
pub fn sanitize_title(title: &str) -> String {
    let title = FEAT_CLAUSE.replace_all(title, "");
    let title = EDITION_QUALIFIER.replace_all(&title, "");
    let title = REMIXES_QUALIFIER.replace_all(&title, " remixes ");
    let title = REMIX_QUALIFIER.replace_all(&title, " remix ");
    title.trim().to_string()
}

/// Drop every string whose word set covers an already-kept shorter string's
/// word set. Input order does not matter; output is shortest first.
pub fn filter_redundant(candidates: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut sorted: Vec<String> = candidates.into_iter().collect();
    sorted.sort_by_key(|s| s.chars().count());

    let mut kept: Vec<String> = Vec::new();
    let mut kept_words: Vec<BTreeSet<String>> = Vec::new();
    for candidate in sorted {
        let words: BTreeSet<String> = candidate.split_whitespace().map(str::to_string).collect();
        if kept_words.iter().any(|prev| prev.is_subset(&words)) {
            continue;
        }
        kept_words.push(words);
        kept.push(candidate);
    }
    kept
}

/// Builds minimal search-string sets for releases.
#[derive(Debug, Clone)]
pub struct StringNormalizer {
    various_artist_threshold: usize,
    various_artist_word: String,
}

impl Default for StringNormalizer {
    fn default() -> Self {
        Self::from_config(&DupeCheckConfig::default())
    }
}

impl StringNormalizer {
    pub fn new(various_artist_threshold: usize, various_artist_word: impl Into<String>) -> Self {
        Self {
            various_artist_threshold,
            various_artist_word: various_artist_word.into(),
        }
    }

    pub fn from_config(config: &DupeCheckConfig) -> Self {
        Self::new(
            config.various_artist_threshold,
            config.various_artist_word.clone(),
        )
    }

    /// Main-role artist names joined by a space, or the various-artists word
    /// when there are more of them than the threshold allows.
    pub fn primary_artist(&self, artists: &[ArtistEntry]) -> String {
        let main: Vec<&str> = artists
            .iter()
            .filter(|a| a.is_main())
            .map(|a| a.name.as_str())
            .collect();
        if main.len() > self.various_artist_threshold {
            self.various_artist_word.clone()
        } else {
            main.join(" ")
        }
    }

    /// Generate the search strings for a release.
    ///
    /// An empty result means there is nothing to search for. That is not an
    /// error; the caller should skip the check.
    pub fn build_search_strings(
        &self,
        artists: &[ArtistEntry],
        title: Option<&str>,
        catno: Option<&str>,
    ) -> SearchQueries {
        let title = sanitize_title(title.unwrap_or_default());
        if title.is_empty() {
            return SearchQueries::default();
        }

        let artist = self.primary_artist(artists);
        let catno = catno.map(str::trim).filter(|c| !c.is_empty());
        let lower = title.to_lowercase();

        let mut titles = vec![title.clone()];
        if VOL_ABBREVIATION.is_match(&lower) {
            titles.push(VOL_WORD.replace_all(&title, "volume").into_owned());
        }
        if lower.contains("untitled") {
            titles.push(catno.unwrap_or_default().to_string());
        }
        if let Some((before_slash, _)) = title.split_once('/') {
            titles.push(before_slash.to_string());
        } else if let Some(catno) = catno {
            if lower.contains(&catno.to_lowercase()) {
                titles.push("untitled".to_string());
            }
        }

        let candidates = titles
            .iter()
            .map(|t| normalize(&format!("{artist} {t}")))
            .filter(|s| !s.is_empty());

        let queries = SearchQueries::new(filter_redundant(candidates));
        log::debug!("Search strings for {artist:?} / {title:?}: {queries}");
        queries
    }
}
