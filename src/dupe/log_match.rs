use super::{fan_out, offer_retry, Presenter};
use crate::normalize::StringNormalizer;
use crate::similarity::ratio;
use crate::site::TrackerSite;
use crate::{ArtistEntry, LogEntry, Result};
use std::collections::HashSet;

/// Fuzzy matching against the site log, for uploads the search index has not
/// picked up yet.
pub struct LogFallbackMatcher<'a> {
    site: &'a dyn TrackerSite,
    normalizer: &'a StringNormalizer,
    log_pages: u32,
    max_concurrent: usize,
}

impl<'a> LogFallbackMatcher<'a> {
    pub fn new(
        site: &'a dyn TrackerSite,
        normalizer: &'a StringNormalizer,
        log_pages: u32,
        max_concurrent: usize,
    ) -> Self {
        Self {
            site,
            normalizer,
            log_pages,
            max_concurrent,
        }
    }

    /// Log uploads that look like `primary_query`, most recent first.
    pub async fn find_similar(
        &self,
        presenter: &mut dyn Presenter,
        primary_query: &str,
        tolerance: f64,
    ) -> Result<Vec<LogEntry>> {
        let entries = self.fetch_entries(presenter).await?;
        let hits = match_log_entries(self.normalizer, entries, primary_query, tolerance);
        log::debug!(
            "{} recent uploads on {} resemble {primary_query:?}",
            hits.len(),
            self.site.site_code()
        );
        Ok(hits)
    }

    async fn fetch_entries(&self, presenter: &mut dyn Presenter) -> Result<Vec<LogEntry>> {
        loop {
            let pages = fan_out(1..=self.log_pages, self.max_concurrent, |page| {
                self.site.fetch_log_page(page)
            })
            .await;

            match pages {
                Ok(pages) => {
                    return Ok(pages
                        .iter()
                        .flat_map(|html| self.site.parse_log_page(html))
                        .collect())
                }
                Err(error) => offer_retry(presenter, "log check", error)?,
            }
        }
    }
}

/// Keep the log entries whose best similarity to `primary_query` is strictly
/// above `tolerance`.
///
/// Entries are first collapsed by artist and title so that several torrents
/// of one release count once. Each survivor is rebuilt into search strings as
/// if its artist were the sole main artist, and scored by its best string.
/// Input order is preserved.
pub fn match_log_entries(
    normalizer: &StringNormalizer,
    entries: impl IntoIterator<Item = LogEntry>,
    primary_query: &str,
    tolerance: f64,
) -> Vec<LogEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.release_key()))
        .filter(|entry| {
            let artists = [ArtistEntry::main(entry.artist.as_str())];
            let best = normalizer
                .build_search_strings(&artists, Some(&entry.title), None)
                .iter()
                .map(|candidate| ratio(primary_query, candidate))
                .fold(0.0, f64::max);
            best > tolerance
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse_to_first_seen() {
        let normalizer = StringNormalizer::default();
        let hits = match_log_entries(
            &normalizer,
            vec![
                LogEntry::new("1", "Burial", "Untrue"),
                LogEntry::new("2", "Burial", "Untrue"),
                LogEntry::new("3", "Xyz", "Qqq"),
            ],
            "burial untrue",
            0.5,
        );
        assert_eq!(hits, vec![LogEntry::new("1", "Burial", "Untrue")]);
    }

    #[test]
    fn test_tolerance_is_strict() {
        let normalizer = StringNormalizer::default();
        let primary = format!("{}{}", "a".repeat(51), "b".repeat(49));
        let exactly_half = LogEntry::new("1", "", format!("{}{}", "a".repeat(50), "c".repeat(50)));
        let just_over = LogEntry::new("2", "", format!("{}{}", "a".repeat(51), "c".repeat(49)));

        assert_eq!(ratio(&primary, &exactly_half.title), 0.5);
        assert_eq!(ratio(&primary, &just_over.title), 0.51);

        let hits = match_log_entries(
            &normalizer,
            vec![exactly_half, just_over.clone()],
            &primary,
            0.5,
        );
        assert_eq!(hits, vec![just_over]);
    }

    #[test]
    fn test_unsearchable_titles_never_match() {
        let normalizer = StringNormalizer::default();
        let hits = match_log_entries(
            &normalizer,
            vec![LogEntry::new("1", "Burial", "(Deluxe Edition)")],
            "burial",
            0.0,
        );
        assert!(hits.is_empty());
    }
}
