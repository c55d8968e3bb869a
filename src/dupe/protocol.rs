//! The decision flow of a dupe check.
//!
//! ```text
//! Searching ──► results ─────────────► PresentingChoices ──► Confirming ──► ExistingGroup
//!     │                                   ▲     │                 │
//!     └──► no results ──► log matches ────┘     ├──► NewGroup ◄───┤
//!                                               ├──► Aborted ◄────┤
//!                                               └──► DeleteAndAbort
//! ```
//!
//! Groups picked from structured search results are shown to the user and
//! confirmed before they are accepted. Groups picked from the log fallback are
//! accepted as soon as they resolve, since there is no search record to show.

use super::log_match::LogFallbackMatcher;
use super::presenter::{Candidate, CandidateListing, CandidateSource, Presenter};
use super::search::DupeSearchEngine;
use crate::config::DupeCheckConfig;
use crate::normalize::StringNormalizer;
use crate::site::TrackerSite;
use crate::{ArtistEntry, DupeDecision, DupeError, LogEntry, ReleaseRecord, Result, SearchQueries};
use http_types::Url;

/// What a line typed at the group-selection prompt means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Abort,
    Delete,
    New,
    /// 0-based index into the displayed candidates.
    Candidate(usize),
    /// A number outside the candidate range, taken as a group id.
    GroupId(u64),
    /// A group page URL.
    GroupUrl(u64),
    /// A torrent URL; the group still has to be looked up.
    TorrentUrl(u64),
    /// A site URL without a usable id.
    UnusableUrl,
    Invalid,
}

/// Interpret one answer to the group-selection prompt.
///
/// Action words are matched on their first letter. `d` only means delete when
/// deletion was offered. `0` picks the first candidate. URLs must point at the
/// site's `torrents.php`; a group `id` wins over a `torrentid`.
pub fn interpret_choice(
    input: &str,
    candidate_count: usize,
    offer_deletion: bool,
    base_url: &str,
) -> Choice {
    let input = input.trim();
    let lower = input.to_lowercase();

    match lower.chars().next() {
        None | Some('n') => return Choice::New,
        Some('a') => return Choice::Abort,
        Some('d') if offer_deletion => return Choice::Delete,
        _ => {}
    }

    if input.chars().all(|c| c.is_ascii_digit()) {
        return match input.parse::<u64>() {
            Ok(0) if candidate_count > 0 => Choice::Candidate(0),
            Ok(n) if n >= 1 && n as usize <= candidate_count => Choice::Candidate(n as usize - 1),
            Ok(n) if n > 0 => Choice::GroupId(n),
            _ => Choice::Invalid,
        };
    }

    let torrents_page = format!("{}/torrents.php", base_url.trim_end_matches('/')).to_lowercase();
    if lower.starts_with(&torrents_page) {
        let Ok(url) = Url::parse(input) else {
            return Choice::UnusableUrl;
        };
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .and_then(|(_, value)| value.parse::<u64>().ok())
        };
        return match (param("id"), param("torrentid")) {
            (Some(id), _) => Choice::GroupUrl(id),
            (None, Some(torrent_id)) => Choice::TorrentUrl(torrent_id),
            (None, None) => Choice::UnusableUrl,
        };
    }

    Choice::Invalid
}

enum Confirmation {
    Yes,
    New,
    Abort,
    Delete,
}

/// Runs dupe checks for one site.
///
/// # Examples
///
/// ```rust,no_run
/// use gazelle_dupe::{
///     ArtistEntry, ClientConfig, DupeCheckConfig, DupeChecker, DupeDecision, GazelleClient,
///     ScriptedPresenter, SiteConfig,
/// };
///
/// # tokio_test::block_on(async {
/// let site = GazelleClient::new(
///     Box::new(http_client::native::NativeClient::new()),
///     "RED",
///     SiteConfig::new("https://redacted.sh", "session-cookie-value"),
///     ClientConfig::default(),
/// );
/// let checker = DupeChecker::new(&site, DupeCheckConfig::default());
/// let queries = checker.search_strings(&[ArtistEntry::main("Burial")], Some("Untrue"), None);
///
/// let mut presenter = ScriptedPresenter::new().with_answers(["n"]);
/// match checker.check_existing_group(&mut presenter, &queries, true).await? {
///     DupeDecision::ExistingGroup(id) => println!("Upload into group {id}"),
///     DupeDecision::NewGroup => println!("Upload as a new group"),
///     DupeDecision::Aborted | DupeDecision::DeleteAndAbort => println!("Stopped"),
/// }
/// # Ok::<(), gazelle_dupe::DupeError>(())
/// # });
/// ```
pub struct DupeChecker<'a> {
    site: &'a dyn TrackerSite,
    config: DupeCheckConfig,
    normalizer: StringNormalizer,
}

impl<'a> DupeChecker<'a> {
    pub fn new(site: &'a dyn TrackerSite, config: DupeCheckConfig) -> Self {
        let normalizer = StringNormalizer::from_config(&config);
        Self {
            site,
            config,
            normalizer,
        }
    }

    pub fn config(&self) -> &DupeCheckConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &StringNormalizer {
        &self.normalizer
    }

    /// Search strings for a release, using this checker's settings.
    pub fn search_strings(
        &self,
        artists: &[ArtistEntry],
        title: Option<&str>,
        catno: Option<&str>,
    ) -> SearchQueries {
        self.normalizer.build_search_strings(artists, title, catno)
    }

    /// Search the site for `queries` and let the user decide where the upload
    /// belongs.
    ///
    /// An empty query set cannot be searched and yields
    /// [`DupeDecision::NewGroup`] without touching the network. A user who
    /// declines to retry a failed search ends the check as
    /// [`DupeDecision::Aborted`] before any choice is offered.
    ///
    /// ```rust
    /// # use gazelle_dupe::{ClientConfig, DupeCheckConfig, DupeChecker, DupeDecision, GazelleClient, SiteConfig};
    /// # use gazelle_dupe::{ScriptedPresenter, SearchQueries};
    /// # tokio_test::block_on(async {
    /// # let site = GazelleClient::new(
    /// #     Box::new(http_client::native::NativeClient::new()),
    /// #     "RED",
    /// #     SiteConfig::new("https://tracker.example", "session"),
    /// #     ClientConfig::default(),
    /// # );
    /// let checker = DupeChecker::new(&site, DupeCheckConfig::default());
    /// let mut presenter = ScriptedPresenter::new();
    ///
    /// let decision = checker
    ///     .check_existing_group(&mut presenter, &SearchQueries::default(), true)
    ///     .await?;
    /// assert_eq!(decision, DupeDecision::NewGroup);
    /// assert!(presenter.listings().is_empty());
    /// # Ok::<(), gazelle_dupe::DupeError>(())
    /// # });
    /// ```
    pub async fn check_existing_group(
        &self,
        presenter: &mut dyn Presenter,
        queries: &SearchQueries,
        offer_deletion: bool,
    ) -> Result<DupeDecision> {
        if queries.is_empty() {
            presenter.notify("Not enough metadata to build a search; skipping the dupe check.");
            return Ok(DupeDecision::NewGroup);
        }

        let engine = DupeSearchEngine::new(self.site, self.config.max_concurrent_requests);
        let results = match engine.search(presenter, queries).await {
            Ok(results) => results,
            Err(DupeError::Aborted) => return Ok(DupeDecision::Aborted),
            Err(e) => return Err(e),
        };

        if results.is_empty() && self.config.check_recent_uploads {
            let recent = match self.recent_uploads(presenter, queries).await {
                Ok(recent) => recent,
                Err(DupeError::Aborted) => return Ok(DupeDecision::Aborted),
                Err(e) => return Err(e),
            };
            let listing = self.listing(
                queries,
                CandidateSource::RecentUploads,
                recent.iter().cloned().map(Candidate::RecentUpload).collect(),
                offer_deletion,
            );
            presenter.show_candidates(&listing);
            return self.choose_recent_upload(presenter, &listing, &recent).await;
        }

        let listing = self.listing(
            queries,
            CandidateSource::Search,
            results.iter().cloned().map(Candidate::Group).collect(),
            offer_deletion,
        );
        presenter.show_candidates(&listing);
        self.choose_group(presenter, &listing, &results).await
    }

    /// Re-run the check if metadata edits changed the search strings.
    ///
    /// Returns `Ok(None)` when nothing changed (the earlier decision stands) or
    /// when the user picks a new group. Aborts come back as errors.
    pub async fn recheck_dupe(
        &self,
        presenter: &mut dyn Presenter,
        previous: &SearchQueries,
        artists: &[ArtistEntry],
        title: Option<&str>,
        catno: Option<&str>,
    ) -> Result<Option<u64>> {
        let queries = self.search_strings(artists, title, catno);
        if queries.is_empty() || queries == *previous {
            log::debug!("Search strings unchanged, not rechecking");
            return Ok(None);
        }

        presenter.notify(&format!(
            "Rechecking for dupes on {} due to metadata changes...",
            self.site.site_code()
        ));
        self.check_existing_group(presenter, &queries, true)
            .await?
            .into_group_id()
    }

    /// One last look at the site log right before uploading.
    ///
    /// Never runs a structured search and never offers group selection. If
    /// anything similar turned up, the user must explicitly agree to go on;
    /// otherwise [`DupeError::Aborted`] is returned.
    pub async fn last_minute_check(
        &self,
        presenter: &mut dyn Presenter,
        queries: &SearchQueries,
    ) -> Result<()> {
        let site_code = self.site.site_code();
        presenter.notify(&format!("Last minute dupe check on {site_code}"));

        let recent = self.recent_uploads(presenter, queries).await?;
        if recent.is_empty() {
            presenter.notify(&format!("Nothing found on {site_code}"));
            return Ok(());
        }

        let listing = self.listing(
            queries,
            CandidateSource::RecentUploads,
            recent.into_iter().map(Candidate::RecentUpload).collect(),
            false,
        );
        presenter.show_candidates(&listing);
        if presenter.confirm("Would you still like to upload?", false) {
            Ok(())
        } else {
            Err(DupeError::Aborted)
        }
    }

    async fn recent_uploads(
        &self,
        presenter: &mut dyn Presenter,
        queries: &SearchQueries,
    ) -> Result<Vec<LogEntry>> {
        let Some(primary) = queries.primary() else {
            return Ok(Vec::new());
        };
        let matcher = LogFallbackMatcher::new(
            self.site,
            &self.normalizer,
            self.config.log_pages,
            self.config.max_concurrent_requests,
        );
        let mut recent = matcher
            .find_similar(presenter, primary, self.config.log_dupe_tolerance)
            .await?;
        recent.truncate(self.config.recent_display_limit);
        Ok(recent)
    }

    fn listing(
        &self,
        queries: &SearchQueries,
        source: CandidateSource,
        candidates: Vec<Candidate>,
        offer_deletion: bool,
    ) -> CandidateListing {
        CandidateListing {
            site_code: self.site.site_code(),
            base_url: self.site.base_url(),
            queries: queries.to_string(),
            source,
            candidates,
            offer_deletion,
        }
    }

    /// Selection over structured search results. Any group picked goes
    /// through confirmation.
    async fn choose_group(
        &self,
        presenter: &mut dyn Presenter,
        listing: &CandidateListing,
        results: &[ReleaseRecord],
    ) -> Result<DupeDecision> {
        let base_url = self.site.base_url();
        loop {
            let answer = presenter.prompt(&listing.choice_prompt());
            let group_id = match interpret_choice(
                &answer,
                results.len(),
                listing.offer_deletion,
                &base_url,
            ) {
                Choice::Abort => return Ok(DupeDecision::Aborted),
                Choice::Delete => return Ok(DupeDecision::DeleteAndAbort),
                Choice::New => return Ok(self.new_group(presenter)),
                Choice::Candidate(index) => results[index].group_id,
                Choice::GroupId(group_id) => {
                    presenter.notify(&format!("Interpreting {group_id} as a group ID"));
                    group_id
                }
                Choice::GroupUrl(group_id) => group_id,
                Choice::TorrentUrl(torrent_id) => {
                    match self.resolve_torrent(presenter, torrent_id).await? {
                        Some(group_id) => group_id,
                        None => continue,
                    }
                }
                Choice::UnusableUrl => {
                    presenter.notify("Could not find a group ID in that URL.");
                    continue;
                }
                Choice::Invalid => continue,
            };

            return match self
                .confirm_group(presenter, group_id, listing.offer_deletion)
                .await?
            {
                Confirmation::Yes => Ok(DupeDecision::ExistingGroup(group_id)),
                Confirmation::New => Ok(self.new_group(presenter)),
                Confirmation::Abort => Ok(DupeDecision::Aborted),
                Confirmation::Delete => Ok(DupeDecision::DeleteAndAbort),
            };
        }
    }

    /// Selection over log matches. A resolved group is accepted directly.
    async fn choose_recent_upload(
        &self,
        presenter: &mut dyn Presenter,
        listing: &CandidateListing,
        recent: &[LogEntry],
    ) -> Result<DupeDecision> {
        let base_url = self.site.base_url();
        loop {
            let answer = presenter.prompt(&listing.choice_prompt());
            let resolved = match interpret_choice(
                &answer,
                recent.len(),
                listing.offer_deletion,
                &base_url,
            ) {
                Choice::Abort => return Ok(DupeDecision::Aborted),
                Choice::Delete => return Ok(DupeDecision::DeleteAndAbort),
                Choice::New => return Ok(self.new_group(presenter)),
                Choice::Candidate(index) => match recent[index].torrent_id.parse::<u64>() {
                    Ok(torrent_id) => self.resolve_torrent(presenter, torrent_id).await?,
                    Err(_) => {
                        presenter.notify("Could not get group ID from torrent ID.");
                        None
                    }
                },
                Choice::GroupId(group_id) => {
                    presenter.notify(&format!("Interpreting {group_id} as a group ID"));
                    Some(group_id)
                }
                Choice::GroupUrl(group_id) => Some(group_id),
                Choice::TorrentUrl(torrent_id) => {
                    self.resolve_torrent(presenter, torrent_id).await?
                }
                Choice::UnusableUrl => {
                    presenter.notify("Could not find a group ID in that URL.");
                    None
                }
                Choice::Invalid => None,
            };

            if let Some(group_id) = resolved {
                return Ok(DupeDecision::ExistingGroup(group_id));
            }
        }
    }

    fn new_group(&self, presenter: &mut dyn Presenter) -> DupeDecision {
        presenter.notify("Uploading to a new torrent group.");
        DupeDecision::NewGroup
    }

    /// Look up a torrent's group. A failed lookup is reported and yields
    /// `None` so the user can choose again.
    async fn resolve_torrent(
        &self,
        presenter: &mut dyn Presenter,
        torrent_id: u64,
    ) -> Result<Option<u64>> {
        match self.site.resolve_torrent_group_id(torrent_id).await {
            Ok(group_id) => Ok(Some(group_id)),
            Err(e) if e.is_abort() => Err(e),
            Err(e) => {
                log::warn!("Could not resolve torrent {torrent_id}: {e}");
                presenter.notify("Could not get group ID from torrent ID.");
                Ok(None)
            }
        }
    }

    /// Show the group's torrents and ask whether to upload into it.
    async fn confirm_group(
        &self,
        presenter: &mut dyn Presenter,
        group_id: u64,
        offer_deletion: bool,
    ) -> Result<Confirmation> {
        let group = match self.site.group_detail(group_id).await {
            Ok(group) => group,
            Err(DupeError::RequestFailed(reason)) => {
                log::debug!("Group {group_id} lookup failed: {reason}");
                presenter.notify(&format!("{group_id} does not exist."));
                return Err(DupeError::GroupNotFound { group_id });
            }
            Err(e) => return Err(e),
        };
        presenter.show_group(&group);

        let question = if offer_deletion {
            "Are you sure you would like to upload this torrent to this group? \
             [Y]es, [n]ew group, [a]bort, [d]elete music folder"
        } else {
            "Are you sure you would like to upload this torrent to this group? \
             [Y]es, [n]ew group, [a]bort"
        };

        loop {
            let answer = presenter.prompt(question);
            let first = answer.trim().chars().next().map(|c| c.to_ascii_lowercase());
            match first {
                None | Some('y') => return Ok(Confirmation::Yes),
                Some('n') => return Ok(Confirmation::New),
                Some('a') => return Ok(Confirmation::Abort),
                Some('d') if offer_deletion => return Ok(Confirmation::Delete),
                _ => continue,
            }
        }
    }
}
