//! The user-facing side of a dupe check.
//!
//! The protocol never talks to a terminal directly. It hands listings to a
//! [`Presenter`] and reads the user's answers back from it, which keeps the
//! decision logic testable with [`ScriptedPresenter`].

use crate::{GroupDetail, LogEntry, ReleaseRecord};
use std::collections::VecDeque;

/// Where a set of candidates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Structured search results.
    Search,
    /// Fuzzy matches from the site log.
    RecentUploads,
}

/// One selectable entry in a listing.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Group(ReleaseRecord),
    RecentUpload(LogEntry),
}

/// Everything needed to show the user what was found.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateListing {
    pub site_code: String,
    pub base_url: String,
    /// The search strings used, joined for display.
    pub queries: String,
    pub source: CandidateSource,
    /// In display order; the user picks them 1-indexed.
    pub candidates: Vec<Candidate>,
    pub offer_deletion: bool,
}

impl CandidateListing {
    /// Link to a candidate on the site.
    pub fn link(&self, candidate: &Candidate) -> String {
        match candidate {
            Candidate::Group(record) => record.url.clone(),
            Candidate::RecentUpload(entry) => {
                format!("{}/torrents.php?torrentid={}", self.base_url, entry.torrent_id)
            }
        }
    }

    /// The question asked after the listing.
    pub fn choice_prompt(&self) -> String {
        let pick = match (self.source, self.candidates.is_empty()) {
            (_, true) => "Paste a URL",
            (CandidateSource::Search, false) => "Paste a URL, pick from groups found",
            (CandidateSource::RecentUploads, false) => "Pick from recent uploads found, paste a URL",
        };
        let delete = if self.offer_deletion {
            " / [d]elete music folder"
        } else {
            ""
        };
        format!(
            "Would you like to upload to an existing group?\n{pick} or [N]ew group / [a]bort{delete}"
        )
    }
}

/// Output and input for the interactive parts of a dupe check.
pub trait Presenter {
    /// Show search results or recent-upload matches.
    fn show_candidates(&mut self, listing: &CandidateListing);

    /// Show a group's existing torrents before asking for confirmation.
    fn show_group(&mut self, group: &GroupDetail);

    /// Ask a free-form question. An empty answer means "accept the default".
    fn prompt(&mut self, message: &str) -> String;

    /// Ask a yes/no question.
    fn confirm(&mut self, message: &str, default: bool) -> bool;

    /// Informational message.
    fn notify(&mut self, message: &str);
}

/// A [`Presenter`] that replays canned answers and records what it was shown.
///
/// When the scripted answers run out, prompts answer `"abort"` and
/// confirmations take their default, so a check driven by this presenter
/// always terminates.
///
/// ```rust
/// use gazelle_dupe::{Presenter, ScriptedPresenter};
///
/// let mut presenter = ScriptedPresenter::new()
///     .with_answers(["2"])
///     .with_confirmations([false]);
/// assert_eq!(presenter.prompt("Pick one"), "2");
/// assert_eq!(presenter.prompt("Pick again"), "abort");
/// assert!(!presenter.confirm("Retry?", true));
/// assert!(presenter.confirm("Retry?", true));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedPresenter {
    answers: VecDeque<String>,
    confirmations: VecDeque<bool>,
    listings: Vec<CandidateListing>,
    groups: Vec<GroupDetail>,
    prompts: Vec<String>,
    notices: Vec<String>,
}

impl ScriptedPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.answers.extend(answers.into_iter().map(Into::into));
        self
    }

    pub fn with_confirmations(mut self, confirmations: impl IntoIterator<Item = bool>) -> Self {
        self.confirmations.extend(confirmations);
        self
    }

    /// Listings shown so far.
    pub fn listings(&self) -> &[CandidateListing] {
        &self.listings
    }

    /// Groups shown for confirmation so far.
    pub fn groups(&self) -> &[GroupDetail] {
        &self.groups
    }

    /// Every prompt and confirmation question asked, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Scripted answers not consumed.
    pub fn remaining_answers(&self) -> usize {
        self.answers.len()
    }
}

impl Presenter for ScriptedPresenter {
    fn show_candidates(&mut self, listing: &CandidateListing) {
        self.listings.push(listing.clone());
    }

    fn show_group(&mut self, group: &GroupDetail) {
        self.groups.push(group.clone());
    }

    fn prompt(&mut self, message: &str) -> String {
        self.prompts.push(message.to_string());
        self.answers
            .pop_front()
            .unwrap_or_else(|| "abort".to_string())
    }

    fn confirm(&mut self, message: &str, default: bool) -> bool {
        self.prompts.push(message.to_string());
        self.confirmations.pop_front().unwrap_or(default)
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
