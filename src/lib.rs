//! # gazelle-dupe
//!
//! Duplicate-release detection for Gazelle-based music trackers.
//!
//! Before a release is uploaded, the tracker is searched for groups that might
//! already hold it. Search strings are derived from the release metadata by
//! [`StringNormalizer`], run concurrently by [`DupeSearchEngine`], and, when the
//! search index comes up empty, compared against the site's upload log by
//! [`LogFallbackMatcher`]. [`DupeChecker`] drives the whole exchange with the
//! user through a [`Presenter`] and returns a [`DupeDecision`].
//!
//! ```rust,no_run
//! use gazelle_dupe::{
//!     ArtistEntry, ClientConfig, Config, DupeChecker, GazelleClient, ScriptedPresenter,
//! };
//! use http_client::native::NativeClient;
//!
//! #[tokio::main]
//! async fn main() -> gazelle_dupe::Result<()> {
//!     let config = Config::load(None)?;
//!     let site = GazelleClient::new(
//!         Box::new(NativeClient::new()),
//!         "RED",
//!         config.site("RED")?,
//!         config.client.clone(),
//!     );
//!
//!     let checker = DupeChecker::new(&site, config.dupe_check.clone());
//!     let queries = checker.search_strings(&[ArtistEntry::main("Boards of Canada")], Some("Geogaddi"), None);
//!     let mut presenter = ScriptedPresenter::new().with_answers(["n"]);
//!     let decision = checker.check_existing_group(&mut presenter, &queries, false).await?;
//!     println!("{decision}");
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dupe;
pub mod error;
pub mod events;
pub mod gazelle;
pub mod normalize;
pub mod parsing;
pub mod retry;
pub mod similarity;
pub mod site;
pub mod types;

pub use config::{ClientConfig, Config, DupeCheckConfig, RetryConfig, SiteConfig};
pub use dupe::{
    interpret_choice, Candidate, CandidateListing, CandidateSource, Choice, DupeChecker,
    DupeSearchEngine, LogFallbackMatcher, Presenter, ScriptedPresenter,
};
pub use error::DupeError;
pub use events::{
    ClientEvent, ClientEventReceiver, ClientEventWatcher, RateLimitType, RequestInfo,
    SharedEventBroadcaster,
};
pub use gazelle::{browse_label_pages, label_releases, GazelleClient, RequestBudget};
pub use normalize::StringNormalizer;
pub use parsing::LogPageParser;
pub use similarity::ratio;
pub use site::TrackerSite;
pub use types::*;

#[cfg(feature = "mock")]
pub use site::MockTrackerSite;

pub type Result<T> = std::result::Result<T, DupeError>;
