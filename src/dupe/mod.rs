//! Duplicate detection against a tracker.
//!
//! [`DupeSearchEngine`] runs the structured search, [`LogFallbackMatcher`]
//! fuzzy-matches the site log when search finds nothing, and [`DupeChecker`]
//! ties them together with the user's decisions through a [`Presenter`].

pub mod log_match;
pub mod presenter;
pub mod protocol;
pub mod search;

pub use log_match::{match_log_entries, LogFallbackMatcher};
pub use presenter::{Candidate, CandidateListing, CandidateSource, Presenter, ScriptedPresenter};
pub use protocol::{interpret_choice, Choice, DupeChecker};
pub use search::{aggregate_results, DupeSearchEngine};

use crate::{DupeError, Result};
use futures::stream::{self, StreamExt};
use std::future::Future;

/// Run `task` over every item with at most `limit` in flight. Results come
/// back in input order; the first error wins.
pub(crate) async fn fan_out<I, T, F, Fut>(items: I, limit: usize, task: F) -> Result<Vec<T>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    stream::iter(items)
        .map(task)
        .buffered(limit.max(1))
        .collect::<Vec<Result<T>>>()
        .await
        .into_iter()
        .collect()
}

/// Turn an error that escaped the transport into a user decision.
///
/// Returns `Ok(())` when the user wants to try again. Declining, or an error
/// that is already an abort, propagates as an error.
pub(crate) fn offer_retry(
    presenter: &mut dyn Presenter,
    activity: &str,
    error: DupeError,
) -> Result<()> {
    if error.is_abort() {
        return Err(error);
    }
    log::warn!("Error during {activity}: {error}");
    presenter.notify(&format!("Error during {activity}: {error}"));
    if presenter.confirm(&format!("Would you like to retry the {activity}?"), true) {
        Ok(())
    } else {
        presenter.notify(&format!("Aborting {activity}."));
        Err(DupeError::Aborted)
    }
}
