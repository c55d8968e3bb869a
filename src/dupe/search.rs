use super::{fan_out, offer_retry, Presenter};
use crate::site::TrackerSite;
use crate::{ReleaseRecord, Result, SearchQueries};

/// Structured search across every query string of a release.
pub struct DupeSearchEngine<'a> {
    site: &'a dyn TrackerSite,
    max_concurrent: usize,
}

impl<'a> DupeSearchEngine<'a> {
    pub fn new(site: &'a dyn TrackerSite, max_concurrent: usize) -> Self {
        Self {
            site,
            max_concurrent,
        }
    }

    /// Search every query concurrently and merge the results.
    ///
    /// Waits for the whole batch before looking at any result. If any request
    /// fails, the user is asked whether to retry the batch; declining returns
    /// [`crate::DupeError::Aborted`].
    pub async fn search(
        &self,
        presenter: &mut dyn Presenter,
        queries: &SearchQueries,
    ) -> Result<Vec<ReleaseRecord>> {
        loop {
            let batch = fan_out(queries.iter(), self.max_concurrent, |query| {
                self.site.search(query)
            })
            .await;

            match batch {
                Ok(pages) => {
                    let results =
                        aggregate_results(pages.into_iter().map(|page| page.results));
                    log::debug!(
                        "{} distinct groups for {} queries on {}",
                        results.len(),
                        queries.len(),
                        self.site.site_code()
                    );
                    return Ok(results);
                }
                Err(error) => offer_retry(presenter, "search", error)?,
            }
        }
    }
}

/// Concatenate result lists, dropping records equal to one already kept.
///
/// Equality is over the whole record, so two snapshots of the same group
/// that differ in any field are both kept.
pub fn aggregate_results(
    batches: impl IntoIterator<Item = Vec<ReleaseRecord>>,
) -> Vec<ReleaseRecord> {
    let mut results: Vec<ReleaseRecord> = Vec::new();
    for record in batches.into_iter().flatten() {
        if !results.contains(&record) {
            results.push(record);
        }
    }
    results
}
