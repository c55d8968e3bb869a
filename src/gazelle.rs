//! HTTP client for Gazelle-based trackers.
//!
//! [`GazelleClient`] implements [`TrackerSite`] on top of `ajax.php` for the
//! structured endpoints and plain page fetches for the log and torrent
//! redirects. It keeps its own request budget so that concurrent dupe-check
//! searches never exceed the site's rate limit, and retries rate-limit
//! responses with backoff.

use crate::api;
use crate::config::{ClientConfig, SiteConfig};
use crate::events::{
    ClientEvent, ClientEventReceiver, RateLimitType, RequestInfo, SharedEventBroadcaster,
};
use crate::retry;
use crate::site::TrackerSite;
use crate::{dedupe_by_url, DupeError, GroupDetail, Result, SearchPage, SearchReleaseData};
use async_trait::async_trait;
use http_client::{HttpClient, Request};
use http_types::{Method, Response, Url};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

const DEFAULT_RETRY_AFTER: u64 = 20;
const DEFAULT_USER_AGENT: &str = concat!("gazelle-dupe/", env!("CARGO_PKG_VERSION"));

/// Sliding-window request budget: at most `max_requests` in any `window`.
#[derive(Debug)]
pub struct RequestBudget {
    max_requests: usize,
    window: Duration,
    sent: Mutex<VecDeque<Instant>>,
}

impl RequestBudget {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1) as usize,
            window,
            sent: Mutex::new(VecDeque::new()),
        }
    }

    /// Wait until a request may be sent, then record it. Returns how long we
    /// waited.
    pub async fn acquire(&self) -> Duration {
        let started = Instant::now();
        loop {
            let wait = {
                let mut sent = self.sent.lock().await;
                let now = Instant::now();
                while sent
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= self.window)
                {
                    sent.pop_front();
                }
                if sent.len() < self.max_requests {
                    sent.push_back(now);
                    return started.elapsed();
                }
                match sent.front() {
                    Some(oldest) => self.window.saturating_sub(now.duration_since(*oldest)),
                    None => Duration::ZERO,
                }
            };
            log::debug!("Request budget exhausted, waiting {}ms", wait.as_millis());
            tokio::time::sleep(wait).await;
        }
    }
}

/// A [`TrackerSite`] backed by a Gazelle tracker's web API.
///
/// # Examples
///
/// ```rust,no_run
/// use gazelle_dupe::{ClientConfig, GazelleClient, SiteConfig, TrackerSite};
///
/// # async fn example() -> gazelle_dupe::Result<()> {
/// let http_client = http_client::native::NativeClient::new();
/// let site = SiteConfig::new("https://redacted.sh", "session-cookie-value");
/// let client = GazelleClient::new(Box::new(http_client), "RED", site, ClientConfig::default());
///
/// let page = client.search("burial untrue").await?;
/// for group in page.results {
///     println!("{} - {} ({})", group.artist, group.group_name, group.url);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GazelleClient {
    client: Arc<dyn HttpClient + Send + Sync>,
    site_code: String,
    site: SiteConfig,
    config: ClientConfig,
    various_artist_word: String,
    budget: Arc<RequestBudget>,
    broadcaster: Arc<SharedEventBroadcaster>,
}

impl GazelleClient {
    pub fn new(
        client: Box<dyn HttpClient + Send + Sync>,
        site_code: impl Into<String>,
        site: SiteConfig,
        config: ClientConfig,
    ) -> Self {
        let budget = RequestBudget::new(
            site.requests_per_window,
            Duration::from_secs(site.window_seconds),
        );
        Self {
            client: Arc::from(client),
            site_code: site_code.into(),
            site,
            config,
            various_artist_word: "Various Artists".to_string(),
            budget: Arc::new(budget),
            broadcaster: Arc::new(SharedEventBroadcaster::new()),
        }
    }

    /// Word used when a group has too many artists to list.
    pub fn with_various_artist_word(mut self, word: impl Into<String>) -> Self {
        self.various_artist_word = word.into();
        self
    }

    pub fn subscribe(&self) -> ClientEventReceiver {
        self.broadcaster.subscribe()
    }

    pub fn latest_event(&self) -> Option<ClientEvent> {
        self.broadcaster.latest_event()
    }

    fn ajax_url(&self, action: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/ajax.php?action={action}", self.site.base_url);
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    fn build_request(&self, url: &str, api: bool) -> Result<Request> {
        let parsed = url
            .parse::<Url>()
            .map_err(|e| DupeError::Http(format!("Invalid URL {url}: {e}")))?;
        let mut request = Request::new(Method::Get, parsed);
        request.insert_header(
            "User-Agent",
            self.site.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT),
        );
        request.insert_header("Cookie", format!("session={}", self.site.session).as_str());
        if api {
            request.insert_header("Accept", "application/json");
            if let Some(api_key) = &self.site.api_key {
                request.insert_header("Authorization", api_key.as_str());
            }
        } else {
            request.insert_header("Accept", "text/html,application/xhtml+xml");
        }
        Ok(request)
    }

    /// Send one request within the budget. A 429 becomes
    /// [`DupeError::RateLimit`]; every other status is returned to the caller.
    async fn send(&self, url: &str, api: bool) -> Result<Response> {
        let waited = self.budget.acquire().await;
        if waited >= Duration::from_secs(1) {
            self.broadcaster.broadcast_event(ClientEvent::RateLimited {
                delay_seconds: waited.as_secs(),
                request: None,
                rate_limit_type: RateLimitType::LocalBudget,
            });
        }

        let request = self.build_request(url, api)?;
        let request_info = RequestInfo::from_url_and_method(url, "GET");
        let request_start = std::time::Instant::now();

        self.broadcaster.broadcast_event(ClientEvent::RequestStarted {
            request: request_info.clone(),
        });
        log::debug!("{}", request_info.short_description());

        let response = self
            .client
            .send(request)
            .await
            .map_err(|e| DupeError::Http(e.to_string()))?;

        self.broadcaster.broadcast_event(ClientEvent::RequestCompleted {
            request: request_info.clone(),
            status_code: response.status().into(),
            duration_ms: request_start.elapsed().as_millis() as u64,
        });

        if response.status() == 429 {
            let retry_after = retry_after_header(&response);
            self.broadcaster.broadcast_event(ClientEvent::RateLimited {
                delay_seconds: retry_after,
                request: Some(request_info),
                rate_limit_type: RateLimitType::Http429,
            });
            return Err(DupeError::RateLimit { retry_after });
        }

        Ok(response)
    }

    async fn ajax_once<T>(
        &self,
        url: &str,
        parse: &dyn Fn(&str, u64) -> Result<T>,
    ) -> Result<T> {
        let mut response = self.send(url, true).await?;
        let retry_after = retry_after_header(&response);
        let body = response
            .body_string()
            .await
            .map_err(|e| DupeError::Http(e.to_string()))?;

        let parsed = parse(&body, retry_after);
        if let Err(DupeError::RateLimit { retry_after }) = &parsed {
            self.broadcaster.broadcast_event(ClientEvent::RateLimited {
                delay_seconds: *retry_after,
                request: Some(RequestInfo::from_url_and_method(url, "GET")),
                rate_limit_type: RateLimitType::ResponsePattern,
            });
        }
        parsed
    }

    /// Call `ajax.php?action=...`, retrying rate limits with backoff.
    async fn ajax<T>(
        &self,
        action: &str,
        params: &[(&str, String)],
        parse: &dyn Fn(&str, u64) -> Result<T>,
    ) -> Result<T> {
        let url = self.ajax_url(action, params);
        let this = self;
        let url_ref = url.as_str();
        let result = retry::retry_operation(&self.config.retry, action, move || {
            this.ajax_once(url_ref, parse)
        })
        .await?;
        Ok(result.result)
    }

    async fn fetch_page_once(&self, url: &str) -> Result<String> {
        let mut response = self.send(url, false).await?;
        if !response.status().is_success() {
            return Err(DupeError::Http(format!(
                "{url} returned HTTP {}",
                response.status()
            )));
        }
        response
            .body_string()
            .await
            .map_err(|e| DupeError::Http(e.to_string()))
    }
}

fn retry_after_header(response: &Response) -> u64 {
    response
        .header("retry-after")
        .and_then(|h| h.get(0))
        .and_then(|v| v.as_str().trim().parse::<f64>().ok())
        .map(|secs| secs.ceil() as u64)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

/// Group id from a `torrents.php?id=...` redirect target, absolute or not.
pub fn group_id_from_location(base_url: &str, location: &str) -> Option<u64> {
    let base = Url::parse(&format!("{base_url}/")).ok()?;
    let target = base.join(location).ok()?;
    let id = target
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())?;
    id.parse().ok()
}

#[async_trait(?Send)]
impl TrackerSite for GazelleClient {
    fn site_code(&self) -> String {
        self.site_code.clone()
    }

    fn base_url(&self) -> String {
        self.site.base_url.clone()
    }

    async fn search(&self, query: &str) -> Result<SearchPage> {
        let base_url = self.site.base_url.clone();
        let va_word = self.various_artist_word.clone();
        let page = self
            .ajax("browse", &[("searchstr", query.to_string())], &|body: &str, retry_after: u64| {
                api::parse_browse_response(body, retry_after, &base_url, &va_word)
            })
            .await?;

        self.broadcaster.broadcast_event(ClientEvent::SearchCompleted {
            query: query.to_string(),
            result_count: page.results.len(),
        });
        log::debug!("Search {query:?} returned {} groups", page.results.len());
        Ok(page)
    }

    async fn browse_label(
        &self,
        label: &str,
        year: Option<u32>,
        page: u32,
    ) -> Result<SearchPage<SearchReleaseData>> {
        let mut params = vec![("remasterrecordlabel", label.to_string())];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }
        if page > 1 {
            params.push(("page", page.to_string()));
        }

        let base_url = self.site.base_url.clone();
        let va_word = self.various_artist_word.clone();
        self.ajax("browse", &params, &|body: &str, retry_after: u64| {
            api::parse_label_browse_response(body, retry_after, &base_url, &va_word)
        })
        .await
    }

    async fn fetch_log_page(&self, page: u32) -> Result<String> {
        let url = format!("{}/log.php?page={page}", self.site.base_url);
        let this = self;
        let url_ref = url.as_str();
        let result = retry::retry_operation(&self.config.retry, "log", move || {
            this.fetch_page_once(url_ref)
        })
        .await?;
        Ok(result.result)
    }

    async fn resolve_torrent_group_id(&self, torrent_id: u64) -> Result<u64> {
        let url = format!("{}/torrents.php?torrentid={torrent_id}", self.site.base_url);
        let response = self.send(&url, false).await?;

        let location = if response.status().is_redirection() {
            response
                .header("location")
                .and_then(|h| h.get(0))
                .map(|v| v.as_str().to_string())
        } else {
            None
        };

        let location = location.ok_or_else(|| {
            DupeError::RequestFailed(format!(
                "No redirect found for torrent {torrent_id}; cannot determine its group"
            ))
        })?;
        log::debug!("Torrent {torrent_id} redirects to {location}");

        group_id_from_location(&self.site.base_url, &location).ok_or_else(|| {
            DupeError::Parse(format!("Redirect target {location} has no group id"))
        })
    }

    async fn group_detail(&self, group_id: u64) -> Result<GroupDetail> {
        let va_word = self.various_artist_word.clone();
        self.ajax(
            "torrentgroup",
            &[("id", group_id.to_string())],
            &|body: &str, retry_after: u64| api::parse_torrent_group_response(body, retry_after, &va_word),
        )
        .await
    }
}

// =============================================================================
// Label browsing
// =============================================================================

/// Every result of a label browse, in fetch order and with duplicates.
///
/// Page 1 is fetched first to learn the page count, then pages
/// `2..max(3, pages)`, then page 1 again. Both copies of page 1 are kept.
/// A first response without a page count means the label has no releases.
pub async fn browse_label_pages(
    site: &dyn TrackerSite,
    label: &str,
    year: Option<u32>,
) -> Result<Vec<SearchReleaseData>> {
    let first = site.browse_label(label, year, 1).await?;
    let Some(pages) = first.pages else {
        return Ok(Vec::new());
    };

    let mut all_results = first.results;
    for page in 2..pages.max(3) {
        let next = site.browse_label(label, year, page).await?;
        all_results.extend(next.results);
    }
    let again = site.browse_label(label, year, 1).await?;
    all_results.extend(again.results);

    log::debug!(
        "Label {label:?} browse gathered {} raw results over {pages} pages",
        all_results.len()
    );
    Ok(all_results)
}

/// A label's releases, one entry per group URL.
pub async fn label_releases(
    site: &dyn TrackerSite,
    label: &str,
    year: Option<u32>,
) -> Result<Vec<SearchReleaseData>> {
    Ok(dedupe_by_url(browse_label_pages(site, label, year).await?))
}
