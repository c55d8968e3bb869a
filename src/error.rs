use thiserror::Error;

/// Error types for dupe-check operations.
///
/// This enum covers transport failures against the tracker, API-level failures,
/// malformed responses, and the two user-driven unwinds (`Aborted` and
/// `DeleteRequested`) that propagate out of the interactive protocol.
///
/// # Error Handling Examples
///
/// ```rust,no_run
/// use gazelle_dupe::{DupeError, TrackerSite};
///
/// async fn lookup(site: &dyn TrackerSite) {
///     match site.group_detail(72189681).await {
///         Ok(group) => println!("{} - {}", group.artist, group.name),
///         Err(DupeError::RateLimit { retry_after }) => {
///             eprintln!("Rate limited, retry in {} seconds", retry_after);
///         }
///         Err(DupeError::RequestFailed(msg)) => eprintln!("Site refused: {}", msg),
///         Err(e) => eprintln!("Other error: {}", e),
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum DupeError {
    /// HTTP/network related errors.
    ///
    /// Connection failures, timeouts, DNS errors, and malformed URLs.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The site did not accept our credentials.
    ///
    /// Gazelle answers an unauthenticated `ajax.php` call with an HTML login
    /// page instead of JSON, so a non-JSON API body lands here.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Failed to parse a response from the site.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Rate limiting from the site.
    ///
    /// The `retry_after` field indicates how many seconds to wait before
    /// the next request attempt.
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimit {
        /// Number of seconds to wait before retrying
        retry_after: u64,
    },

    /// The API answered but declared the request a failure.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// A torrent group lookup for an unknown id.
    #[error("{group_id} does not exist")]
    GroupNotFound {
        /// The group id that was requested
        group_id: u64,
    },

    /// The user aborted the dupe check.
    #[error("Aborted by user")]
    Aborted,

    /// The user aborted and asked for the working folder to be deleted.
    #[error("Aborted by user, delete requested")]
    DeleteRequested,

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DupeError {
    /// Whether this error is one of the user-driven unwinds.
    pub fn is_abort(&self) -> bool {
        matches!(self, DupeError::Aborted | DupeError::DeleteRequested)
    }
}
