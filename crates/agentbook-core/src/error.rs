use thiserror::Error;

/// Failure conditions inside a single tab fetch. All of them are retried and,
/// once retries are exhausted, degrade to an empty record set for that tab.
#[derive(Debug, Error)]
pub enum TabError {
    /// The grade-change handler ran but no matching AJAX response arrived
    /// within the settle window.
    #[error("no AJAX response captured")]
    NoAjaxResponse,
}
