use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error(transparent)]
    Challenge(#[from] ChallengeError),
}

/// Failure while resolving the interstitial challenge page. Fatal for the
/// current office's turn in the cycle; never retried mid-pipeline.
#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error("challenge page has no form")]
    NoForm,

    /// The challenge script threw, or the execution budget (loop iteration /
    /// recursion limits) was exceeded.
    #[error("challenge script failed: {message}")]
    Script { message: String },

    #[error("challenge produced an unreadable form: {message}")]
    Harvest { message: String },
}
