use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single load-generator iteration.
#[derive(Debug, Error)]
pub enum IterationError {
    /// The target answered with a non-2xx status.
    // NOTE: Any 2xx is accepted; the wording is kept for parity with existing tooling.
    #[error("assertion statusCode === 200 failed")]
    Assertion { status: StatusCode },

    /// Transport-level failure, passed through untouched.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl IterationError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Assertion { status } => Some(*status),
            Self::Http(err) => err.status(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("{failed} of {repetitions} iterations of `{name}` failed; first error: {first}")]
    IterationsFailed {
        name: String,
        repetitions: usize,
        failed: u64,
        first: String,
    },

    #[error("Invalid target URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
