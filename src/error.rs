use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Substrings that mark an error as transient. Matched against the error
/// description, mirroring the failure modes seen in long collection runs.
const TRANSIENT_MARKERS: &[&str] = &[
    "connection reset",
    "connection aborted",
    "connection closed",
    "dns error",
    "timed out",
    "Timeout",
    "operation was canceled",
];

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape for is invalid. Selector: {0}")]
    ParseInvalidSelector(String),

    #[error("Timed out loading listing page: {0}")]
    NavigationTimeout(String),

    #[error("Unknown country selection: {0}")]
    UnknownCountry(String),
    #[error("Unknown season {season} for {country}")]
    UnknownSeason { country: String, season: String },

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Url Error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    /// Transient errors get the same page retried with a backoff sleep.
    /// Everything else aborts the current task immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::NavigationTimeout(_) => true,
            Error::Reqwest(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                let text = e.to_string();
                TRANSIENT_MARKERS.iter().any(|m| text.contains(m))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_timeout_is_transient() {
        let err = Error::NavigationTimeout("https://example.org/results/".into());
        assert!(err.is_transient());
    }

    #[test]
    fn configuration_errors_are_not_transient() {
        assert!(!Error::UnknownCountry("atlantis".into()).is_transient());
        assert!(!Error::ParseInvalidSelector("a[".into()).is_transient());
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert!(!io.is_transient());
    }
}
