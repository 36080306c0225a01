use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum FbError {
    /// An error occurred during an HTTP request.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned an unexpected or unsuccessful HTTP status code.
    #[error("Unexpected response status: {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A JSON document could not be decoded.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The headless browser could not be launched or driven.
    #[error("Browser error: {0}")]
    Browser(String),

    /// A bounded wait expired.
    #[error("Timed out while {0}")]
    Timeout(&'static str),

    /// The rendered page exposes neither a post id nor a feedback id.
    #[error("Could not extract post ID from page content")]
    PostIdNotFound,

    /// Writing an export failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing an export table failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The supplied configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Anything that should not happen but did.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FbError {
    /// Whether the failure happened at the transport level and the call may be retried.
    ///
    /// HTTP error statuses count as transport failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FbError::Http(_) | FbError::Status { .. } | FbError::Timeout(_)
        )
    }

    /// Message suitable for showing to the person who asked for the scrape.
    pub fn user_message(&self) -> String {
        match self {
            FbError::PostIdNotFound => {
                "Scraping failed: the post could not be identified. Make sure the URL points to a public post.".to_string()
            }
            other => format!("Scraping failed: {other}"),
        }
    }
}

#[cfg(feature = "browser")]
impl From<chromiumoxide::error::CdpError> for FbError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        FbError::Browser(e.to_string())
    }
}
