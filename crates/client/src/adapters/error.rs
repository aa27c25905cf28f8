use crate::fetch::FetchError;

/// Failure to turn a source page into a story record.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScrapeError {
    /// The page could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A required field was missing from a fetched page.
    #[error("could not parse {field} from {url}")]
    Parse { url: String, field: &'static str },
}

impl ScrapeError {
    pub(crate) fn missing(url: &str, field: &'static str) -> Self {
        ScrapeError::Parse { url: url.to_string(), field }
    }
}
