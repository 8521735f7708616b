//! Error taxonomy for the resolution pipeline.
//!
//! Only [`ScrapeError::AllProvidersExhausted`] is meant to reach a caller of
//! the [`Runner`](crate::runner::Runner). Everything else is a per-provider
//! failure that the runner turns into "try the next candidate".

use thiserror::Error;

/// Errors produced while composing requests, scraping providers or running
/// a resolution.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// The composed URL is malformed or uses a scheme other than
    /// `http://`, `https://` or `data:`.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A provider or embed has no content for the requested media.
    #[error("not found: {0}")]
    NotFound(String),

    /// An embed reference named an embed id that is not registered.
    #[error("unknown embed: {0}")]
    UnknownEmbed(String),

    /// A direct source run named a sourcerer id that is not registered.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// Every ranked sourcerer failed for this media.
    #[error("all providers exhausted ({attempted} attempted)")]
    AllProvidersExhausted { attempted: usize },

    /// The provider does not handle this media kind.
    #[error("unsupported media: {0}")]
    Unsupported(String),

    /// Two providers were registered under the same id.
    #[error("duplicate provider id: {0}")]
    DuplicateId(String),

    /// Network-level failure from the transport.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Body or identifier could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

impl ScrapeError {
    /// Shorthand for [`ScrapeError::NotFound`].
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// `true` when the error means "nothing here", as opposed to a fault.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<url::ParseError> for ScrapeError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<base64::DecodeError> for ScrapeError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
