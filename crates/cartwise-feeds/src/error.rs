use std::fmt;

use thiserror::Error;

/// Which of a store's two published feeds an operation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Price,
    Promo,
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedKind::Price => write!(f, "price"),
            FeedKind::Promo => write!(f, "promo"),
        }
    }
}

/// Coarse classification of an [`AcquisitionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionErrorKind {
    Network,
    Auth,
    Parse,
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("feed unavailable for {context}: {reason}")]
    FeedUnavailable { context: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("authentication failed for {context}: {reason}")]
    Auth { context: String, reason: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("could not decode feed payload: {reason}")]
    Decompress { reason: String },

    #[error("{feed} feed contained no valid records")]
    EmptyCatalog { feed: FeedKind },

    #[error("no adapter registered for chain {0}")]
    UnknownChain(String),

    #[error("task exceeded its {secs}s deadline")]
    Timeout { secs: u64 },

    #[error("acquisition cancelled")]
    Cancelled,

    #[error("acquisition task failed: {0}")]
    Task(String),
}

impl AcquisitionError {
    #[must_use]
    pub fn kind(&self) -> AcquisitionErrorKind {
        match self {
            AcquisitionError::Auth { .. } => AcquisitionErrorKind::Auth,
            AcquisitionError::Deserialize { .. }
            | AcquisitionError::Xml(_)
            | AcquisitionError::Decompress { .. }
            | AcquisitionError::EmptyCatalog { .. } => AcquisitionErrorKind::Parse,
            AcquisitionError::FeedUnavailable { .. }
            | AcquisitionError::Http(_)
            | AcquisitionError::UnexpectedStatus { .. }
            | AcquisitionError::RateLimited { .. }
            | AcquisitionError::UnknownChain(_)
            | AcquisitionError::Timeout { .. }
            | AcquisitionError::Cancelled
            | AcquisitionError::Task(_) => AcquisitionErrorKind::Network,
        }
    }
}

/// Why a single feed record was dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("field {field} has unparseable value \"{value}\"")]
    InvalidValue { field: &'static str, value: String },

    #[error("negative price {0}")]
    NegativePrice(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_taxonomy() {
        assert_eq!(
            AcquisitionError::Auth {
                context: "x".into(),
                reason: "y".into()
            }
            .kind(),
            AcquisitionErrorKind::Auth
        );
        assert_eq!(
            AcquisitionError::EmptyCatalog {
                feed: FeedKind::Price
            }
            .kind(),
            AcquisitionErrorKind::Parse
        );
        assert_eq!(
            AcquisitionError::Timeout { secs: 5 }.kind(),
            AcquisitionErrorKind::Network
        );
        assert_eq!(
            AcquisitionError::Cancelled.kind(),
            AcquisitionErrorKind::Network
        );
    }

    #[test]
    fn empty_catalog_message_names_feed() {
        let err = AcquisitionError::EmptyCatalog {
            feed: FeedKind::Promo,
        };
        assert_eq!(err.to_string(), "promo feed contained no valid records");
    }
}
