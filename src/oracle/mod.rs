//! Relation oracle: the external people/places lookup API.
//!
//! The search engine only sees the [`RelationOracle`] trait. Failures are
//! reported as [`OracleError`] and the engine degrades them to "no neighbors".

mod flags;
mod http;
mod parse;
mod static_oracle;

pub use flags::{scan_flags, strip_flags};
pub use http::HttpOracle;
pub use parse::{neighbors_from_response, split_message, RESTRICTED_MARKER};
pub use static_oracle::{OracleFixture, StaticOracle};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::search::Kind;

/// Failure of a single oracle query
#[derive(Error, Debug)]
pub enum OracleError {
    /// Connection, DNS or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("Oracle API error {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Failed to parse oracle response: {0}")]
    Parse(String),

    /// The call did not complete in time
    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),

    /// No answer is available for this query (offline fixtures)
    #[error("No data for {kind} query '{query}'")]
    Unavailable { kind: Kind, query: String },
}

impl OracleError {
    /// Rate limiting, server-side errors and transport failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            OracleError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            OracleError::Network(_) | OracleError::Timeout(_) => true,
            OracleError::Parse(_) | OracleError::Unavailable { .. } => false,
        }
    }
}

/// Relation lookup: given a node of `kind`, return raw identifiers of the
/// opposite kind. Normalization is the caller's job.
#[async_trait]
pub trait RelationOracle: Send + Sync {
    async fn query(&self, kind: Kind, query: &str) -> Result<Vec<String>, OracleError>;

    /// Flag-looking strings noticed in responses so far.
    fn flags(&self) -> Vec<String> {
        Vec::new()
    }
}

#[async_trait]
impl<T: RelationOracle + ?Sized> RelationOracle for Box<T> {
    async fn query(&self, kind: Kind, query: &str) -> Result<Vec<String>, OracleError> {
        (**self).query(kind, query).await
    }

    fn flags(&self) -> Vec<String> {
        (**self).flags()
    }
}
