//! Error types for the CLI protocol layer

use thiserror::Error;

/// Errors produced while framing or decoding CLI lines
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A line grew past the configured framing limit
    #[error("line exceeds {limit} bytes without a terminator")]
    LineTooLong { limit: usize },

    /// A numeric field could not be parsed
    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// A `connected` reply carried something other than 0 or 1
    #[error("invalid connected flag: {0:?}")]
    InvalidFlag(String),

    /// An identity reply did not carry an address after the index
    #[error("player id reply is missing an address: {0:?}")]
    MissingAddress(String),

    /// A group-listing token is not of the form `key:value[,value...]`
    #[error("malformed syncgroups token: {0:?}")]
    MalformedToken(String),

    /// The group listing ended in the middle of a record
    #[error("syncgroups reply ends with an incomplete record ({fields} of {expected} fields)")]
    IncompleteRecord { fields: usize, expected: usize },

    /// A group record did not list its members
    #[error("syncgroups record {record} has no sync_members")]
    MissingMembers { record: usize },
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
