use std::collections::TryReserveError;

/// Errors returned by the parsers, renderers, and the normalizer.
///
/// Malformed markup is never an error: unterminated markers, unknown tags and
/// broken character references degrade to literal text instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The output buffer could not be allocated.
    #[error("failed to allocate output buffer: {0}")]
    Alloc(#[from] TryReserveError),
    /// Entities or tags were nested deeper than the configured limit.
    #[error("nesting depth exceeds the limit of {limit}")]
    DepthExceeded {
        /// The configured maximum depth.
        limit: usize,
    },
    /// Writing into the output buffer failed.
    #[error("failed to write output: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Error returned when parsing the textual entity form fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseEntityError {
    /// The entity type name is not one we know.
    #[error("unknown entity type `{0}`")]
    UnknownType(String),
    /// A line did not have the `TYPE\tOFFSET\tLENGTH\tEXTRA` shape.
    #[error("malformed entity line `{0}`")]
    MalformedLine(String),
    /// The offset or length was not a valid `u32`.
    #[error("invalid number in entity line: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),
}
