use keyset_db::PageError;
use thiserror::Error;

/// How a transport should classify a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request was malformed; retrying it unchanged cannot succeed.
    Client,
    Server,
}

/// Errors that are safe to expose to callers of a listing service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    #[error("Invalid direction '{direction}': expected ASC or DESC")]
    InvalidDirection { direction: String },

    #[error("Invalid sort column '{column}'")]
    InvalidColumn { column: String },

    #[error("Invalid cursor '{cursor}' for {kind} sort key")]
    InvalidCursor { cursor: String, kind: String },

    #[error("Invalid filter on '{field}': {reason}")]
    InvalidFilter { field: String, reason: String },

    #[error("Listing query failed")]
    ExecutionFailed,

    #[error("Listing cancelled")]
    Cancelled,

    #[error("Listing timed out")]
    Timeout,
}

impl ListingError {
    pub fn status(&self) -> ErrorClass {
        match self {
            Self::InvalidDirection { .. }
            | Self::InvalidColumn { .. }
            | Self::InvalidCursor { .. }
            | Self::InvalidFilter { .. }
            | Self::Cancelled => ErrorClass::Client,
            Self::ExecutionFailed | Self::Timeout => ErrorClass::Server,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDirection { .. } => "invalid_direction",
            Self::InvalidColumn { .. } => "invalid_column",
            Self::InvalidCursor { .. } => "invalid_cursor",
            Self::InvalidFilter { .. } => "invalid_filter",
            Self::ExecutionFailed => "execution_failed",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
        }
    }
}

impl From<keyset_core::Error> for ListingError {
    fn from(e: keyset_core::Error) -> Self {
        use keyset_core::Error as E;
        match e {
            E::InvalidDirection(direction) => Self::InvalidDirection { direction },
            E::InvalidColumn(column) => Self::InvalidColumn { column },
            E::InvalidCursor { kind, value } => Self::InvalidCursor {
                cursor: value,
                kind: kind.to_string(),
            },
            E::InvalidFilter { field, reason } => Self::InvalidFilter { field, reason },
        }
    }
}

/// Store details stay in the logs; callers only see the class of failure.
impl From<PageError> for ListingError {
    fn from(e: PageError) -> Self {
        match e {
            PageError::Invalid(inner) => inner.into(),
            PageError::ExecutionFailed(_) => Self::ExecutionFailed,
            PageError::Cancelled => Self::Cancelled,
            PageError::Timeout(_) => Self::Timeout,
        }
    }
}
