//! Error kinds shared across the wire protocol and the internal API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error kinds surfaced to clients in `{ok: false, error_kind: Some(..)}` responses.
///
/// Every variant here corresponds to a condition a client can observe and is
/// expected to react to; internal failures that don't map to one of these are
/// collapsed into [`HandlerFailure`] at the dispatch boundary and never leak
/// their message text to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ErrorKind {
    #[error("frame truncated before the declared length was reached")]
    FrameTruncated,
    #[error("frame exceeds the configured maximum size")]
    FrameTooLarge,
    #[error("no handler registered for this message id")]
    UnknownMessage,
    #[error("message body failed to decode")]
    DecodeFailed,
    #[error("message violates the protocol's framing or ordering rules")]
    ProtocolViolation,
    #[error("target is at capacity")]
    Full,
    #[error("target does not exist")]
    NotFound,
    #[error("supplied password does not match the room's password")]
    WrongPassword,
    #[error("player is already a member of a room")]
    AlreadyInRoom,
    #[error("caller is not authorized to perform this action")]
    Unauthorized,
    #[error("the store backing this operation failed")]
    StoreError,
    #[error("operation timed out")]
    Timeout,
}

/// Internal-only failure raised at the dispatch boundary for handler errors
/// that don't map to a client-visible [`ErrorKind`]. Never serialized to the
/// wire directly — dispatch logs it and answers the client with a generic
/// failure response instead.
#[derive(Debug, Error)]
pub enum HandlerFailure {
    #[error(transparent)]
    Known(#[from] ErrorKind),
    #[error("handler failed: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HandlerFailure {
    /// The `ErrorKind` to report to the client, if this failure maps to one.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Known(kind) => Some(*kind),
            Self::Internal(_) => None,
        }
    }
}

pub type HandlerResult<T> = Result<T, HandlerFailure>;
