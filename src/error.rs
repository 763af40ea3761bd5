//! Error kinds shared by the frame codec, packet model and session engine.

use std::io;

use thiserror::Error;

/// Every fallible operation in the protocol layer returns this.
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A read, write or accept on the underlying transport failed. Session-fatal.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// End of stream was reached in the middle of a frame. Session-fatal.
    #[error("frame error: premature eof after {bytes_read} bytes")]
    Frame { bytes_read: usize },

    /// A packet was decoded against the wrong variant's tag.
    #[error("tag mismatch: expected {expected:#04x}, found {found:#04x}")]
    TagMismatch { expected: u16, found: u16 },

    /// A payload didn't match its variant's grammar.
    #[error("malformed {variant} payload: {raw:?}")]
    Malformed { variant: &'static str, raw: String },

    /// A correctly decoded packet arrived in a session state that doesn't accept it.
    #[error("unhandled packet (tag {tag:#04x}) in current state")]
    Unhandled { tag: u16 },

    /// An internal invariant was violated (e.g. an unknown entity id was referenced).
    /// Logged; the offending packet is dropped; the session continues.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    /// Whether this error should terminate the session loop outright.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProtocolError::Transport(_) | ProtocolError::Frame { .. })
    }

    /// Whether this error should count against the session's bad-packet budget.
    pub fn counts_as_bad_packet(&self) -> bool {
        matches!(
            self,
            ProtocolError::TagMismatch { .. } | ProtocolError::Malformed { .. } | ProtocolError::Unhandled { .. }
        )
    }
}
