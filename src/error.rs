//! Unified error type for the controller.
//!
//! Every fallible operation in the crate funnels into [`Error`], keeping the
//! facade's signatures uniform. Two conditions that look like errors are
//! deliberately *not* in this enum: an unrecognised command code from the
//! device is carried as a value ([`Order::Unknown`](crate::protocol::Order)),
//! and an expired bounded wait is reported as the `(TIMEOUT, 0, -1)` sentinel
//! tuple. Both are normal protocol outcomes a caller branches on.

use thiserror::Error;

/// Every fallible operation in the crate returns this.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter write outside the encodable range for its wire width.
    /// Rejected before any byte is sent; the exchange is aborted.
    #[error("value {value} does not fit an i{width} wire field")]
    ValueOutOfRange { value: i64, width: u8 },

    /// A fixed-width read returned fewer bytes than the frame requires.
    /// Malformed/truncated frames are surfaced, never retried here.
    #[error("truncated frame: expected {expected} bytes, got {got}")]
    TruncatedFrame { expected: usize, got: usize },

    /// The channel reported end-of-stream, or an operation was issued after
    /// `close()`. Fatal to the current session.
    #[error("serial channel disconnected")]
    Disconnected,

    /// Transport-level I/O fault.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
