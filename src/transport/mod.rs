//! Transport abstraction — any byte-oriented duplex channel.
//!
//! Concrete implementations:
//! - [`SerialTransport`]: USB serial link to the device (the real thing)
//! - test doubles: scripted echo devices in the test suites
//!
//! The protocol layer is generic over `Transport`, so the entire exchange
//! engine and facade are testable without hardware. Port discovery and
//! OS-specific enumeration live with the caller; a transport is constructed
//! from an already-known device path.

mod serial;

pub use serial::SerialTransport;

use crate::error::Result;

/// Byte-oriented duplex channel with a configured read timeout.
///
/// A transport is the exclusively-owned resource of one exchange engine;
/// ownership transfer at construction enforces that two engines never share
/// a channel.
pub trait Transport {
    /// Number of bytes buffered and ready to read without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read up to `buf.len()` bytes, blocking up to the channel's configured
    /// timeout. Returns the number of bytes actually read; `Ok(0)` means the
    /// timeout expired with nothing available.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `data` to the channel.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Close the channel. Idempotent. Any subsequent read or write must
    /// fail with [`Error::Disconnected`](crate::error::Error::Disconnected).
    fn close(&mut self) -> Result<()>;
}
