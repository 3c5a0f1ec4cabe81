//! Fixed-width signed integer codec over a [`Transport`].
//!
//! All wire integers are little-endian and signed: 1, 2 or 4 bytes. Writes
//! validate range *before* touching the channel — an out-of-range value for
//! any width aborts the exchange with
//! [`Error::ValueOutOfRange`](crate::error::Error::ValueOutOfRange) rather
//! than truncating silently. Reads are blocking and bounded by the
//! transport's configured timeout; a frame that stalls short of its width is
//! a [`Error::TruncatedFrame`](crate::error::Error::TruncatedFrame) and is
//! never retried here.

use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Poll interval while waiting for the first byte of a handshake line.
/// Connection establishment is not latency-critical, so don't peg a core.
const LINE_POLL: Duration = Duration::from_millis(1);

/// Little-endian signed integer stream over an exclusively-owned transport.
pub struct ByteStream<T: Transport> {
    transport: T,
}

impl<T: Transport> ByteStream<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Bytes buffered on the channel, readable without blocking.
    pub fn bytes_available(&mut self) -> Result<usize> {
        self.transport.bytes_available()
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(i8::from_le_bytes(buf))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(i16::from_le_bytes(buf))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Write `value` as an 8-bit signed field. Values outside [-128, 127]
    /// are rejected before any byte is sent.
    pub fn write_i8(&mut self, value: i64) -> Result<()> {
        let v = i8::try_from(value).map_err(|_| Error::ValueOutOfRange { value, width: 8 })?;
        self.transport.write_all(&v.to_le_bytes())
    }

    /// Write `value` as a 16-bit signed field, range-checked like
    /// [`write_i8`](Self::write_i8).
    pub fn write_i16(&mut self, value: i64) -> Result<()> {
        let v = i16::try_from(value).map_err(|_| Error::ValueOutOfRange { value, width: 16 })?;
        self.transport.write_all(&v.to_le_bytes())
    }

    /// Write `value` as a 32-bit signed field, range-checked like
    /// [`write_i8`](Self::write_i8).
    pub fn write_i32(&mut self, value: i64) -> Result<()> {
        let v = i32::try_from(value).map_err(|_| Error::ValueOutOfRange { value, width: 32 })?;
        self.transport.write_all(&v.to_le_bytes())
    }

    /// Read one newline-terminated text line, stripping the CR/LF tail.
    ///
    /// Used only during connection establishment (firmware version and
    /// initial-values lines). Waits indefinitely for the first byte — the
    /// device may still be booting — then requires each subsequent byte to
    /// arrive within the transport timeout.
    pub fn read_line(&mut self) -> Result<String> {
        while self.bytes_available()? == 0 {
            thread::sleep(LINE_POLL);
        }

        let mut line = Vec::new();
        loop {
            let mut buf = [0u8; 1];
            let n = self.transport.read(&mut buf)?;
            if n == 0 {
                return Err(Error::TruncatedFrame {
                    expected: line.len() + 1,
                    got: line.len(),
                });
            }
            if buf[0] == b'\n' {
                break;
            }
            line.push(buf[0]);
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    pub fn close(&mut self) -> Result<()> {
        self.transport.close()
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Fill `buf` completely or fail. A zero-length read (channel timeout
    /// with the frame still short) aborts with the byte counts so the caller
    /// can tell a stalled device from a wrong-shaped frame.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let expected = buf.len();
        let mut got = 0;
        while got < expected {
            let n = self.transport.read(&mut buf[got..])?;
            if n == 0 {
                return Err(Error::TruncatedFrame { expected, got });
            }
            got += n;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// In-memory channel: scripted inbound bytes, captured outbound bytes.
    struct MemTransport {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        closed: bool,
    }

    impl MemTransport {
        fn with_rx(bytes: &[u8]) -> Self {
            Self {
                rx: bytes.iter().copied().collect(),
                tx: Vec::new(),
                closed: false,
            }
        }
    }

    impl Transport for MemTransport {
        fn bytes_available(&mut self) -> Result<usize> {
            if self.closed {
                return Err(Error::Disconnected);
            }
            Ok(self.rx.len())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            if self.closed {
                return Err(Error::Disconnected);
            }
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break, // empty queue behaves like a timeout
                }
            }
            Ok(n)
        }

        fn write_all(&mut self, data: &[u8]) -> Result<()> {
            if self.closed {
                return Err(Error::Disconnected);
            }
            self.tx.extend_from_slice(data);
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    #[test]
    fn i16_little_endian_on_the_wire() {
        let mut stream = ByteStream::new(MemTransport::with_rx(&[]));
        stream.write_i16(0x0102).unwrap();
        assert_eq!(stream.transport.tx, vec![0x02, 0x01]);
    }

    #[test]
    fn reads_negative_values() {
        let mut stream = ByteStream::new(MemTransport::with_rx(&[0xFF, 0xFE, 0xFF]));
        assert_eq!(stream.read_i8().unwrap(), -1);
        assert_eq!(stream.read_i16().unwrap(), -2);
    }

    #[test]
    fn write_i8_rejects_out_of_range() {
        let mut stream = ByteStream::new(MemTransport::with_rx(&[]));
        let err = stream.write_i8(200).unwrap_err();
        assert!(matches!(
            err,
            Error::ValueOutOfRange { value: 200, width: 8 }
        ));
        // Nothing reached the wire.
        assert!(stream.transport.tx.is_empty());

        stream.write_i8(127).unwrap();
        stream.write_i8(-128).unwrap();
        assert_eq!(stream.transport.tx, vec![127, 0x80]);
    }

    #[test]
    fn write_i16_and_i32_reject_out_of_range() {
        let mut stream = ByteStream::new(MemTransport::with_rx(&[]));
        assert!(matches!(
            stream.write_i16(40_000).unwrap_err(),
            Error::ValueOutOfRange { width: 16, .. }
        ));
        assert!(matches!(
            stream.write_i32(i64::from(i32::MAX) + 1).unwrap_err(),
            Error::ValueOutOfRange { width: 32, .. }
        ));
        assert!(stream.transport.tx.is_empty());
    }

    #[test]
    fn short_read_is_truncated_frame() {
        let mut stream = ByteStream::new(MemTransport::with_rx(&[0x01, 0x02]));
        let err = stream.read_i32().unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedFrame {
                expected: 4,
                got: 2
            }
        ));
    }

    #[test]
    fn read_line_strips_crlf() {
        let mut stream = ByteStream::new(MemTransport::with_rx(b"#1.0\r\ninit 0 0 0\n"));
        assert_eq!(stream.read_line().unwrap(), "#1.0");
        assert_eq!(stream.read_line().unwrap(), "init 0 0 0");
    }

    #[test]
    fn closed_channel_reports_disconnected() {
        let mut stream = ByteStream::new(MemTransport::with_rx(&[0x00]));
        stream.close().unwrap();
        assert!(matches!(stream.read_i8(), Err(Error::Disconnected)));
    }
}
