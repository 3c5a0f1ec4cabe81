//! Exchange engine — synchronous request/echo round trips.
//!
//! One logical exchange is an ordered sequence of {order write, order
//! read-back, zero or more (value write, value read-back) pairs}. The device
//! echoes every field before the next one is sent, and exchanges never
//! overlap: the engine exclusively owns its transport, so at most one
//! exchange is in flight per channel.
//!
//! Connection establishment is part of the engine: immediately after the
//! port opens, the device prints two newline-terminated text lines (firmware
//! version, initial values). [`ExchangeEngine::connect`] consumes both
//! before the engine is considered ready; they are the only non-binary
//! frames on the wire.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::Result;
use crate::protocol::Order;
use crate::protocol::codec::ByteStream;
use crate::transport::Transport;

/// Wire size of an order/value/time frame: i8 order + i16 value + i32 time.
///
/// Other exchange shapes must pass their own length to
/// [`ExchangeEngine::wait_for_bytes`] instead of assuming this one.
pub const ORDER_VALUE_TIME_LEN: usize = 1 + 2 + 4;

/// Poll interval for bounded event waits. Event frames carry their own
/// device-side timestamp, so a sub-millisecond poll is latency enough here;
/// the zero-sleep spin is reserved for the lick wait in the facade.
const EVENT_POLL: Duration = Duration::from_micros(200);

/// Synchronous exchange engine over an exclusively-owned transport.
pub struct ExchangeEngine<T: Transport> {
    stream: ByteStream<T>,
    version: String,
    initial_values: String,
}

impl<T: Transport> ExchangeEngine<T> {
    /// Take ownership of a freshly opened transport and perform the
    /// establishment handshake (two text lines) before any binary exchange.
    pub fn connect(transport: T) -> Result<Self> {
        let mut stream = ByteStream::new(transport);
        let version = stream.read_line()?;
        let initial_values = stream.read_line()?;
        info!("device connected: version={version:?} initial_values={initial_values:?}");
        Ok(Self {
            stream,
            version,
            initial_values,
        })
    }

    /// Firmware version line read during the handshake.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Initial-values line read during the handshake.
    pub fn initial_values(&self) -> &str {
        &self.initial_values
    }

    /// Bytes buffered on the channel.
    pub fn bytes_available(&mut self) -> Result<usize> {
        self.stream.bytes_available()
    }

    // ── Order round-trip primitives ───────────────────────────

    pub fn write_order(&mut self, order: Order) -> Result<()> {
        debug!("send order: {order}");
        self.stream.write_i8(i64::from(order.code()))
    }

    /// Read one command code. Total: codes outside the vocabulary come back
    /// as [`Order::Unknown`] with the exact wire value.
    pub fn read_order(&mut self) -> Result<Order> {
        let order = Order::from_code(self.stream.read_i8()?);
        if let Order::Unknown(code) = order {
            warn!("device sent unrecognised order code {code}");
        }
        Ok(order)
    }

    /// Write an order followed by a 16-bit value. Raw forward-compatible
    /// codes enter through `Order::from(code)`.
    pub fn write_command_value(&mut self, order: Order, value: i64) -> Result<()> {
        self.write_order(order)?;
        debug!("send value: {value}");
        self.stream.write_i16(value)
    }

    // ── Parameter round-trip legs ─────────────────────────────

    pub fn write_i8(&mut self, value: i64) -> Result<()> {
        self.stream.write_i8(value)
    }

    pub fn write_i16(&mut self, value: i64) -> Result<()> {
        self.stream.write_i16(value)
    }

    pub fn write_i32(&mut self, value: i64) -> Result<()> {
        self.stream.write_i32(value)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.stream.read_i8()
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.stream.read_i16()
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.stream.read_i32()
    }

    // ── Bounded event wait ────────────────────────────────────

    /// Poll until at least `frame_len` bytes are buffered or `timeout`
    /// elapses. Returns whether the frame arrived; consumes nothing either
    /// way.
    pub fn wait_for_bytes(&mut self, frame_len: usize, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.stream.bytes_available()? >= frame_len {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(EVENT_POLL);
        }
    }

    /// Read one order/value/time event frame, waiting up to `timeout`.
    ///
    /// On expiry returns the sentinel `(Order::Timeout, 0, -1)` with any
    /// buffered partial bytes left unconsumed — a timeout means "no frame
    /// available", not "malformed frame".
    pub fn read_order_value_time(&mut self, timeout: Duration) -> Result<(Order, i16, i32)> {
        if !self.wait_for_bytes(ORDER_VALUE_TIME_LEN, timeout)? {
            return Ok((Order::Timeout, 0, -1));
        }
        let order = self.read_order()?;
        let value = self.stream.read_i16()?;
        let time = self.stream.read_i32()?;
        debug!("event frame: order={order} value={value} time={time}");
        Ok((order, value, time))
    }

    /// Close the underlying channel. Must not be called mid-exchange;
    /// sequencing that is the caller's responsibility.
    pub fn close(&mut self) -> Result<()> {
        self.stream.close()
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut T {
        self.stream.transport_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::VecDeque;

    struct MemTransport {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
    }

    impl MemTransport {
        fn with_rx(bytes: &[u8]) -> Self {
            Self {
                rx: bytes.iter().copied().collect(),
                tx: Vec::new(),
            }
        }
    }

    impl Transport for MemTransport {
        fn bytes_available(&mut self) -> Result<usize> {
            Ok(self.rx.len())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }

        fn write_all(&mut self, data: &[u8]) -> Result<()> {
            self.tx.extend_from_slice(data);
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    const HANDSHAKE: &[u8] = b"#1.0\r\ninit 0 0 0\r\n";

    fn engine_with(binary: &[u8]) -> ExchangeEngine<MemTransport> {
        let mut rx = HANDSHAKE.to_vec();
        rx.extend_from_slice(binary);
        ExchangeEngine::connect(MemTransport::with_rx(&rx)).unwrap()
    }

    #[test]
    fn handshake_reads_two_lines_before_binary() {
        let mut engine = engine_with(&[5]);
        assert_eq!(engine.version(), "#1.0");
        assert_eq!(engine.initial_values(), "init 0 0 0");
        // The binary stream starts exactly after the second line.
        assert_eq!(engine.read_order().unwrap(), Order::Rew);
    }

    #[test]
    fn write_command_value_emits_code_then_le_value() {
        let mut engine = engine_with(&[]);
        engine.write_command_value(Order::SetSize, 0x0102).unwrap();
        assert_eq!(engine.transport_mut().tx, vec![32, 0x02, 0x01]);
    }

    #[test]
    fn raw_codes_round_trip_through_unknown() {
        let mut engine = engine_with(&[55]);
        engine.write_command_value(Order::from(55), 1).unwrap();
        assert_eq!(engine.transport_mut().tx[0], 55);
        assert_eq!(engine.read_order().unwrap(), Order::Unknown(55));
    }

    #[test]
    fn ovt_timeout_returns_sentinel_and_consumes_nothing() {
        // Only 3 of the 7 frame bytes ever arrive.
        let mut engine = engine_with(&[1, 2, 3]);
        let (order, value, time) = engine
            .read_order_value_time(Duration::from_millis(100))
            .unwrap();
        assert_eq!((order, value, time), (Order::Timeout, 0, -1));
        assert_eq!(engine.bytes_available().unwrap(), 3);
    }

    #[test]
    fn ovt_reads_full_frame() {
        // DONE, value=7, time=1000.
        let mut frame = vec![92u8];
        frame.extend_from_slice(&7i16.to_le_bytes());
        frame.extend_from_slice(&1000i32.to_le_bytes());
        let mut engine = engine_with(&frame);
        let (order, value, time) = engine
            .read_order_value_time(Duration::from_millis(100))
            .unwrap();
        assert_eq!((order, value, time), (Order::Done, 7, 1000));
    }

    #[test]
    fn out_of_range_order_value_is_rejected_before_wire() {
        let mut engine = engine_with(&[]);
        let err = engine.write_command_value(Order::SetSize, 99_999).unwrap_err();
        assert!(matches!(err, Error::ValueOutOfRange { width: 16, .. }));
        // The order byte went out before the bad value was caught.
        assert_eq!(engine.transport_mut().tx, vec![32]);
    }
}
